use std::io::{self, IsTerminal as _, Write as _};

use anyhow::{Context, Result, anyhow};
use inquire::Text;
use yansi::Paint as _;

/// Prompts for the setup flow: `inquire` on a terminal, plain line input
/// otherwise (pipes, tests). Empty input keeps the default.
#[derive(Clone, Debug)]
pub struct Wizard {
  is_tty: bool,
}

impl Default for Wizard {
  fn default() -> Self {
    Self::new()
  }
}

impl Wizard {
  #[must_use]
  pub fn new() -> Self {
    Self {
      is_tty: io::stdin().is_terminal() && io::stdout().is_terminal(),
    }
  }

  /// Prompt for textual input with a default value and trimming applied.
  pub fn text(&self, prompt: &str, default: &str) -> Result<String> {
    if self.is_tty {
      return Text::new(prompt)
        .with_default(default)
        .prompt()
        .map(|ans| ans.trim().to_string())
        .map_err(|err| anyhow!(err));
    }
    println!("{prompt} [{default}]");
    let input = read_answer()?;
    if input.is_empty() {
      return Ok(default.to_string());
    }
    Ok(input)
  }

  /// Prompt for optional input; empty means none.
  pub fn optional(&self, prompt: &str) -> Result<Option<String>> {
    let ans = self.text(prompt, "")?;
    Ok(Some(ans).filter(|a| !a.is_empty()))
  }

  /// Prompt for a command and split it into argv.
  pub fn command(&self, prompt: &str, default_argv: &[String]) -> Result<Vec<String>> {
    let default_str = shell_words::join(default_argv);
    let input = self.text(prompt, &default_str)?;
    shell_words::split(&input).context("invalid shell command")
  }
}

fn read_answer() -> Result<String> {
  print!("{}", "-> ".cyan());
  io::stdout().flush().ok();
  let mut input = String::new();
  io::stdin()
    .read_line(&mut input)
    .context("failed to read from stdin")?;
  Ok(input.trim().to_string())
}
