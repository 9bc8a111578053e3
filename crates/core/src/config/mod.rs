pub mod load;
pub mod paths;
pub mod types;
pub mod write;

pub use load::LOG_LEVEL_ENV;
pub use paths::*;
pub use types::*;
