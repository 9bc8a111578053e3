pub mod connect;
pub mod devd;
pub mod networks;
pub mod setup;
pub mod wallet;
