pub mod actions;
pub mod config;
pub mod error;
pub mod executor;
pub mod fsm;
pub mod server;

pub use error::{Error, Result};
