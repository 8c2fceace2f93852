//! CLI command implementations

pub mod compile;
pub mod config;
pub mod serve;

pub use compile::execute as compile;
pub use config::execute as config;
pub use serve::execute as serve;
