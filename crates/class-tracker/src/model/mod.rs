/// Typed configuration and course records
mod config;
mod error;
mod types;

pub use config::*;
pub use error::ValidationError;
pub use types::*;
