pub mod config;
pub mod error;
pub mod types;

pub use config::VoqitConfig;
pub use error::{Result, VoqitError};
pub use types::*;
