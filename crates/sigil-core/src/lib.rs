pub mod config;
pub mod error;

pub use config::{load_config, Policy, SigilConfig};
pub use error::{SigilError, SigilResult};
