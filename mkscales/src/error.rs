//! High-level error types

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Core protocol error: {0}")]
    Core(#[from] mkscales_core::Error),
    
    #[error("Transport error: {0}")]
    Transport(#[from] mkscales_transport::Error),
    
    #[error("Type error: {0}")]
    Types(#[from] mkscales_types::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}
