//! Error types for the command-line tool

use thiserror::Error;

/// Errors raised by the CLI itself
#[derive(Error, Debug)]
pub enum CliError {
    /// Reading or writing an image file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The NVM engine reported a failure
    #[error("NVM error: {0}")]
    Nvm(#[from] nicnvm_core::Error),

    /// The block table could not be loaded
    #[error("Block table error: {0}")]
    Table(#[from] nicnvm_core::protected::TableError),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}
