use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("Unsupported host OS: {0}")]
    UnsupportedOs(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
