use thiserror::Error;

/// Failures registering or looking up a scheduling policy.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("elevator `{0}` is already registered")]
    AlreadyRegistered(String),

    #[error("elevator `{0}` is not registered")]
    NotRegistered(String),

    #[error("invalid elevator name `{name}`: {reason}")]
    InvalidName { name: String, reason: &'static str },
}

pub type Result<T> = std::result::Result<T, RegistryError>;
