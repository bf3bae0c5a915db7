use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::{error::Error, fmt::Display};

use crate::{foundation::id::Id, hashing::HashError};

use super::{repository::RepositoryError, RegistrationInput};

/// Message returned when first name, last name or email are missing.
pub const MISSING_REQUIRED_FIELDS: &str = "Missing required fields";

/// Message returned when an uploaded picture fails the image policy.
pub const INVALID_IMAGE: &str = "Invalid image";

#[derive(Debug, PartialEq)]
pub enum RegistrationLogicError {
    ValidationError(String),
    HashError(HashError),
    RepositoryError(RepositoryError),
}

impl From<HashError> for RegistrationLogicError {
    fn from(value: HashError) -> Self {
        RegistrationLogicError::HashError(value)
    }
}

impl From<RepositoryError> for RegistrationLogicError {
    fn from(value: RepositoryError) -> Self {
        RegistrationLogicError::RepositoryError(value)
    }
}

impl Display for RegistrationLogicError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RegistrationLogicError::ValidationError(err) => write!(f, "{}", err),
            RegistrationLogicError::HashError(err) => write!(f, "{}", err),
            RegistrationLogicError::RepositoryError(err) => write!(f, "{}", err),
        }
    }
}

impl Error for RegistrationLogicError {}

/// Business logic that's to be implemented by every registration provider.
#[async_trait]
pub trait RegistrationLogic {
    /// Validate, hash and persist a submission. Returns the identifier
    /// assigned by the repository.
    async fn register(
        &self,
        input: RegistrationInput,
        now: DateTime<Utc>,
    ) -> Result<Id, RegistrationLogicError>;

    /// Reports whether registrations can currently be accepted.
    async fn ready(&self) -> Result<(), RegistrationLogicError>;
}
