use std::{error::Error, fmt::Display, sync::PoisonError};

use async_trait::async_trait;

use crate::foundation::id::Id;

use super::{NewRegistration, Registration};

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

/// Repository related errors.
#[derive(Debug, PartialEq)]
pub enum RepositoryError {
    NotFound,
    /// No connection to the backing store could be obtained.
    Unavailable(String),
    Other(String),
}

impl Display for RepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RepositoryError::NotFound => write!(f, "not found"),
            RepositoryError::Unavailable(err) => write!(f, "store unavailable: {}", err),
            RepositoryError::Other(err) => write!(f, "{}", err),
        }
    }
}

impl Error for RepositoryError {}

impl From<&str> for RepositoryError {
    fn from(value: &str) -> Self {
        RepositoryError::Other(value.to_owned())
    }
}

impl From<String> for RepositoryError {
    fn from(value: String) -> Self {
        RepositoryError::Other(value)
    }
}

impl<T> From<PoisonError<T>> for RepositoryError {
    fn from(value: PoisonError<T>) -> Self {
        RepositoryError::Other(value.to_string())
    }
}

/// Trait to be implemented by registration repositories.
#[async_trait]
pub trait RegistrationRepository {
    /// Insert a registration, the repository assigns its identifier.
    async fn create(&self, registration: &NewRegistration) -> Result<Registration, RepositoryError>;

    /// Read a single registration by id.
    async fn read_by_id(&self, id: &Id) -> Result<Registration, RepositoryError>;

    /// Checks that the backing store can serve requests.
    async fn ping(&self) -> Result<(), RepositoryError>;
}
