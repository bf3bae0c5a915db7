//! One-way password hashing.
use std::{error::Error, fmt::Display};

use argon2::{
    password_hash::{self, SaltString},
    Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version,
};
use bcrypt::BcryptError;

#[derive(Debug, PartialEq)]
pub enum HashError {
    BcryptError(String),
    ArgonError(String),
    /// The hashing task panicked or was cancelled.
    TaskError(String),
}

impl From<BcryptError> for HashError {
    fn from(value: BcryptError) -> Self {
        HashError::BcryptError(value.to_string())
    }
}

impl From<password_hash::Error> for HashError {
    fn from(value: password_hash::Error) -> Self {
        HashError::ArgonError(value.to_string())
    }
}

impl From<argon2::Error> for HashError {
    fn from(value: argon2::Error) -> Self {
        HashError::ArgonError(value.to_string())
    }
}

impl From<tokio::task::JoinError> for HashError {
    fn from(value: tokio::task::JoinError) -> Self {
        HashError::TaskError(value.to_string())
    }
}

impl Display for HashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HashError::BcryptError(err) => write!(f, "{}", err),
            HashError::ArgonError(err) => write!(f, "{}", err),
            HashError::TaskError(err) => write!(f, "{}", err),
        }
    }
}

impl Error for HashError {}

/// Trait to be implemented by password hashers.
pub trait PasswordHashing {
    /// Returns a salted one-way hash of the plaintext.
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;

    /// Checks the plaintext against a hash produced by [`PasswordHashing::hash`].
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError>;
}

/// Bcrypt with a configurable cost factor.
pub struct Bcrypt {
    cost: u32,
}

impl Bcrypt {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl Default for Bcrypt {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

impl PasswordHashing for Bcrypt {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
        Ok(bcrypt::verify(plaintext, hash)?)
    }
}

/// Argon2id, the parameters default to 15000 KiB of memory, two iterations
/// and a single lane.
pub struct Argon2id {
    memory_kib: u32,
    iterations: u32,
    parallelism: u32,
}

impl Argon2id {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Self {
        Self {
            memory_kib,
            iterations,
            parallelism,
        }
    }
}

impl Default for Argon2id {
    fn default() -> Self {
        Self::new(15000, 2, 1)
    }
}

impl PasswordHashing for Argon2id {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = SaltString::generate(&mut rand::thread_rng());

        let password_hash = Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            Params::new(self.memory_kib, self.iterations, self.parallelism, None)?,
        )
        .hash_password(plaintext.as_bytes(), &salt)?
        .to_string();

        Ok(password_hash)
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
        let expected_password_hash = PasswordHash::new(hash)?;

        // The parameters are read from the PHC string.
        match Argon2::default().verify_password(plaintext.as_bytes(), &expected_password_hash) {
            Ok(_) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }
}
