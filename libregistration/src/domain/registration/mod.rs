//! Provides functionality for registering users through the registration form.
use chrono::{DateTime, Utc};

use crate::foundation::id::Id;

use super::core::fields::ImageUpload;

pub mod logic;
pub mod repository;
pub mod service;

/// The fields of a single submission as received by the endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationInput {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub gender: Option<String>,
    pub image: Option<ImageUpload>,
    /// Set when an image part was sent but couldn't be kept, e.g. it
    /// exceeded the size ceiling while streaming.
    pub image_rejected: bool,
}

/// A validated registration with its password hashed, ready to be inserted.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRegistration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub gender: Option<String>,
    pub image: Option<ImageUpload>,
    pub date_created: DateTime<Utc>,
}

impl NewRegistration {
    /// Attaches the identifier assigned by a repository.
    pub fn into_registration(self, id: Id) -> Registration {
        Registration {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password_hash: self.password_hash,
            gender: self.gender,
            image: self.image,
            date_created: self.date_created,
        }
    }
}

/// A persisted registration. Registrations are never updated or deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub id: Id,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub gender: Option<String>,
    pub image: Option<ImageUpload>,
    pub date_created: DateTime<Utc>,
}
