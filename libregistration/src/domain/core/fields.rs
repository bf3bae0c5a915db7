//! Form fields shared by the registration form and the registration endpoint.
use std::{error::Error, fmt::Display, str::FromStr};

use validator::validate_email;

use crate::validated_field_with_ref_type;

validated_field_with_ref_type! {Email, String, str, validate_email, "is not a valid email"}

/// MIME types accepted for the profile picture.
pub const ALLOWED_IMAGE_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/jpg"];

/// Upper bound for the profile picture, in megabytes.
pub const MAX_IMAGE_MEGABYTES: usize = 2;

/// Upper bound for the profile picture, in bytes.
pub const MAX_IMAGE_BYTES: usize = MAX_IMAGE_MEGABYTES * 1024 * 1024;

/// Minimum number of characters of a password.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// The keys of the registration form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FirstName,
    LastName,
    Email,
    Password,
    Gender,
    Image,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::FirstName,
        Field::LastName,
        Field::Email,
        Field::Password,
        Field::Gender,
        Field::Image,
    ];

    /// Name of the field as used in the multipart form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::FirstName => "firstName",
            Field::LastName => "lastName",
            Field::Email => "email",
            Field::Password => "password",
            Field::Gender => "gender",
            Field::Image => "image",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

impl Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
        }
    }
}

impl Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            other => Err(format!("{} is not a supported gender", other)),
        }
    }
}

/// A file part of a registration form.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn check(&self) -> Result<(), ImageRejection> {
        check_image(&self.content_type, self.bytes.len())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRejection {
    InvalidType,
    TooLarge,
}

impl Display for ImageRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageRejection::InvalidType => write!(f, "invalid image type"),
            ImageRejection::TooLarge => {
                write!(f, "Image must be smaller than {}MB", MAX_IMAGE_MEGABYTES)
            }
        }
    }
}

impl Error for ImageRejection {}

/// Checks a picture's MIME type against the allow-list and its size against
/// [`MAX_IMAGE_BYTES`].
pub fn check_image(content_type: &str, size: usize) -> Result<(), ImageRejection> {
    if !ALLOWED_IMAGE_TYPES.contains(&content_type) {
        return Err(ImageRejection::InvalidType);
    }
    if size > MAX_IMAGE_BYTES {
        return Err(ImageRejection::TooLarge);
    }
    Ok(())
}
