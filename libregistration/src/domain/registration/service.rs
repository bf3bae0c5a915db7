use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    domain::core::fields::{Email, Gender, MIN_PASSWORD_LENGTH},
    foundation::id::Id,
    hashing::{HashError, PasswordHashing},
};

use super::{
    logic::{RegistrationLogic, RegistrationLogicError, INVALID_IMAGE, MISSING_REQUIRED_FIELDS},
    repository::RegistrationRepository,
    NewRegistration, RegistrationInput,
};

pub struct RegistrationService {
    repo: Arc<dyn RegistrationRepository + Send + Sync>,
    hasher: Arc<dyn PasswordHashing + Send + Sync>,
    strict: bool,
}

impl RegistrationService {
    pub fn new(
        repo: Arc<dyn RegistrationRepository + Send + Sync>,
        hasher: Arc<dyn PasswordHashing + Send + Sync>,
    ) -> Self {
        Self {
            repo,
            hasher,
            strict: false,
        }
    }

    /// Also require a password, a gender, a picture and a well-formed email.
    pub fn with_strict_validation(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }
}

impl RegistrationService {
    // Runs on the blocking pool.
    async fn hash(&self, password: String) -> Result<String, HashError> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password)).await?
    }
}

fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn validation_error(message: &str) -> RegistrationLogicError {
    RegistrationLogicError::ValidationError(message.to_string())
}

fn validate(input: &RegistrationInput, strict: bool) -> Result<(), RegistrationLogicError> {
    if present(&input.first_name).is_none()
        || present(&input.last_name).is_none()
        || present(&input.email).is_none()
    {
        return Err(validation_error(MISSING_REQUIRED_FIELDS));
    }

    if strict {
        let password = present(&input.password);
        let gender = present(&input.gender);
        let image_sent = input.image.is_some() || input.image_rejected;
        if password.is_none() || gender.is_none() || !image_sent {
            return Err(validation_error(MISSING_REQUIRED_FIELDS));
        }
        if password.is_some_and(|p| p.chars().count() < MIN_PASSWORD_LENGTH) {
            return Err(validation_error("Password too short"));
        }
        if gender.is_some_and(|g| g.parse::<Gender>().is_err()) {
            return Err(validation_error("invalid gender"));
        }
        if let Some(email) = &input.email {
            if Email::parse(email.clone()).is_err() {
                return Err(validation_error("Invalid email"));
            }
        }
    }

    if input.image_rejected || input.image.as_ref().is_some_and(|i| i.check().is_err()) {
        return Err(validation_error(INVALID_IMAGE));
    }

    Ok(())
}

#[async_trait]
impl RegistrationLogic for RegistrationService {
    async fn register(
        &self,
        input: RegistrationInput,
        now: DateTime<Utc>,
    ) -> Result<Id, RegistrationLogicError> {
        tracing::debug!("Validating registration");
        if let Err(err) = validate(&input, self.strict) {
            tracing::info!(error = %err, "Registration rejected");
            return Err(err);
        }

        let password_hash = match present(&input.password) {
            Some(password) => Some(self.hash(password.to_string()).await?),
            None => None,
        };

        let registration = NewRegistration {
            first_name: input.first_name.unwrap_or_default(),
            last_name: input.last_name.unwrap_or_default(),
            email: input.email.unwrap_or_default(),
            password_hash,
            gender: input.gender.filter(|g| !g.is_empty()),
            image: input.image,
            date_created: now,
        };

        tracing::debug!("Persisting registration");
        let registration = self.repo.create(&registration).await?;
        tracing::info!(id = %registration.id, "Registration persisted");
        Ok(registration.id)
    }

    async fn ready(&self) -> Result<(), RegistrationLogicError> {
        Ok(self.repo.ping().await?)
    }
}
