//! Submission of the registration form to the registration endpoint.
use std::{error::Error, fmt::Display};

use async_trait::async_trait;
use libregistration::domain::core::fields::{Field, ImageUpload};
use reqwest::multipart::{Form, Part};
use serde::Deserialize;

/// Message used when a rejected submission carries no message.
pub const REGISTRATION_FAILED: &str = "Registration failed";

/// The parts of one submission: every non-empty text field and the picture.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RegistrationPayload {
    pub fields: Vec<(Field, String)>,
    pub image: Option<ImageUpload>,
}

impl RegistrationPayload {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.fields
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, value)| value.as_str())
    }
}

/// Body of a successful response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RegistrationReceipt {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmitError {
    /// The endpoint answered with a non-success status.
    Rejected(String),
    /// The request couldn't be sent or the response couldn't be read.
    Transport(String),
}

impl Display for SubmitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubmitError::Rejected(message) => write!(f, "{}", message),
            SubmitError::Transport(message) => write!(f, "{}", message),
        }
    }
}

impl Error for SubmitError {}

impl From<reqwest::Error> for SubmitError {
    fn from(value: reqwest::Error) -> Self {
        SubmitError::Transport(value.to_string())
    }
}

#[async_trait]
pub trait RegistrationClient {
    /// Performs a single submission. No retries.
    async fn register(
        &self,
        payload: RegistrationPayload,
    ) -> Result<RegistrationReceipt, SubmitError>;
}

/// Extracts the `message` of a rejection body.
pub fn rejection_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| {
            json.get("message")
                .and_then(|message| message.as_str())
                .filter(|message| !message.is_empty())
                .map(str::to_owned)
        })
        .unwrap_or_else(|| REGISTRATION_FAILED.to_string())
}

pub struct HttpRegistrationClient {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpRegistrationClient {
    pub fn new(base_url: &str) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            endpoint: format!("{}/api/register", base_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn form(payload: RegistrationPayload) -> Result<Form, SubmitError> {
        let mut form = Form::new();
        for (field, value) in payload.fields {
            form = form.text(field.as_str(), value);
        }
        if let Some(image) = payload.image {
            let part = Part::bytes(image.bytes)
                .file_name(image.file_name)
                .mime_str(&image.content_type)?;
            form = form.part(Field::Image.as_str(), part);
        }
        Ok(form)
    }
}

#[async_trait]
impl RegistrationClient for HttpRegistrationClient {
    #[tracing::instrument(name = "Submitting registration", skip(self, payload), fields(endpoint = %self.endpoint))]
    async fn register(
        &self,
        payload: RegistrationPayload,
    ) -> Result<RegistrationReceipt, SubmitError> {
        let form = Self::form(payload)?;
        let response = self.client.post(&self.endpoint).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!(%status, "Registration rejected");
            return Err(SubmitError::Rejected(rejection_message(&body)));
        }

        Ok(response.json::<RegistrationReceipt>().await?)
    }
}
