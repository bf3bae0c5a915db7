use actix_web::{
    http::{header::ContentType, StatusCode},
    HttpResponse, ResponseError,
};
use libregistration::domain::registration::logic::RegistrationLogicError;
use serde::Serialize;
use strum::Display;

/// Body of a 500 response. Internal details are logged, never returned.
#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
}

/// Body of a 400 response.
#[derive(Serialize)]
pub struct MessageResponse {
    message: String,
}

pub const INTERNAL_SERVER_ERROR: &str = "Internal server error";

#[derive(Debug, Display)]
pub enum ApiError {
    InvalidRequest(String),
    Other(String),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            ApiError::InvalidRequest(message) => serde_json::to_string(&MessageResponse {
                message: message.clone(),
            }),
            ApiError::Other(_) => serde_json::to_string(&ErrorResponse {
                error: INTERNAL_SERVER_ERROR.to_string(),
            }),
        };

        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .body(body.unwrap_or_else(|_| format!("{{\"error\":\"{}\"}}", INTERNAL_SERVER_ERROR)))
    }
}

impl From<RegistrationLogicError> for ApiError {
    fn from(value: RegistrationLogicError) -> Self {
        match value {
            RegistrationLogicError::ValidationError(message) => ApiError::InvalidRequest(message),
            err => {
                tracing::error!(error = %err, "Registration failed");
                ApiError::Other(err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use actix_web::body::to_bytes;
    use libregistration::domain::registration::repository::RepositoryError;

    use super::*;

    #[actix_web::test]
    async fn internal_errors_are_not_exposed() {
        let err = ApiError::from(RegistrationLogicError::RepositoryError(
            RepositoryError::Unavailable("connection refused".to_string()),
        ));
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = to_bytes(response.into_body())
            .await
            .expect("Should be able to read body");
        assert_eq!(body, r#"{"error":"Internal server error"}"#);
    }

    #[actix_web::test]
    async fn validation_errors_carry_their_message() {
        let err = ApiError::from(RegistrationLogicError::ValidationError(
            "Missing required fields".to_string(),
        ));
        let response = err.error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = to_bytes(response.into_body())
            .await
            .expect("Should be able to read body");
        assert_eq!(body, r#"{"message":"Missing required fields"}"#);
    }
}
