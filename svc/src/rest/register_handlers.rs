use actix_multipart::Multipart;
use actix_web::{
    post,
    web::{Data, Json},
};
use chrono::Utc;
use libregistration::foundation::id::Id;
use serde::Serialize;

use crate::{
    rest::{api::ApiError, multipart::read_registration},
    store::Store,
};

pub const INSERTED: &str = "data is inserted successfully";

#[derive(Serialize)]
pub struct RegisterResponse {
    success: bool,
    id: Id,
    message: String,
}

/// POST /api/register
///
/// Responds with 200 and the generated id, 400 when required fields are
/// missing, 500 on any other failure.
#[post("/register")]
#[tracing::instrument(name = "Registering", skip(store, payload))]
pub async fn post_register(
    store: Data<Store>,
    payload: Multipart,
) -> Result<Json<RegisterResponse>, ApiError> {
    tracing::debug!("Parsing submission");
    let input = read_registration(payload).await.map_err(|err| {
        if let ApiError::Other(cause) = &err {
            tracing::error!(error = %cause, "Couldn't read submission");
        }
        err
    })?;

    let id = store.registration_logic.register(input, Utc::now()).await?;

    Ok(Json(RegisterResponse {
        success: true,
        id,
        message: INSERTED.to_string(),
    }))
}
