//! Reads a registration out of a `multipart/form-data` body.
use actix_multipart::{Field as Part, Multipart};
use futures::TryStreamExt;
use libregistration::domain::{
    core::fields::{Field, ImageUpload, MAX_IMAGE_BYTES},
    registration::RegistrationInput,
};

use super::api::ApiError;

/// Upper bound for a single text part.
pub const MAX_TEXT_BYTES: usize = 64 * 1024;

// Reads a part into memory. A part growing beyond `limit` bytes is drained
// and discarded.
async fn read_part(part: &mut Part, limit: usize) -> Result<Option<Vec<u8>>, ApiError> {
    let mut bytes = Vec::new();
    let mut overflowed = false;
    while let Some(chunk) = part
        .try_next()
        .await
        .map_err(|err| ApiError::Other(err.to_string()))?
    {
        if overflowed || bytes.len() + chunk.len() > limit {
            if !overflowed {
                overflowed = true;
                bytes = Vec::new();
            }
            continue;
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok((!overflowed).then_some(bytes))
}

/// Collects the registration fields of a submission.
///
/// Text parts are read as UTF-8 strings, invalid sequences are replaced and
/// oversized values dropped. The `image` key is only accepted when it's a
/// file part, a plain value under that key is ignored, as are unknown keys.
/// An oversized picture is flagged on the input and left to validation.
pub async fn read_registration(mut payload: Multipart) -> Result<RegistrationInput, ApiError> {
    let mut input = RegistrationInput::default();

    while let Some(mut part) = payload
        .try_next()
        .await
        .map_err(|err| ApiError::Other(err.to_string()))?
    {
        let disposition = part.content_disposition();
        let name = disposition.get_name().map(str::to_owned);
        let file_name = disposition.get_filename().map(str::to_owned);

        let field = match name.as_deref().and_then(Field::from_name) {
            Some(field) => field,
            None => {
                tracing::debug!(part = ?name, "Skipping unknown part");
                continue;
            }
        };

        if field == Field::Image {
            let Some(file_name) = file_name else {
                tracing::debug!("Skipping image part without a file");
                continue;
            };
            let content_type = part
                .content_type()
                .map(|mime| mime.essence_str().to_string())
                .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());
            match read_part(&mut part, MAX_IMAGE_BYTES).await? {
                Some(bytes) => {
                    input.image = Some(ImageUpload {
                        file_name,
                        content_type,
                        bytes,
                    });
                    input.image_rejected = false;
                }
                None => {
                    tracing::debug!(%file_name, "Image exceeds the size ceiling");
                    input.image = None;
                    input.image_rejected = true;
                }
            }
            continue;
        }

        let Some(bytes) = read_part(&mut part, MAX_TEXT_BYTES).await? else {
            tracing::debug!(%field, "Dropping oversized value");
            continue;
        };
        let value = String::from_utf8_lossy(&bytes).into_owned();

        let slot = match field {
            Field::FirstName => &mut input.first_name,
            Field::LastName => &mut input.last_name,
            Field::Email => &mut input.email,
            Field::Password => &mut input.password,
            Field::Gender => &mut input.gender,
            Field::Image => continue,
        };
        *slot = Some(value);
    }

    Ok(input)
}
