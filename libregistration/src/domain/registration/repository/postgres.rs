//! Registrations stored as JSONB documents in the `register` table.
use std::str::FromStr;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine};
use chrono::{DateTime, Utc};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use serde::{Deserialize, Serialize};
use tokio_postgres::{types::Json, NoTls};
use uuid::Uuid;

use crate::{
    domain::{
        core::fields::ImageUpload,
        registration::{NewRegistration, Registration},
    },
    foundation::id::Id,
};

use super::{RegistrationRepository, RepositoryError};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS register (
    id UUID PRIMARY KEY,
    document JSONB NOT NULL,
    date_created TIMESTAMPTZ NOT NULL
)";

const INSERT: &str = "INSERT INTO register (id, document, date_created) VALUES ($1, $2, $3)";

const SELECT_BY_ID: &str = "SELECT document, date_created FROM register WHERE id = $1";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImageDocument {
    file_name: String,
    content_type: String,
    data: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    first_name: String,
    last_name: String,
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<ImageDocument>,
}

impl From<&NewRegistration> for Document {
    fn from(value: &NewRegistration) -> Self {
        Self {
            first_name: value.first_name.clone(),
            last_name: value.last_name.clone(),
            email: value.email.clone(),
            password: value.password_hash.clone(),
            gender: value.gender.clone(),
            image: value.image.as_ref().map(|image| ImageDocument {
                file_name: image.file_name.clone(),
                content_type: image.content_type.clone(),
                data: general_purpose::STANDARD.encode(&image.bytes),
            }),
        }
    }
}

impl Document {
    fn into_registration(
        self,
        id: Id,
        date_created: DateTime<Utc>,
    ) -> Result<Registration, RepositoryError> {
        let image = match self.image {
            None => None,
            Some(image) => Some(ImageUpload {
                file_name: image.file_name,
                content_type: image.content_type,
                bytes: general_purpose::STANDARD
                    .decode(image.data)
                    .map_err(|err| RepositoryError::Other(err.to_string()))?,
            }),
        };

        Ok(Registration {
            id,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            password_hash: self.password,
            gender: self.gender,
            image,
            date_created,
        })
    }
}

/// Postgres storage backed by a connection pool.
///
/// Every call checks a connection out of the pool, the connection goes back
/// to the pool when it is dropped.
pub struct Postgres {
    pool: Pool,
}

impl Postgres {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    /// Builds a pool for the given connection string. No connection is opened
    /// until the first checkout.
    pub fn connect(uri: &str, max_size: usize) -> Result<Self, RepositoryError> {
        let config = tokio_postgres::Config::from_str(uri)
            .map_err(|err| RepositoryError::Other(err.to_string()))?;
        let manager = Manager::from_config(
            config,
            NoTls,
            ManagerConfig {
                recycling_method: RecyclingMethod::Fast,
            },
        );
        let pool = Pool::builder(manager)
            .max_size(max_size)
            .build()
            .map_err(|err| RepositoryError::Other(err.to_string()))?;
        Ok(Self::new(pool))
    }

    /// Creates the `register` table if it doesn't exist yet.
    pub async fn migrate(&self) -> Result<(), RepositoryError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
        client
            .batch_execute(SCHEMA)
            .await
            .map_err(|err| RepositoryError::Other(err.to_string()))
    }
}

#[async_trait]
impl RegistrationRepository for Postgres {
    #[tracing::instrument(name = "Inserting registration", skip(self, registration))]
    async fn create(&self, registration: &NewRegistration) -> Result<Registration, RepositoryError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;

        let id = Uuid::new_v4();
        let document = Document::from(registration);
        client
            .execute(INSERT, &[&id, &Json(&document), &registration.date_created])
            .await
            .map_err(|err| RepositoryError::Other(err.to_string()))?;

        Ok(registration.clone().into_registration(Id::from(id)))
    }

    async fn read_by_id(&self, id: &Id) -> Result<Registration, RepositoryError> {
        let uuid = match Uuid::parse_str(id.as_ref()) {
            Ok(uuid) => uuid,
            Err(_) => return Err(RepositoryError::NotFound),
        };

        let client = self
            .pool
            .get()
            .await
            .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
        let row = client
            .query_opt(SELECT_BY_ID, &[&uuid])
            .await
            .map_err(|err| RepositoryError::Other(err.to_string()))?
            .ok_or(RepositoryError::NotFound)?;

        let Json(document) = row
            .try_get::<_, Json<Document>>(0)
            .map_err(|err| RepositoryError::Other(err.to_string()))?;
        let date_created = row
            .try_get::<_, DateTime<Utc>>(1)
            .map_err(|err| RepositoryError::Other(err.to_string()))?;

        document.into_registration(id.clone(), date_created)
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        let client = self
            .pool
            .get()
            .await
            .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn documents_carry_the_hash_and_an_encoded_image() {
        let registration = NewRegistration {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
            password_hash: Some("$2b$04$hash".to_string()),
            gender: Some("female".to_string()),
            image: Some(ImageUpload {
                file_name: "ada.jpg".to_string(),
                content_type: "image/jpeg".to_string(),
                bytes: vec![0xff, 0xd8, 0xff],
            }),
            date_created: Utc::now(),
        };

        let value = serde_json::to_value(Document::from(&registration))
            .expect("Should be able to serialize document");
        assert_eq!(value["firstName"], "Ada");
        assert_eq!(value["password"], "$2b$04$hash");
        assert_eq!(value["image"]["data"], "/9j/");

        let document: Document =
            serde_json::from_value(value).expect("Should be able to deserialize document");
        let restored = document
            .into_registration(Id::from("1234"), registration.date_created)
            .expect("Should be able to restore registration");
        assert_eq!(restored, registration.into_registration(Id::from("1234")));
    }

    #[test]
    fn it_rejects_malformed_connection_strings() {
        assert!(Postgres::connect("postgres://user@localhost:notaport/db", 4).is_err());
    }
}
