use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use async_trait::async_trait;

use crate::{
    domain::registration::{NewRegistration, Registration},
    foundation::id::Id,
};

use super::{RegistrationRepository, RepositoryError};

/// In memory storage.
pub struct Memory {
    registrations: Arc<RwLock<HashMap<Id, Registration>>>,
}

impl Memory {
    pub fn new() -> Self {
        let registrations = Arc::new(RwLock::new(HashMap::<Id, Registration>::new()));
        Self { registrations }
    }

    pub fn len(&self) -> Result<usize, RepositoryError> {
        Ok(self.registrations.read()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.len()? == 0)
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RegistrationRepository for Memory {
    async fn create(&self, registration: &NewRegistration) -> Result<Registration, RepositoryError> {
        let mut registrations = self.registrations.write()?;

        let mut id = Id::new();
        while registrations.contains_key(&id) {
            id = Id::new();
        }

        let registration = registration.clone().into_registration(id.clone());
        registrations.insert(id, registration.clone());
        Ok(registration)
    }

    async fn read_by_id(&self, id: &Id) -> Result<Registration, RepositoryError> {
        match self.registrations.read()?.get(id) {
            None => Err(RepositoryError::NotFound),
            Some(v) => Ok(v.clone()),
        }
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        let _registrations = self.registrations.read()?;
        Ok(())
    }
}
