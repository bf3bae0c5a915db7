use libregistration::domain::registration::logic::RegistrationLogic;
use std::sync::Arc;

#[derive(Clone)]
pub struct Store {
    pub registration_logic: Arc<dyn RegistrationLogic + Send + Sync>,
}

impl Store {
    pub fn new(registration_logic: Arc<dyn RegistrationLogic + Send + Sync>) -> Self {
        Self { registration_logic }
    }
}
