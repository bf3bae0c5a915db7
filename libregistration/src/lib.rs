//! Domain logic for the registration service: form fields, the stored
//! registration record, password hashing and persistence.
pub mod domain;
pub mod foundation;
pub mod hashing;
