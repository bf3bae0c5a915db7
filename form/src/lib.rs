//! Client side of the registration form: field and file validation, preview
//! handles and the multipart submission to `POST /api/register`.
pub mod browser;
pub mod client;
pub mod controller;
pub mod notify;

pub use controller::FormController;
