pub mod application;
pub mod configuration;
pub mod rest;
pub mod store;
pub mod telemetry;

pub use store::Store;
