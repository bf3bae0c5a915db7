use actix_web::{web, Scope};

pub mod api;
pub mod debug_handlers;
pub mod multipart;
pub mod register_handlers;

pub fn api() -> Scope {
    web::scope("/api").service(register_handlers::post_register)
}
