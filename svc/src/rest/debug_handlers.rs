use std::env;

use actix_web::{
    get,
    http::StatusCode,
    web::{self, Data, Json},
    HttpResponse, Scope,
};
use serde::Serialize;

use crate::store::Store;

#[derive(Serialize)]
pub struct ReadinessResponse {
    status: &'static str,
}

/// 200 while the registration store answers, 503 otherwise.
#[get("/readiness")]
pub async fn readiness(store: Data<Store>) -> HttpResponse {
    match store.registration_logic.ready().await {
        Ok(()) => HttpResponse::Ok().json(ReadinessResponse { status: "ok" }),
        Err(err) => {
            tracing::warn!(error = %err, "Registration store isn't ready");
            HttpResponse::build(StatusCode::SERVICE_UNAVAILABLE)
                .json(ReadinessResponse { status: "unavailable" })
        }
    }
}

#[derive(Serialize)]
pub struct LivenessResponse {
    status: String,
    version: String,
    hostname: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pod_ip: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    node: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<String>,
}

#[get("/liveness")]
pub async fn liveness() -> Json<LivenessResponse> {
    Json(LivenessResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        hostname: sys_info::hostname().ok(),
        name: env::var("KUBERNETES_NAME").ok(),
        pod_ip: env::var("KUBERNETES_POD_IP").ok(),
        node: env::var("KUBERNETES_NODE_NAME").ok(),
        namespace: env::var("KUBERNETES_NAMESPACE").ok(),
    })
}

pub fn api() -> Scope {
    web::scope("/debug").service(readiness).service(liveness)
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use actix_web::{test, App};
    use async_trait::async_trait;
    use libregistration::{
        domain::registration::{
            repository::{memory::Memory, RegistrationRepository, RepositoryError},
            service::RegistrationService,
            NewRegistration, Registration,
        },
        foundation::id::Id,
        hashing::Bcrypt,
    };

    use super::*;

    struct Offline;

    #[async_trait]
    impl RegistrationRepository for Offline {
        async fn create(&self, _: &NewRegistration) -> Result<Registration, RepositoryError> {
            Err(RepositoryError::Unavailable("connection refused".to_string()))
        }

        async fn read_by_id(&self, _: &Id) -> Result<Registration, RepositoryError> {
            Err(RepositoryError::Unavailable("connection refused".to_string()))
        }

        async fn ping(&self) -> Result<(), RepositoryError> {
            Err(RepositoryError::Unavailable("connection refused".to_string()))
        }
    }

    fn store(repo: Arc<dyn RegistrationRepository + Send + Sync>) -> Data<Store> {
        Data::new(Store::new(Arc::new(RegistrationService::new(
            repo,
            Arc::new(Bcrypt::new(4)),
        ))))
    }

    #[actix_web::test]
    async fn it_reports_readiness_and_liveness() {
        let app = test::init_service(
            App::new()
                .app_data(store(Arc::new(Memory::new())))
                .service(api()),
        )
        .await;

        let request = test::TestRequest::get().uri("/debug/readiness").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["status"], "ok");

        let request = test::TestRequest::get().uri("/debug/liveness").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, request).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[actix_web::test]
    async fn it_is_not_ready_without_a_database() {
        let app = test::init_service(
            App::new()
                .app_data(store(Arc::new(Offline)))
                .service(api()),
        )
        .await;

        let request = test::TestRequest::get().uri("/debug/readiness").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let body: serde_json::Value = test::read_body_json(response).await;
        assert_eq!(body["status"], "unavailable");

        let request = test::TestRequest::get().uri("/debug/liveness").to_request();
        let response = test::call_service(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
