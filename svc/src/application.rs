use actix_cors::Cors;
use actix_web::{dev::Server, http::header, web::Data, App, HttpServer};
use futures::future;
use libregistration::domain::registration::{
    repository::{memory::Memory, postgres::Postgres, RegistrationRepository, RepositoryError},
    service::RegistrationService,
};
use secrecy::ExposeSecret;
use std::{fmt::Display, net::TcpListener, sync::Arc};
use tracing_actix_web::TracingLogger;

use crate::{
    configuration::{Backend, Configuration},
    rest,
    store::Store,
};

pub struct Application {
    application_port: u16,
    debug_port: u16,
    application_server: Server,
    debug_server: Server,
}

#[derive(Debug)]
pub enum ApplicationError {
    IoError(std::io::Error),
    ConfigError(config::ConfigError),
    RepositoryError(RepositoryError),
    TelemetryError(String),
}

impl From<std::io::Error> for ApplicationError {
    fn from(value: std::io::Error) -> Self {
        ApplicationError::IoError(value)
    }
}

impl From<config::ConfigError> for ApplicationError {
    fn from(value: config::ConfigError) -> Self {
        ApplicationError::ConfigError(value)
    }
}

impl From<RepositoryError> for ApplicationError {
    fn from(value: RepositoryError) -> Self {
        ApplicationError::RepositoryError(value)
    }
}

impl Display for ApplicationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApplicationError::IoError(err) => write!(f, "{}", err),
            ApplicationError::ConfigError(err) => write!(f, "{}", err),
            ApplicationError::RepositoryError(err) => write!(f, "{}", err),
            ApplicationError::TelemetryError(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ApplicationError {}

impl Application {
    pub async fn build(configuration: Configuration) -> Result<Self, ApplicationError> {
        let store = Data::new(prepare_store(&configuration).await?);

        let application_address =
            format_address(&configuration.server.host, configuration.server.api_port);
        let application_listener = TcpListener::bind(application_address)?;
        let application_port = application_listener.local_addr()?.port();
        let application_server = run_application_server(application_listener, store.clone())?;

        let debug_address =
            format_address(&configuration.server.host, configuration.server.debug_port);
        let debug_listener = TcpListener::bind(debug_address)?;
        let debug_port = debug_listener.local_addr()?.port();
        let debug_server = run_debug_server(debug_listener, store)?;

        tracing::info!(application_port, debug_port, "Listening");

        Ok(Self {
            application_port,
            debug_port,
            application_server,
            debug_server,
        })
    }

    pub fn application_port(&self) -> u16 {
        self.application_port
    }

    pub fn debug_port(&self) -> u16 {
        self.debug_port
    }

    pub async fn serve(self) -> Result<(), ApplicationError> {
        future::try_join(self.application_server, self.debug_server).await?;
        Ok(())
    }
}

fn format_address(host: &str, port: u16) -> String {
    format!("{}:{}", host, port)
}

fn run_application_server(
    listener: TcpListener,
    store: Data<Store>,
) -> Result<Server, ApplicationError> {
    let server = HttpServer::new(move || {
        let cors = Cors::default()
            .send_wildcard()
            .allowed_methods(vec!["POST"])
            .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT]);

        App::new()
            .wrap(TracingLogger::default())
            .wrap(cors)
            .app_data(store.clone())
            .service(rest::api())
    })
    .listen(listener)?
    .run();
    Ok(server)
}

fn run_debug_server(listener: TcpListener, store: Data<Store>) -> Result<Server, ApplicationError> {
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .app_data(store.clone())
            .service(rest::debug_handlers::api())
    })
    .listen(listener)?
    .run();
    Ok(server)
}

/// Wires the repository and hasher selected by the configuration into a
/// store shared by all workers.
pub async fn prepare_store(configuration: &Configuration) -> Result<Store, ApplicationError> {
    let repo: Arc<dyn RegistrationRepository + Send + Sync> = match configuration.database.backend
    {
        Backend::Memory => Arc::new(Memory::new()),
        Backend::Postgres => {
            let postgres = Postgres::connect(
                configuration.database.uri.expose_secret(),
                configuration.database.pool_max_size,
            )?;
            // Requests fail with a 500 until the database is reachable.
            if let Err(err) = postgres.migrate().await {
                tracing::warn!(error = %err, "Couldn't prepare the register table");
            }
            Arc::new(postgres)
        }
    };

    let registration_service =
        RegistrationService::new(repo, configuration.registration.hashing.hasher())
            .with_strict_validation(configuration.registration.strict);
    Ok(Store::new(Arc::new(registration_service)))
}
