use svc::{
    application::{Application, ApplicationError},
    configuration::Configuration,
    telemetry::{get_subscriber, init_subscriber},
};

#[actix_web::main]
async fn main() -> Result<(), ApplicationError> {
    let subscriber = get_subscriber("registration-svc".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber).map_err(ApplicationError::TelemetryError)?;

    let configuration = Configuration::parse("APP")?;
    let application = Application::build(configuration).await?;
    application.serve().await
}
