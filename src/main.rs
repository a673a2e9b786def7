use anyhow::Context;
use user_api::{
    configuration::get_configuration,
    startup,
    telementry::{get_subscriber, init_subscriber, shutdown_telemetry},
    version::BuildInfo,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = get_configuration().context("could not get config")?;

    let subscriber = get_subscriber(
        "user-api".into(),
        "info".into(),
        std::io::stdout,
        settings.telemetry.otlp_endpoint.as_deref(),
    )?;
    init_subscriber(subscriber)?;

    let result = startup::run(settings, BuildInfo::from_build_env()).await;
    if let Err(e) = &result {
        tracing::error!("user-api exited with error: {:?}", e);
    }
    shutdown_telemetry();
    result
}
