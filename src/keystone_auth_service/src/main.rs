use color_eyre::eyre::Result;
use keystone_adapters::config::KeystoneSettings;
use keystone_auth_service::{Application, shutdown_signal, telemetry::init_tracing};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing()?;

    let settings = KeystoneSettings::load()?;
    let application = Application::build(settings).await?;

    tokio::spawn(shutdown_signal(application.shutdown_token()));

    tracing::info!(address = %application.address(), "Starting keystone auth service");
    application.run_until_stopped().await?;
    tracing::info!("Keystone auth service stopped");

    Ok(())
}
