use crate::config::Config;
use crate::deployment::DeploymentTrigger;
use crate::engine_client::EngineClient;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::ChronoLocal;

mod config;
mod deployment;
mod engine_client;
mod error;
mod model;
mod secret_string;

#[cfg(target_env = "musl")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[derive(Parser)]
#[command(version, about = "Update a DuploCloud service image and wait until its pods are running")]
struct Cli {
    /// Name of the service to update
    service_name: String,
    /// Container image reference to deploy, e.g. repo/image:tag
    image: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,duplo_service_updater=debug")),
        )
        .init();
    info!("Starting duplo-service-updater {}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let client = EngineClient::new(&config.engine, &config.tls)?;
    let trigger = DeploymentTrigger::new(client, config.polling);

    if let Err(e) = trigger.deploy(&cli.service_name, &cli.image).await {
        error!("Deployment of service {} failed: {:#}", cli.service_name, e);
        return Err(e);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn test_cli_requires_image_argument() {
        let err = Cli::try_parse_from(["duplo-service-updater", "myservice"])
            .err()
            .expect("parsing should fail without an image");
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_cli_parses_service_and_image() {
        let cli = Cli::try_parse_from(["duplo-service-updater", "myservice", "repo/image:tag"])
            .expect("both positional arguments are given");
        assert_eq!(cli.service_name, "myservice");
        assert_eq!(cli.image, "repo/image:tag");
    }
}
