use anyhow::Context;
use crud_api_config::config::{EnvLoader, JwtKeyMaterial};
use crud_api_config::shared::LoggingUtils;
use tracing::{error, info, warn};

/// Directory holding the `.<mode>.env` files
const CONFIG_DIR_VAR: &str = "CONFIG_DIR";

fn main() {
    let base_dir = std::env::var(CONFIG_DIR_VAR).unwrap_or_else(|_| ".".to_string());
    let loader = EnvLoader::new(&base_dir);

    if let Err(e) = LoggingUtils::initialize(&loader.log_level()) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }

    if let Err(e) = run(&loader) {
        error!("Configuration check failed: {:#}", e);
        std::process::exit(1);
    }
}

fn run(loader: &EnvLoader) -> anyhow::Result<()> {
    info!(
        mode = %loader.mode(),
        path = %loader.env_file_path().display(),
        "Loading configuration"
    );

    let config = loader.load().context("failed to load configuration")?;

    match JwtKeyMaterial::from_config(&config).context("failed to load JWT keys")? {
        Some(keys) => info!(
            fingerprint = %keys.access_fingerprint(),
            dedicated_refresh_key = keys.has_dedicated_refresh_key(),
            "JWT key material is usable"
        ),
        None => warn!("No JWT key pair configured; token signing is unavailable"),
    }

    info!(
        address = %config.server_address(),
        database = %format!("{}:{}/{}", config.db_host, config.db_port, config.db_name),
        "Configuration is valid"
    );

    Ok(())
}
