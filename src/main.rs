use mcprotocol::config::ServerSettings;
use mcprotocol::server::Server;
use mcprotocol::utils::logging::init_logging;

/// Path to a TOML config file; environment overrides still apply on top.
const CONFIG_ENV: &str = "MCPROTOCOL_CONFIG";

#[tokio::main]
async fn main() -> mcprotocol::Result<()> {
    let settings = match std::env::var(CONFIG_ENV) {
        Ok(path) => {
            let mut settings = ServerSettings::from_file(path)?;
            settings.apply_env();
            settings
        }
        Err(_) => ServerSettings::from_env()?,
    };

    init_logging(&settings.logging)?;
    settings.validate_strict()?;

    Server::new(settings).start().await
}
