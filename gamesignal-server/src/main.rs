use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use gamesignal_core::config::{DEFAULT_REMOTE_TIMEOUT_SECS, DEFAULT_STORE_PATH};
use gamesignal_core::registry::DEFAULT_ENDPOINT_PREFIX;
use gamesignal_core::{BotConfig, Error};

mod server;

#[derive(Parser, Debug, Clone)]
#[command(name = "gamesignal")]
#[command(author, version, about = "Gaming signal bot - bridges chat and ESP32 webhooks into one broadcast channel")]
struct Args {
    /// Discord bot token
    #[arg(long, env = "DISCORD_BOT_TOKEN", hide_env_values = true)]
    token: String,

    /// ID of the channel used for commands, webhooks and broadcasts
    #[arg(long, env = "GAMING_CHANNEL_ID")]
    channel_id: u64,

    /// Where the device registry cache is persisted
    #[arg(long, env = "GAMESIGNAL_STORE_PATH", default_value = DEFAULT_STORE_PATH)]
    store_path: PathBuf,

    /// Name prefix that marks a channel webhook as one of our devices
    #[arg(long, env = "GAMESIGNAL_ENDPOINT_PREFIX", default_value = DEFAULT_ENDPOINT_PREFIX)]
    endpoint_prefix: String,

    /// Upper bound for any single webhook/store call
    #[arg(long, env = "GAMESIGNAL_REMOTE_TIMEOUT_SECS", default_value_t = DEFAULT_REMOTE_TIMEOUT_SECS)]
    remote_timeout_secs: u64,
}

impl Args {
    fn into_config(self) -> Result<BotConfig, Error> {
        let config = BotConfig {
            token: self.token,
            channel_id: self.channel_id,
            store_path: self.store_path,
            endpoint_prefix: self.endpoint_prefix,
            remote_timeout: Duration::from_secs(self.remote_timeout_secs),
        };
        config.validate()?;
        Ok(config)
    }
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("gamesignal=info".parse().unwrap_or_default())
        .add_directive("gamesignal_core=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    tracing::subscriber::set_global_default(sub)
        .expect("Failed to set global subscriber");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env is fine; flags and the real environment still apply.
    dotenv::dotenv().ok();
    init_tracing();

    let args = Args::parse();
    info!(
        "Gaming signal bot starting. channel={}, store={}",
        args.channel_id,
        args.store_path.display()
    );

    let config = args.into_config()?;
    if let Err(e) = server::run_server(config).await {
        error!("Server error: {:?}", e);
    }
    info!("Main finished. Goodbye!");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_with_defaults() {
        let args = Args::try_parse_from([
            "gamesignal",
            "--token",
            "abc",
            "--channel-id",
            "1234",
        ])
        .unwrap();
        let cfg = args.into_config().unwrap();
        assert_eq!(cfg.channel_id, 1234);
        assert_eq!(cfg.endpoint_prefix, "Gaming-");
        assert_eq!(cfg.store_path, PathBuf::from("device_webhooks.json"));
        assert_eq!(cfg.remote_timeout, Duration::from_secs(10));
    }

    #[test]
    fn zero_channel_is_rejected() {
        let args = Args::try_parse_from(["gamesignal", "--token", "abc", "--channel-id", "0"]).unwrap();
        assert!(matches!(args.into_config(), Err(Error::Config(_))));
    }
}
