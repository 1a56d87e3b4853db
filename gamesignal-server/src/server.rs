use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use twilight_model::id::marker::ChannelMarker;
use twilight_model::id::Id;

use gamesignal_core::platforms::discord::{
    DiscordChannelOutlet, DiscordEvent, DiscordPlatform, DiscordWebhookManager,
};
use gamesignal_core::platforms::{PlatformAuth, PlatformIntegration};
use gamesignal_core::repositories::JsonFileRegistryStore;
use gamesignal_core::{BotConfig, DeviceRegistry, Error, MessageService};

/// Flip the returned watch to `true` once `signal` fires. If the signal
/// cannot be installed the watch is left at `false`.
fn spawn_shutdown_listener<F>(signal: F) -> watch::Receiver<bool>
where
    F: Future<Output = std::io::Result<()>> + Send + 'static,
{
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = signal.await {
            error!("Failed to listen for Ctrl-C: {:?}", e);
            return;
        }
        info!("Ctrl-C detected; shutting down...");
        let _ = shutdown_tx.send(true);
    });
    shutdown_rx
}

pub async fn run_server(config: BotConfig) -> Result<(), Error> {
    let channel_id = Id::<ChannelMarker>::new_checked(config.channel_id)
        .ok_or_else(|| Error::Config("gaming channel id must be non-zero".into()))?;

    // 1) Connect to Discord
    let mut platform = DiscordPlatform::new(config.token.clone(), channel_id);
    platform.authenticate().await?;
    platform.connect().await?;
    let http = platform.http_client()?;

    // 2) Wire the registry and the message service
    let endpoints = Arc::new(DiscordWebhookManager::new(http.clone(), channel_id));
    let outlet = Arc::new(DiscordChannelOutlet::new(http, channel_id));
    let store = Arc::new(JsonFileRegistryStore::new(&config.store_path));
    info!("Using registry store at {}", store.path().display());

    let registry = DeviceRegistry::new(
        endpoints,
        store,
        config.endpoint_prefix.clone(),
        config.remote_timeout,
    );
    let service = MessageService::new(registry, outlet);

    // 3) Ctrl-C => shutdown signal
    let mut shutdown_rx = spawn_shutdown_listener(tokio::signal::ctrl_c());

    // 4) Main loop: one event at a time, fully handled before the next
    let mut announced = false;
    loop {
        tokio::select! {
            Ok(_) = shutdown_rx.changed() => {
                if *shutdown_rx.borrow() {
                    info!("Shutdown signaled; exiting event loop.");
                    break;
                }
            }
            event = platform.next_event() => {
                match event {
                    Some(DiscordEvent::Ready { bot_user_id, bot_name }) => {
                        info!("{bot_name} has logged in!");
                        service.set_bot_user_id(bot_user_id);
                        if !announced {
                            if let Err(e) = service.announce_online().await {
                                error!("Could not post online announcement: {e}");
                            }
                            announced = true;
                        }
                        if let Err(e) = service.reconcile().await {
                            error!("Could not reload device webhooks: {e}");
                        }
                    }
                    Some(DiscordEvent::Message(msg)) => {
                        debug!("Inbound message from {}", msg.author_display_name);
                        if let Err(e) = service.process_incoming_message(&msg).await {
                            error!("Failed to reply in gaming channel: {e}");
                        }
                    }
                    None => {
                        warn!("Discord event stream closed; exiting event loop.");
                        break;
                    }
                }
            }
        }
    }

    // 5) Flush and disconnect
    if let Err(e) = service.shutdown().await {
        warn!("Could not flush device registry on shutdown: {e}");
    }
    platform.disconnect().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn shutdown_listener_fires_on_signal() {
        let mut rx = spawn_shutdown_listener(async { Ok(()) });
        rx.changed().await.expect("sender kept until it sends");
        assert!(*rx.borrow());
    }

    #[tokio::test]
    async fn shutdown_listener_ignores_failed_signal_install() {
        let mut rx = spawn_shutdown_listener(async {
            Err(std::io::Error::other("no signal handler"))
        });
        // The sender is dropped without ever sending.
        assert!(rx.changed().await.is_err());
        assert!(!*rx.borrow());
    }
}
