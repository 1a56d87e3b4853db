use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use twilight_gateway::{
    self as gateway,
    CloseFrame,
    Config,
    Event,
    EventTypeFlags,
    Intents,
    MessageSender,
    Shard,
    StreamExt,
};
use twilight_http::client::ClientBuilder;
use twilight_http::Client as HttpClient;
use twilight_model::channel::Message;
use twilight_model::gateway::payload::incoming::Ready as ReadyPayload;
use twilight_model::id::marker::ChannelMarker;
use twilight_model::id::Id;

use gamesignal_common::models::message::InboundMessage;

use crate::platforms::{ConnectionStatus, PlatformAuth, PlatformIntegration};
use crate::Error;

/// What the shard runner hands to the worker loop.
#[derive(Debug, Clone)]
pub enum DiscordEvent {
    Ready { bot_user_id: String, bot_name: String },
    Message(InboundMessage),
}

/// Nickname, then global display name, then username.
fn display_name(msg: &Message) -> String {
    msg.member
        .as_ref()
        .and_then(|m| m.nick.clone())
        .or_else(|| msg.author.global_name.clone())
        .unwrap_or_else(|| msg.author.name.clone())
}

pub fn to_inbound(msg: &Message) -> InboundMessage {
    InboundMessage {
        author_id: msg.author.id.to_string(),
        author_display_name: display_name(msg),
        webhook_id: msg.webhook_id.map(|id| id.to_string()),
        content: msg.content.clone(),
    }
}

/// Reads gateway events, keeps only READY and messages in the gaming channel,
/// and forwards them to `tx`. Webhook-authored messages are kept: that is how
/// devices talk to us.
async fn shard_runner(
    mut shard: Shard,
    tx: UnboundedSender<DiscordEvent>,
    channel_id: Id<ChannelMarker>,
) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    let flags = EventTypeFlags::READY | EventTypeFlags::MESSAGE_CREATE;
    while let Some(item) = shard.next_event(flags).await {
        let event = match item {
            Ok(event) => event,
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
                continue;
            }
        };

        let forwarded = match &event {
            Event::Ready(ready) => {
                let data: &ReadyPayload = ready;
                info!(
                    "Shard {shard_id} => READY as {} (ID={})",
                    data.user.name, data.user.id
                );
                Some(DiscordEvent::Ready {
                    bot_user_id: data.user.id.to_string(),
                    bot_name: data.user.name.clone(),
                })
            }
            Event::MessageCreate(msg_create) => {
                if msg_create.channel_id != channel_id {
                    trace!("Ignoring message in channel {}", msg_create.channel_id);
                    None
                } else {
                    Some(DiscordEvent::Message(to_inbound(msg_create)))
                }
            }
            _ => {
                trace!("Shard {shard_id} => unhandled event: {:?}", event.kind());
                None
            }
        };

        if let Some(ev) = forwarded {
            if tx.send(ev).is_err() {
                debug!("Shard {shard_id} => receiver dropped, stopping");
                break;
            }
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

pub struct DiscordPlatform {
    pub token: String,
    pub channel_id: Id<ChannelMarker>,
    pub connection_status: ConnectionStatus,

    pub rx: Mutex<Option<UnboundedReceiver<DiscordEvent>>>,

    pub shard_tasks: Vec<JoinHandle<()>>,
    pub shard_senders: Vec<MessageSender>,

    pub http: Option<Arc<HttpClient>>,
}

impl DiscordPlatform {
    pub fn new(token: String, channel_id: Id<ChannelMarker>) -> Self {
        Self {
            token,
            channel_id,
            connection_status: ConnectionStatus::Disconnected,
            rx: Mutex::new(None),
            shard_tasks: Vec::new(),
            shard_senders: Vec::new(),
            http: None,
        }
    }

    /// The REST client, available once `connect` has run.
    pub fn http_client(&self) -> Result<Arc<HttpClient>, Error> {
        self.http
            .clone()
            .ok_or_else(|| Error::Platform("Discord platform is not connected".into()))
    }

    /// Await the next forwarded event; `None` once every shard has stopped.
    pub async fn next_event(&self) -> Option<DiscordEvent> {
        let mut guard = self.rx.lock().await;
        match guard.as_mut() {
            Some(r) => r.recv().await,
            None => None,
        }
    }
}

#[async_trait]
impl PlatformAuth for DiscordPlatform {
    async fn authenticate(&mut self) -> Result<(), Error> {
        if self.token.trim().is_empty() {
            return Err(Error::Auth("Discord token is empty".into()));
        }
        Ok(())
    }

    async fn is_authenticated(&self) -> Result<bool, Error> {
        Ok(!self.token.trim().is_empty())
    }
}

#[async_trait]
impl PlatformIntegration for DiscordPlatform {
    async fn connect(&mut self) -> Result<(), Error> {
        if matches!(self.connection_status, ConnectionStatus::Connected) {
            info!("(DiscordPlatform) Already connected => skipping");
            return Ok(());
        }

        let (tx, rx) = unbounded_channel::<DiscordEvent>();
        {
            let mut guard = self.rx.lock().await;
            *guard = Some(rx);
        }

        let http_client = Arc::new(
            ClientBuilder::new()
                .token(self.token.clone())
                .timeout(Duration::from_secs(30))
                .build(),
        );
        self.http = Some(http_client.clone());

        let config = Config::new(
            self.token.clone(),
            Intents::GUILDS
                | Intents::GUILD_MESSAGES
                | Intents::GUILD_WEBHOOKS
                | Intents::MESSAGE_CONTENT,
        );

        let shards = gateway::create_recommended(&http_client, config, |_, b| b.build())
            .await
            .map_err(|e| {
                self.connection_status = ConnectionStatus::Error(e.to_string());
                Error::Platform(format!("create_recommended error: {e}"))
            })?;

        for shard in shards {
            self.shard_senders.push(shard.sender());

            let tx_for_shard = tx.clone();
            let channel_id = self.channel_id;
            let handle = tokio::spawn(async move {
                shard_runner(shard, tx_for_shard, channel_id).await;
            });
            self.shard_tasks.push(handle);
        }

        self.connection_status = ConnectionStatus::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.connection_status = ConnectionStatus::Disconnected;

        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        for task in &mut self.shard_tasks {
            let _ = task.await;
        }

        self.shard_senders.clear();
        self.shard_tasks.clear();

        {
            let mut guard = self.rx.lock().await;
            *guard = None;
        }

        Ok(())
    }
}
