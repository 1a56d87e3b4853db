use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use gamesignal_common::models::message::InboundMessage;
use gamesignal_common::traits::platform_traits::ChatOutlet;

use crate::registry::{Applied, DeviceRegistry, ReconcileReport, UNKNOWN_DEVICE};
use crate::services::command_parser::{classify, help_text, Command};
use crate::services::signal::{build_signal, is_play_intent, is_reset_intent, SignalOrigin};
use crate::Error;

pub const ONLINE_ANNOUNCEMENT: &str = "🎮 Gaming bot is online!";

/// Success line, followed by a warning when the registry file was not updated.
fn applied_reply<T>(applied: &Applied<T>, success: String) -> Vec<String> {
    let mut lines = vec![success];
    if let Some(e) = &applied.unsaved {
        let detail = match e {
            Error::Persistence(detail) => detail.clone(),
            other => other.to_string(),
        };
        lines.push(format!("❌ Could not save device registry: {detail}"));
    }
    lines
}

/// Which webhook operation an error reply is about.
#[derive(Debug, Clone, Copy)]
enum WebhookAction {
    Create,
    Rename,
    Delete,
}

impl WebhookAction {
    fn verb(self) -> &'static str {
        match self {
            WebhookAction::Create => "create",
            WebhookAction::Rename => "rename",
            WebhookAction::Delete => "delete",
        }
    }

    fn gerund(self) -> &'static str {
        match self {
            WebhookAction::Create => "creating",
            WebhookAction::Rename => "renaming",
            WebhookAction::Delete => "deleting",
        }
    }
}

/// Turn a handler error into the `❌ ...` line users see.
fn failure_reply(action: WebhookAction, err: &Error) -> String {
    match err {
        Error::DuplicateDevice(name) => format!("❌ Device **{name}** already exists"),
        Error::DeviceNotFound(name) => format!("❌ Device **{name}** not found"),
        Error::Permission(_) => {
            format!("❌ Bot doesn't have permission to {} webhooks!", action.verb())
        }
        Error::ChannelNotFound(detail) => format!("❌ Could not find the gaming channel: {detail}"),
        Error::RemoteOperation(detail) => {
            format!("❌ Error {} webhook: {detail}", action.gerund())
        }
        other => format!("❌ Error {} webhook: {other}", action.gerund()),
    }
}

/// Ingests chat messages from the gaming channel: runs `!` commands against
/// the device registry and turns play-intent messages into broadcasts.
///
/// Messages are expected one at a time; the registry mutex is held for the
/// whole of each command so no two mutations interleave.
pub struct MessageService {
    registry: Mutex<DeviceRegistry>,
    outlet: Arc<dyn ChatOutlet>,
    bot_user_id: RwLock<Option<String>>,
}

impl MessageService {
    pub fn new(registry: DeviceRegistry, outlet: Arc<dyn ChatOutlet>) -> Self {
        debug!("MessageService::new() called");
        Self {
            registry: Mutex::new(registry),
            outlet,
            bot_user_id: RwLock::new(None),
        }
    }

    /// Remember our own user id so our broadcasts never trigger more signals.
    pub fn set_bot_user_id(&self, id: impl Into<String>) {
        *self.bot_user_id.write() = Some(id.into());
    }

    pub async fn registry(&self) -> MutexGuard<'_, DeviceRegistry> {
        self.registry.lock().await
    }

    pub async fn announce_online(&self) -> Result<(), Error> {
        self.outlet.send(ONLINE_ANNOUNCEMENT).await
    }

    pub async fn reconcile(&self) -> Result<ReconcileReport, Error> {
        let report = self.registry.lock().await.reconcile().await?;
        info!(
            "Registry reconciled: {} devices, {} stale, {} refreshed",
            report.restored.len(),
            report.stale.len(),
            report.refreshed.len()
        );
        Ok(report)
    }

    /// Flush the registry to its store. Called once at shutdown.
    pub async fn shutdown(&self) -> Result<(), Error> {
        self.registry.lock().await.flush().await
    }

    /// Handle one inbound message and post every reply, in order.
    pub async fn process_incoming_message(&self, msg: &InboundMessage) -> Result<(), Error> {
        let replies = self.respond(msg).await;
        for line in &replies {
            self.outlet.send(line).await?;
        }
        Ok(())
    }

    /// The lines a message should produce, without sending them.
    pub async fn respond(&self, msg: &InboundMessage) -> Vec<String> {
        if self.is_own_message(msg) {
            return Vec::new();
        }
        debug!("Message from {}: {}", msg.author_display_name, msg.content);

        let command = match classify(&msg.content) {
            Ok(c) => c,
            Err(Error::MalformedCommand(usage)) => {
                debug!("Malformed command from {}: {}", msg.author_display_name, msg.content);
                return vec![format!("❌ Format: {usage}")];
            }
            Err(e) => return vec![format!("❌ {e}")],
        };

        match command {
            Command::CreateDevice { name } => self.create_device(&name).await,
            Command::RenameDevice { old, new } => self.rename_device(&old, &new).await,
            Command::DeleteDevice { name } => self.delete_device(&name).await,
            Command::ListDevices => vec![self.list_devices().await],
            Command::Help => vec![help_text()],
            Command::NoCommand => self.detect_signal(msg).await,
        }
    }

    fn is_own_message(&self, msg: &InboundMessage) -> bool {
        self.bot_user_id
            .read()
            .as_deref()
            .is_some_and(|id| id == msg.author_id)
    }

    async fn create_device(&self, name: &str) -> Vec<String> {
        let mut registry = self.registry.lock().await;
        match registry.create(name).await {
            Ok(applied) => {
                let url = &applied.value;
                applied_reply(&applied, format!("✅ Created webhook for **{name}**\n```{url}```"))
            }
            Err(e) => {
                error!("Error creating webhook for {name}: {e}");
                vec![failure_reply(WebhookAction::Create, &e)]
            }
        }
    }

    async fn rename_device(&self, old: &str, new: &str) -> Vec<String> {
        let mut registry = self.registry.lock().await;
        match registry.rename(old, new).await {
            Ok(applied) => applied_reply(&applied, format!("✅ Renamed **{old}** to **{new}**")),
            Err(e) => {
                warn!("Rename {old} -> {new} failed: {e}");
                vec![failure_reply(WebhookAction::Rename, &e)]
            }
        }
    }

    async fn delete_device(&self, name: &str) -> Vec<String> {
        let mut registry = self.registry.lock().await;
        match registry.delete(name).await {
            Ok(applied) => applied_reply(&applied, format!("✅ Deleted webhook for **{name}**")),
            Err(e) => {
                warn!("Delete of {name} failed: {e}");
                vec![failure_reply(WebhookAction::Delete, &e)]
            }
        }
    }

    async fn list_devices(&self) -> String {
        let names = self.registry.lock().await.list_names();
        if names.is_empty() {
            return "❌ No devices registered yet".to_string();
        }
        let list = names
            .iter()
            .map(|n| format!("• **{n}**"))
            .collect::<Vec<_>>()
            .join("\n");
        format!("📱 **Registered Devices:**\n{list}")
    }

    async fn detect_signal(&self, msg: &InboundMessage) -> Vec<String> {
        let origin = match &msg.webhook_id {
            Some(webhook_id) => {
                let name = self
                    .registry
                    .lock()
                    .await
                    .lookup_by_endpoint_id(webhook_id)
                    .to_string();
                if name == UNKNOWN_DEVICE {
                    warn!("Webhook message from unregistered webhook id {webhook_id}");
                } else {
                    debug!("Identified device: {name}");
                }
                if is_reset_intent(&msg.content) && !is_play_intent(&msg.content) {
                    info!("Device {name} reset its gaming signal");
                    return Vec::new();
                }
                SignalOrigin::Device(name)
            }
            None => SignalOrigin::Human(msg.author_display_name.clone()),
        };

        if !is_play_intent(&msg.content) {
            return Vec::new();
        }

        let broadcast = build_signal(&origin);
        match &origin {
            SignalOrigin::Device(name) => info!("ESP32 GAMING SIGNAL from {name}"),
            SignalOrigin::Human(name) => info!("GAMING SIGNAL from {name}"),
        }
        broadcast.lines().iter().map(|line| line.to_string()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_replies_match_chat_protocol() {
        assert_eq!(
            failure_reply(WebhookAction::Delete, &Error::DeviceNotFound("Esp1".into())),
            "❌ Device **Esp1** not found"
        );
        assert_eq!(
            failure_reply(WebhookAction::Delete, &Error::RemoteOperation("boom".into())),
            "❌ Error deleting webhook: boom"
        );
        assert_eq!(
            failure_reply(WebhookAction::Rename, &Error::DuplicateDevice("Esp2".into())),
            "❌ Device **Esp2** already exists"
        );
        assert_eq!(
            failure_reply(WebhookAction::Create, &Error::Permission("403".into())),
            "❌ Bot doesn't have permission to create webhooks!"
        );
    }

    #[test]
    fn unsaved_mutation_adds_warning_line() {
        let applied = Applied {
            value: (),
            unsaved: Some(Error::Persistence("disk full".into())),
        };
        assert_eq!(
            applied_reply(&applied, "✅ Deleted webhook for **Esp1**".into()),
            vec![
                "✅ Deleted webhook for **Esp1**".to_string(),
                "❌ Could not save device registry: disk full".to_string(),
            ]
        );
    }
}
