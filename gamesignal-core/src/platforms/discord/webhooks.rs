use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use twilight_http::error::ErrorType;
use twilight_http::Client as HttpClient;
use twilight_model::channel::Webhook;
use twilight_model::id::marker::{ChannelMarker, WebhookMarker};
use twilight_model::id::Id;

use gamesignal_common::models::device::{EndpointHandle, RemoteEndpoint};
use gamesignal_common::traits::platform_traits::ChatOutlet;
use gamesignal_common::traits::registry_traits::EndpointManager;

use crate::Error;

const WEBHOOK_BASE_URL: &str = "https://discord.com/api/webhooks";

pub fn webhook_url(id: Id<WebhookMarker>, token: &str) -> String {
    format!("{WEBHOOK_BASE_URL}/{id}/{token}")
}

/// Channel follower webhooks have no token and cannot be posted to; skip them.
fn to_remote(webhook: &Webhook) -> Option<RemoteEndpoint> {
    let name = webhook.name.clone()?;
    let token = webhook.token.as_deref()?;
    Some(RemoteEndpoint {
        name,
        handle: EndpointHandle(webhook.id.to_string()),
        url: webhook_url(webhook.id, token),
        endpoint_id: webhook.id.to_string(),
    })
}

fn parse_handle(handle: &EndpointHandle) -> Result<Id<WebhookMarker>, Error> {
    handle
        .0
        .parse::<u64>()
        .ok()
        .and_then(Id::new_checked)
        .ok_or_else(|| Error::RemoteOperation(format!("invalid webhook id '{handle}'")))
}

fn response_status(err: &twilight_http::Error) -> Option<u16> {
    match err.kind() {
        ErrorType::Response { status, .. } => Some(status.get()),
        _ => None,
    }
}

/// 403 is a permission problem everywhere; 404 means the channel is gone when
/// the request addressed the channel, and is just a failure otherwise.
fn map_http_error(context: &str, err: twilight_http::Error, channel_scoped: bool) -> Error {
    match response_status(&err) {
        Some(403) => Error::Permission(format!("{context}: {err}")),
        Some(404) if channel_scoped => Error::ChannelNotFound(format!("{context}: {err}")),
        _ => Error::RemoteOperation(format!("{context}: {err}")),
    }
}

/// Webhooks on the configured gaming channel, via the Discord REST API.
pub struct DiscordWebhookManager {
    http: Arc<HttpClient>,
    channel_id: Id<ChannelMarker>,
}

impl DiscordWebhookManager {
    pub fn new(http: Arc<HttpClient>, channel_id: Id<ChannelMarker>) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl EndpointManager for DiscordWebhookManager {
    async fn list(&self) -> Result<Vec<RemoteEndpoint>, Error> {
        let webhooks = self
            .http
            .channel_webhooks(self.channel_id)
            .await
            .map_err(|e| map_http_error("listing webhooks", e, true))?
            .models()
            .await
            .map_err(|e| Error::RemoteOperation(format!("decoding webhook list: {e}")))?;

        debug!("Channel {} has {} webhooks", self.channel_id, webhooks.len());
        Ok(webhooks.iter().filter_map(to_remote).collect())
    }

    async fn create(&self, full_name: &str) -> Result<RemoteEndpoint, Error> {
        let webhook = self
            .http
            .create_webhook(self.channel_id, full_name)
            .await
            .map_err(|e| map_http_error("creating webhook", e, true))?
            .model()
            .await
            .map_err(|e| Error::RemoteOperation(format!("decoding created webhook: {e}")))?;

        info!("Created Discord webhook {full_name} (id={})", webhook.id);
        to_remote(&webhook).ok_or_else(|| {
            Error::RemoteOperation(format!("webhook {} was created without a token", webhook.id))
        })
    }

    async fn rename(&self, handle: &EndpointHandle, full_name: &str) -> Result<(), Error> {
        let webhook_id = parse_handle(handle)?;
        self.http
            .update_webhook(webhook_id)
            .name(full_name)
            .await
            .map_err(|e| map_http_error("renaming webhook", e, false))?;
        Ok(())
    }

    async fn delete(&self, handle: &EndpointHandle) -> Result<(), Error> {
        let webhook_id = parse_handle(handle)?;
        self.http
            .delete_webhook(webhook_id)
            .await
            .map_err(|e| Error::RemoteOperation(format!("deleting webhook {webhook_id}: {e}")))?;
        Ok(())
    }
}

/// Posts bot replies and broadcasts into the gaming channel.
pub struct DiscordChannelOutlet {
    http: Arc<HttpClient>,
    channel_id: Id<ChannelMarker>,
}

impl DiscordChannelOutlet {
    pub fn new(http: Arc<HttpClient>, channel_id: Id<ChannelMarker>) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl ChatOutlet for DiscordChannelOutlet {
    async fn send(&self, text: &str) -> Result<(), Error> {
        self.http
            .create_message(self.channel_id)
            .content(text)
            .await
            .map_err(|e| match response_status(&e) {
                Some(403) => Error::Permission(format!("sending message: {e}")),
                Some(404) => Error::ChannelNotFound(format!("sending message: {e}")),
                _ => Error::Platform(format!("Error sending Discord message: {e:?}")),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_webhook_urls() {
        let id = Id::<WebhookMarker>::new(42);
        assert_eq!(webhook_url(id, "abc"), "https://discord.com/api/webhooks/42/abc");
    }

    #[test]
    fn rejects_bad_handles() {
        assert!(parse_handle(&EndpointHandle("0".into())).is_err());
        assert!(parse_handle(&EndpointHandle("nope".into())).is_err());
        assert_eq!(parse_handle(&EndpointHandle("42".into())).unwrap().get(), 42);
    }
}
