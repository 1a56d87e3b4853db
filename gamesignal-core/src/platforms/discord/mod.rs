pub mod runtime;
pub mod webhooks;

pub use runtime::{DiscordEvent, DiscordPlatform};
pub use webhooks::{DiscordChannelOutlet, DiscordWebhookManager};
