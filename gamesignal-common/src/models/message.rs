/// A chat message as seen by the dispatcher, stripped of platform types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub author_id: String,
    pub author_display_name: String,
    /// Set when the message was posted through a webhook (i.e. by a device).
    pub webhook_id: Option<String>,
    pub content: String,
}

impl InboundMessage {
    pub fn is_device_originated(&self) -> bool {
        self.webhook_id.is_some()
    }
}
