use async_trait::async_trait;

use crate::error::Error;

/// Where replies and broadcasts go: the single configured gaming channel.
#[async_trait]
pub trait ChatOutlet: Send + Sync {
    async fn send(&self, text: &str) -> Result<(), Error>;
}
