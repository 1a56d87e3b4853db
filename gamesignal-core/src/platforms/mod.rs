// File: src/platforms/mod.rs

use async_trait::async_trait;
use crate::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
    Error(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlatformAuth {
    async fn authenticate(&mut self) -> Result<(), Error>;
    async fn is_authenticated(&self) -> Result<bool, Error>;
}

#[async_trait]
pub trait PlatformIntegration: PlatformAuth {
    async fn connect(&mut self) -> Result<(), Error>;
    async fn disconnect(&mut self) -> Result<(), Error>;
}

pub mod discord;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_auth_reports_state() {
        let mut auth = MockPlatformAuth::new();
        auth.expect_authenticate()
            .times(1)
            .returning(|| Err(Error::Auth("Discord token is empty".into())));
        auth.expect_is_authenticated().returning(|| Ok(false));

        assert!(matches!(auth.authenticate().await, Err(Error::Auth(_))));
        assert!(!auth.is_authenticated().await.unwrap());
    }
}
