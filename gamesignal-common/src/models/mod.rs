// File: gamesignal-common/src/models/mod.rs
pub mod device;
pub mod message;

pub use device::{DeviceEntry, EndpointHandle, PersistedDevice, PersistedRegistry, RemoteEndpoint};
pub use message::InboundMessage;
