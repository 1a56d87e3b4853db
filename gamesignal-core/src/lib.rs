// src/lib.rs

pub mod config;
pub mod platforms;
pub mod registry;
pub mod repositories;
pub mod services;

pub use config::BotConfig;
pub use gamesignal_common::error::Error;
pub use registry::DeviceRegistry;
pub use services::MessageService;
