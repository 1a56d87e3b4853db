// File: src/services/mod.rs

pub mod command_parser;
pub mod message_service;
pub mod signal;

pub use command_parser::{classify, Command};
pub use message_service::MessageService;
