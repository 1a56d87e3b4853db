// src/repositories/mod.rs

pub mod json_file;

pub use json_file::JsonFileRegistryStore;
