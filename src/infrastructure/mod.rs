pub mod config;
pub mod error;
pub mod interval_repository;
pub mod intervals_client;
pub mod settings_store;
pub mod storage;
