pub mod app_state;
pub mod bootstrap;
pub mod http_api;
pub mod interval_service;
pub mod list_controller;
