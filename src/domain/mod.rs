pub mod models;
pub mod pagination;
pub mod presentation;
pub mod view_settings;
