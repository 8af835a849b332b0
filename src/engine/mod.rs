pub mod error;
pub mod history;
pub mod identity;
pub mod models;
pub mod notifier;
pub mod plugin;
pub mod settings;
pub mod stats;
pub mod store;
