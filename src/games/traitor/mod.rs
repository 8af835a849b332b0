pub mod plugin;
pub mod roles;
pub mod rules;
pub mod types;
