pub mod plugin;
pub mod schedule;
pub mod scoring;
pub mod types;
