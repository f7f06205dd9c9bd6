pub mod config;
pub mod dashboard;
pub mod derive;
pub mod error;
pub mod navigation;
pub mod output;
pub mod records;
pub mod store;
pub mod welcome;
