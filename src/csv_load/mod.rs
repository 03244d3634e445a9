pub mod config;
pub mod core_loader;
pub mod demo_strategy;
pub mod error;
pub mod load_strategy;
pub mod production_strategy;
