pub mod csv_load;

pub use csv_load::config::{LoaderConfig, RunMode};
pub use csv_load::core_loader::{run_load, LoadReport};
pub use csv_load::error::LoaderError;
