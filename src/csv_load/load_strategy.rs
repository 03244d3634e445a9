use crate::csv_load::core_loader::{CoreLoader, LoadReport};
use crate::csv_load::error::LoaderError;

/// Strategy trait for pushing the staged CSV rows into the destination.
/// The demo and production variants share the staging machinery and differ
/// only in clearing, truncation, filtering and chunking behavior.
pub trait LoadStrategy {
    /// Run the full load against an already-connected loader.
    fn load_into_postgres(&self, core: &CoreLoader) -> Result<LoadReport, LoaderError>;
}
