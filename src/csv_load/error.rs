use thiserror::Error;

/// Failure taxonomy for a load run. Each step of the procedure maps to one
/// variant so the printed message says where the run died, not just that it
/// died.
#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("missing required environment variable {0}")]
    MissingConfig(&'static str),

    #[error("could not attach the destination database: {0}")]
    Connect(#[source] duckdb::Error),

    #[error("destination schema setup failed: {0}")]
    Schema(#[source] duckdb::Error),

    #[error("{step} failed: {source}")]
    Data {
        step: &'static str,
        #[source]
        source: duckdb::Error,
    },
}

impl LoaderError {
    pub(crate) fn data(step: &'static str) -> impl FnOnce(duckdb::Error) -> LoaderError {
        move |source| LoaderError::Data { step, source }
    }
}
