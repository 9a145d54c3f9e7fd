use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("can't read {path:?}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("no observations left after applying the exclusion list")]
    EmptyDataset,

    #[error("observation id={id} has sigma_y={sigma_y}, which must be positive")]
    NonPositiveUncertainty { id: i64, sigma_y: f64 },

    #[error("normal matrix of the weighted least-squares fit is singular")]
    SingularMatrix,

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("trace holds {n_rows} rows, need more than n_burn={n_burn}")]
    EmptyTrace { n_rows: usize, n_burn: usize },

    #[error("samples contain NaN, can't bin them")]
    UndefinedOrder,

    #[error(transparent)]
    Linalg(#[from] ndarray_linalg::error::LinalgError),

    #[error("plotting failed: {0}")]
    Plot(String),
}
