use thiserror::Error;

#[derive(Debug, Error)]
pub enum DataError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Zip(#[from] zip::result::ZipError),
    #[error("data source is empty")]
    Empty,
    #[error("line {line}: expected 4 comma-separated fields, found {found}")]
    BadRow { line: usize, found: usize },
    #[error("line {line}, field {column}: {value:?} is not a number")]
    BadField {
        line: usize,
        column: usize,
        value: String,
    },
}
