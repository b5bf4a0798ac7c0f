pub mod error;
pub mod export;
pub mod loader;

pub use error::DataError;
pub use export::{records_to_csv, write_results_archive, write_session_json};
pub use loader::{infer_kind, load_playable, load_series_file, parse_series};
