#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    AssessmentRepository, DEFAULT_RESULTS_KEY, InMemoryRepository, ResultsRepository, Storage,
    StorageError, StoredResults,
};
pub use sqlite::{SqliteInitError, SqliteRepository};
