// Adapters layer: concrete implementations for external systems (http, progress log, sqlite).

pub mod http;
pub mod progress_log;
pub mod sqlite;

pub use http::HttpClient;
pub use progress_log::{FileProgressLog, MemoryProgressLog};
pub use sqlite::with_connection;
