// Core infrastructure modules
pub mod cache;               // LRU cache wrapper
pub mod middleware;          // Viewer identity middleware and extractor
pub mod sql_collaborators;   // SQL-backed user directory and post source
pub mod sqlite_database;     // Connection pool and schema
pub mod traits;              // Collaborator traits
pub mod viewer;              // Viewer context

pub use cache::Cache;
pub use sql_collaborators::{SqlPostSource, SqlUserDirectory};
pub use sqlite_database::SqliteDatabase;
pub use traits::{PostSource, UserDirectory};
pub use viewer::ViewerContext;
