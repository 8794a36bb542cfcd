mod sqlite_store;
mod store;
mod types;

pub use sqlite_store::SqliteArtworkStore;
pub use store::*;
pub use types::*;
