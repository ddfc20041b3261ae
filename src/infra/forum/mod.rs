// Implementations of the forum store.

pub mod in_memory;
pub mod sqlite_store;

pub use in_memory::InMemoryForumStore;
pub use sqlite_store::SqliteForumStore;
