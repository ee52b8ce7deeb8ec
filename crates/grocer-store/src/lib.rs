//! Durable key-value storage for the Grocer admin client.
//!
//! Provides a small string-to-string store abstraction with two backends:
//!
//! - [`MemoryStore`] keeps entries in process memory (tests, throwaway sessions).
//! - [`FileStore`] keeps entries in a JSON file so they survive restarts.
//!
//! # Example
//!
//! ```rust,ignore
//! use grocer_store::{FileStore, KeyValueStore};
//!
//! let store = FileStore::open("/home/me/.local/share/grocer/session.json")?;
//! store.set("grocer.username", "ops-lead")?;
//! assert_eq!(store.get("grocer.username")?.as_deref(), Some("ops-lead"));
//! store.delete("grocer.username")?;
//! ```

mod error;
mod file;
mod kv;
mod memory;

pub use error::StoreError;
pub use file::FileStore;
pub use kv::KeyValueStore;
pub use memory::MemoryStore;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::{FileStore, KeyValueStore, MemoryStore, StoreError};
}
