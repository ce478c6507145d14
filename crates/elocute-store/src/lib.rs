//! elocute-store: progress and badge persistence.
//!
//! Both stores implement `elocute_core::traits::ProgressStore` with the
//! same rules: progress writes are compare-and-swap on the record version,
//! a session id is applied at most once, and a badge is awarded to a user
//! at most once.

pub mod file;
pub mod memory;
mod state;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
