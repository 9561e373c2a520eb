//! In-memory storage backing the shelf resource stores.

pub mod join;
pub mod memory;

pub use join::JoinTable;
pub use memory::MemoryStore;
