//! Core traits, the shared resource protocol, settings, and the module registry.

pub mod module;
pub mod registry;
pub mod resource;
pub mod settings;
pub mod store;

pub use module::{InitCtx, Module};
pub use registry::ModuleRegistry;
pub use resource::{ResourceError, Resources};
pub use store::{Entity, EntityId, Store, StoreError};
