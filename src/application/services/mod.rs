//! Application services
//!
//! Concrete service implementations that orchestrate domain logic.
//! Services depend on I/O boundary traits (FileSystem) or on the shared store,
//! but are themselves concrete structs, not traits.

mod catalogue;
mod store;

pub use catalogue::{Catalogue, CatalogueService, PageEntry};
pub use store::{StoreEntry, StoreService};
