//! Domain layer: page tree, manager, and preference store
//!
//! This layer is independent of external concerns (no file access, no CLI, no config loading).
//! Persistence goes through the `StoreSink` seam; implementations live in infrastructure.

pub mod arena;
pub mod error;
pub mod format;
pub mod identifier;
pub mod manager;
pub mod page;
pub mod store;

pub use arena::{NodeId, PreferenceNode, PreferenceTree, TreeNode};
pub use error::{DomainError, DomainResult};
pub use format::StoreFormat;
pub use identifier::{Identifier, ROOT_IDENTIFIER};
pub use manager::{ListenerId, PreferenceManager};
pub use page::{BlankPage, PageRef, PreferencePage};
pub use store::{
    shared, LoadOutcome, PreferenceStore, SaveOutcome, SharedStore, StoreSink,
};
