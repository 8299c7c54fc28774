// src/vault/mod.rs
// The hierarchical artifact store: validated paths, the pure tree
// structure, and the async store facade.

pub mod path;
pub mod store;
pub mod tree;

pub use path::VaultPath;
pub use store::{TreeEvent, TreeStore};
pub use tree::{Artifact, Folder, Node};
