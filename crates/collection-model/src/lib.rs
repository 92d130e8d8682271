//! Collection model - authoritative in-test state of a collection
//!
//! A collection is an ordered, duplicate-free bundle of exploration
//! references with its own metadata and publication lifecycle:
//! - [`CollectionGraph`]: node ordering (add, shift, delete)
//! - [`Collection`]: staged vs committed state, save/publish lifecycle
//! - [`PendingId`]: identifiers assigned asynchronously by the system under test
//!
//! # Example
//!
//! ```rust
//! use collection_model::prelude::*;
//!
//! let author = Account::new("alice@collections.com", "alice")
//!     .with_role(Role::CollectionEditor);
//! let mut collection =
//!     Collection::create(CollectionId::new("c1"), &author, CommitMessagePolicy::default())?;
//!
//! let mut edit = collection.edit(&author)?;
//! edit.add_node(ExplorationId::new("e1"))?;
//! edit.save_draft(None)?;
//! edit.publish()?;
//! assert_eq!(collection.status(), PublicationStatus::Published);
//! # Ok::<(), collection_model::ModelError>(())
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod collection;
pub mod error;
pub mod graph;
pub mod lifecycle;
pub mod pending;
pub mod types;

pub use collection::{Collection, CollectionEditor, CollectionState, CommitRecord};
pub use error::ModelError;
pub use graph::CollectionGraph;
pub use lifecycle::{allowed_transitions, next_status, CommitMessagePolicy, LifecycleAction};
pub use pending::{IdResolver, PendingId};
pub use types::{
    Account, ActorTag, CollectionId, CollectionMetadata, CollectionNode, Exploration,
    ExplorationId, ExplorationStatus, ExplorationSummary, PublicationStatus, Role,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with the collection model
    pub use crate::{
        Account, ActorTag, Collection, CollectionGraph, CollectionId, CommitMessagePolicy,
        ExplorationId, ModelError, PendingId, PublicationStatus, Role,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
