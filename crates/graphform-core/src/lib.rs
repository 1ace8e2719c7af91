//! Reactive configuration store for cloud topology builders.
//!
//! The crate keeps a configuration graph (vpcs, subnets, security groups,
//! key management, storage, compute, ...) consistent while it is edited:
//!
//! - **[`ConfigStore`]**: Owns the [`Document`] and the [`EntityRegistry`].
//!   Every mutation ([`create`](ConfigStore::create),
//!   [`save`](ConfigStore::save), [`delete`](ConfigStore::delete),
//!   [`move_record`](ConfigStore::move_record)) is followed by one full
//!   reconciliation pass and exactly one subscriber notification.
//!
//! - **[`EntityDefinition`]**: Lifecycle contract per top-level collection,
//!   driven by a static [`EntitySpec`]: fields, references, owned child
//!   lists, rename policy and uniqueness scope.
//!
//! - **[`reconcile`]**: Repairs references that no longer resolve: scalars
//!   fall back to their sentinel, lists are filtered in order, dependents
//!   are cleared. Cascading renames and the read-only [`audit`] live here.
//!
//! - **[`FormSession`]**: Draft editing with state-change hooks, visibility,
//!   option groups and validation, committed through the store.
//!
//! - **[`views`]**: Derived read-only lookups over a document.

pub mod entity;
pub mod error;
pub mod form;
pub mod model;
pub mod reconcile;
pub mod schema;
pub mod store;
pub mod views;

// ── Primary re-exports ──────────────────────────────────────────────
pub use entity::{EntityDefinition, EntitySpec, RECONCILE_ORDER, RenamePolicy, Shape, Uniqueness};
pub use error::CoreError;
pub use form::FormSession;
pub use model::{
    CreateContext, DeleteContext, Document, FormContext, Record, RecordExt, SaveContext,
    StorePath, ValidationContext,
};
pub use reconcile::{Finding, audit};
pub use schema::{FieldIssue, FieldKind, FieldSpec};
pub use store::{
    CollectionRepair, ConfigStore, EntityRegistry, RecordIssues, StoreConfig, UpdateCallback,
};
