// ── Configuration store ──
//
// Owns the document, the entity registry and the update cycle. Every
// external mutation runs to completion, then every definition reconciles
// its collection in registry order, then the revision is bumped and the
// subscriber is called exactly once.

mod config;
mod registry;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, info};

pub use config::StoreConfig;
pub use registry::{CollectionRepair, EntityRegistry};

use crate::entity::{EntityDefinition, EntitySpec, RenamePolicy, Shape};
use crate::error::CoreError;
use crate::model::{
    CreateContext, DeleteContext, Document, Record, RecordExt, SaveContext, StorePath,
    ValidationContext,
};
use crate::reconcile::{self, Finding};
use crate::schema::FieldIssue;

/// Called once after every settled mutation.
pub type UpdateCallback = Box<dyn FnMut() + Send>;

/// Failing fields of one stored record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordIssues {
    pub path: String,
    pub name: String,
    pub issues: Vec<FieldIssue>,
}

/// The reactive configuration store.
pub struct ConfigStore {
    config: StoreConfig,
    registry: EntityRegistry,
    /// Copy-on-write so snapshots stay cheap while a mutation is applied.
    document: Arc<Document>,
    revision: watch::Sender<u64>,
    last_update: Option<DateTime<Utc>>,
    callback: Option<UpdateCallback>,
}

impl ConfigStore {
    /// A store over a freshly seeded document.
    pub fn new(config: StoreConfig) -> Self {
        Self::with_registry(config, EntityRegistry::standard(), None)
    }

    /// A store over an injected document, reconciled once before use.
    pub fn from_document(config: StoreConfig, document: Document) -> Self {
        Self::with_registry(config, EntityRegistry::standard(), Some(document))
    }

    /// A store over a custom registry. `None` seeds every collection with
    /// its definition's `init`.
    pub fn with_registry(
        config: StoreConfig,
        registry: EntityRegistry,
        document: Option<Document>,
    ) -> Self {
        let mut document = document.unwrap_or_else(|| {
            let mut seeded = Document::new();
            for definition in registry.iter() {
                definition.init(&mut seeded, &config);
            }
            seeded
        });
        let repairs = registry.reconcile(&mut document);
        let changed: usize = repairs.iter().map(|r| r.changed).sum();
        debug!(collections = registry.len(), changed, "store opened");

        let (revision, _) = watch::channel(0u64);
        Self {
            config,
            registry,
            document: Arc::new(document),
            revision,
            last_update: None,
            callback: None,
        }
    }

    // ── Subscription ─────────────────────────────────────────────────

    /// Install the single update subscriber, replacing any previous one.
    pub fn set_update_callback(&mut self, callback: impl FnMut() + Send + 'static) {
        self.callback = Some(Box::new(callback));
    }

    pub fn clear_update_callback(&mut self) {
        self.callback = None;
    }

    /// Watch the store revision. Bumped once per settled mutation.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Cheap shared handle on the current document for serializers.
    pub fn snapshot(&self) -> Arc<Document> {
        Arc::clone(&self.document)
    }

    pub fn records(&self, collection: &str) -> &[Value] {
        self.document.records(collection)
    }

    pub fn revision(&self) -> u64 {
        *self.revision.borrow()
    }

    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub fn definition(&self, collection: &str) -> Result<&dyn EntityDefinition, CoreError> {
        self.registry.get(collection).ok_or_else(|| CoreError::UnknownCollection {
            collection: collection.to_owned(),
        })
    }

    /// Entity spec of the list addressed by `path`.
    pub fn spec_for(&self, path: &StorePath) -> Result<&'static EntitySpec, CoreError> {
        self.registry.for_path(path)?.spec().resolve(path)
    }

    /// The record keyed `name` in the list at `path`, or the singleton.
    pub fn record(&self, path: &StorePath, name: &str) -> Result<&Record, CoreError> {
        let spec = self.spec_for(path)?;
        if spec.shape == Shape::Singleton {
            return self
                .document
                .singleton(path.root())
                .ok_or_else(|| CoreError::path_not_found(path, path.root()));
        }
        self.document.record_at(path, spec.key, name)
    }

    // ── Mutations ────────────────────────────────────────────────────

    pub fn create(
        &mut self,
        path: &StorePath,
        data: Record,
        ctx: &CreateContext,
    ) -> Result<(), CoreError> {
        let definition = self.registry.for_path(path)?;
        definition.create(Arc::make_mut(&mut self.document), path, data, ctx)?;
        self.settle();
        Ok(())
    }

    /// Merge `data` into the record opened as `ctx.original_name`. When the
    /// key changes and the type cascades renames, references follow it.
    pub fn save(
        &mut self,
        path: &StorePath,
        data: Record,
        ctx: &SaveContext,
    ) -> Result<(), CoreError> {
        let definition = self.registry.for_path(path)?;
        let spec = definition.spec().resolve(path)?;
        let renamed_to = data
            .str_field(spec.key)
            .filter(|key| *key != ctx.original_name)
            .map(str::to_owned);

        let document = Arc::make_mut(&mut self.document);
        definition.save(document, path, data, ctx)?;

        if let Some(new_name) = renamed_to {
            if spec.shape == Shape::List && spec.rename == RenamePolicy::Cascade {
                let specs = self.registry.specs();
                reconcile::cascade_rename(document, &specs, path, &ctx.original_name, &new_name);
            }
        }
        self.settle();
        Ok(())
    }

    pub fn delete(&mut self, path: &StorePath, ctx: &DeleteContext) -> Result<Record, CoreError> {
        let definition = self.registry.for_path(path)?;
        let removed = definition.delete(Arc::make_mut(&mut self.document), path, ctx)?;
        self.settle();
        Ok(removed)
    }

    /// Move the record at `from` to `to` within the list at `path`.
    pub fn move_record(&mut self, path: &StorePath, from: usize, to: usize) -> Result<(), CoreError> {
        let definition = self.registry.for_path(path)?;
        if definition.spec().shape == Shape::Singleton {
            return Err(CoreError::Unsupported {
                operation: "move".into(),
                collection: path.root().to_owned(),
            });
        }
        Arc::make_mut(&mut self.document).move_record(path, from, to)?;
        self.settle();
        Ok(())
    }

    /// Reset every collection to its documented default.
    pub fn reset(&mut self) {
        let document = Arc::make_mut(&mut self.document);
        for definition in self.registry.iter() {
            definition.init(document, &self.config);
        }
        info!("store reset");
        self.settle();
    }

    /// Reset one collection to its documented default.
    pub fn reset_collection(&mut self, collection: &str) -> Result<(), CoreError> {
        let definition = self.registry.get(collection).ok_or_else(|| CoreError::UnknownCollection {
            collection: collection.to_owned(),
        })?;
        definition.init(Arc::make_mut(&mut self.document), &self.config);
        self.settle();
        Ok(())
    }

    /// Force a reconciliation cycle and notify. Repairs nothing on an
    /// already consistent document.
    pub fn update(&mut self) -> Vec<CollectionRepair> {
        self.settle()
    }

    // ── Validation ───────────────────────────────────────────────────

    pub fn should_disable_save(
        &self,
        path: &StorePath,
        data: &Record,
        ctx: &ValidationContext,
    ) -> Result<bool, CoreError> {
        self.registry
            .for_path(path)?
            .should_disable_save(&self.document, path, data, ctx)
    }

    pub fn invalid_fields(
        &self,
        path: &StorePath,
        data: &Record,
        ctx: &ValidationContext,
    ) -> Result<Vec<FieldIssue>, CoreError> {
        self.registry
            .for_path(path)?
            .invalid_fields(&self.document, path, data, ctx)
    }

    /// Every stored record whose save would be disabled, in document order.
    pub fn invalid_records(&self) -> Result<Vec<RecordIssues>, CoreError> {
        let mut found = Vec::new();
        for definition in self.registry.iter() {
            let spec = definition.spec();
            let path = StorePath::collection(spec.name);
            match spec.shape {
                Shape::Singleton => {
                    if let Some(record) = self.document.singleton(spec.name) {
                        let issues = definition.invalid_fields(
                            &self.document,
                            &path,
                            record,
                            &ValidationContext::creating(),
                        )?;
                        if !issues.is_empty() {
                            found.push(RecordIssues {
                                path: path.to_string(),
                                name: spec.name.to_owned(),
                                issues,
                            });
                        }
                    }
                }
                Shape::List => self.collect_issues(definition, spec, &path, &mut found)?,
            }
        }
        Ok(found)
    }

    fn collect_issues(
        &self,
        definition: &dyn EntityDefinition,
        spec: &'static EntitySpec,
        path: &StorePath,
        found: &mut Vec<RecordIssues>,
    ) -> Result<(), CoreError> {
        let Ok(list) = self.document.list(path) else {
            return Ok(());
        };
        for record in list.iter().filter_map(Value::as_object) {
            let name = record.str_field(spec.key).unwrap_or_default();
            let ctx = ValidationContext::editing(name);
            let issues = definition.invalid_fields(&self.document, path, record, &ctx)?;
            if !issues.is_empty() {
                found.push(RecordIssues {
                    path: path.to_string(),
                    name: name.to_owned(),
                    issues,
                });
            }
            // Children are addressed through the parent's name.
            if let Some(parent) = record.name() {
                for child in spec.children {
                    let child_path = path.clone().child(parent, child.field());
                    self.collect_issues(definition, child.entity, &child_path, found)?;
                }
            }
        }
        Ok(())
    }

    /// Dangling references and duplicate names. Empty for any settled store.
    pub fn audit(&self) -> Vec<Finding> {
        reconcile::audit(&self.document, &self.registry.specs())
    }

    // ── Update cycle ─────────────────────────────────────────────────

    fn settle(&mut self) -> Vec<CollectionRepair> {
        let repairs = self.registry.reconcile(Arc::make_mut(&mut self.document));
        let changed: usize = repairs.iter().map(|r| r.changed).sum();

        self.revision.send_modify(|revision| *revision += 1);
        self.last_update = Some(Utc::now());
        debug!(revision = self.revision(), changed, "store settled");

        if let Some(callback) = self.callback.as_mut() {
            callback();
        }
        repairs
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("revision", &self.revision())
            .field("last_update", &self.last_update)
            .finish_non_exhaustive()
    }
}
