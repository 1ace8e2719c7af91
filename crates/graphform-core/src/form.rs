// ── Form sessions ──
//
// A draft record being edited against a store. Setting a field runs its
// `on_state_change` hook so companion fields follow; every query runs the
// field schema against the draft. Nothing touches the store until commit.

use serde_json::Value;
use tracing::debug;

use crate::entity::{EntitySpec, Shape};
use crate::error::CoreError;
use crate::model::{CreateContext, FormContext, Record, SaveContext, StorePath, ValidationContext};
use crate::schema::{self, FieldIssue, FieldSpec};
use crate::store::ConfigStore;

#[derive(Debug, Clone)]
pub struct FormSession {
    path: StorePath,
    spec: &'static EntitySpec,
    /// Key of the record when the session opened; `None` while creating.
    original_name: Option<String>,
    draft: Record,
}

impl FormSession {
    /// Start a new record at `path`, pre-filled with field defaults.
    pub fn create(store: &ConfigStore, path: StorePath) -> Result<Self, CoreError> {
        let spec = store.spec_for(&path)?;
        if spec.shape == Shape::Singleton {
            return Err(CoreError::Unsupported {
                operation: "create".into(),
                collection: path.root().to_owned(),
            });
        }
        Ok(Self {
            path,
            spec,
            original_name: None,
            draft: schema::defaults(spec.fields),
        })
    }

    /// Open the stored record `name` at `path`. Singletons ignore `name`.
    pub fn edit(store: &ConfigStore, path: StorePath, name: &str) -> Result<Self, CoreError> {
        let spec = store.spec_for(&path)?;
        let draft = store.record(&path, name)?.clone();
        Ok(Self {
            path,
            spec,
            original_name: Some(name.to_owned()),
            draft,
        })
    }

    pub fn path(&self) -> &StorePath {
        &self.path
    }

    pub fn draft(&self) -> &Record {
        &self.draft
    }

    pub fn original_name(&self) -> Option<&str> {
        self.original_name.as_deref()
    }

    pub fn is_creating(&self) -> bool {
        self.original_name.is_none()
    }

    /// Set one field and run its state-change hook.
    pub fn set(&mut self, store: &ConfigStore, field: &str, value: Value) -> Result<(), CoreError> {
        let spec = self.field(field)?;
        self.draft.insert(field.to_owned(), value.clone());

        if let Some(hook) = spec.on_state_change {
            let document = store.document();
            let parent = document.parent_of(&self.path)?;
            let ctx = FormContext::new(document, &self.path)
                .editing(self.original_name.as_deref())
                .with_parent(parent);
            hook(&mut self.draft, &ctx, &value);
            debug!(path = %self.path, field, "ran state-change hook");
        }
        Ok(())
    }

    pub fn is_hidden(&self, store: &ConfigStore, field: &str) -> Result<bool, CoreError> {
        let spec = self.field(field)?;
        self.with_context(store, |ctx| spec.is_hidden(&self.draft, ctx))
    }

    /// Options offered for a select field.
    pub fn groups(&self, store: &ConfigStore, field: &str) -> Result<Vec<String>, CoreError> {
        let spec = self.field(field)?;
        self.with_context(store, |ctx| spec.groups_for(&self.draft, ctx))
    }

    pub fn invalid_fields(&self, store: &ConfigStore) -> Result<Vec<FieldIssue>, CoreError> {
        store.invalid_fields(&self.path, &self.draft, &self.validation())
    }

    pub fn should_disable_save(&self, store: &ConfigStore) -> Result<bool, CoreError> {
        store.should_disable_save(&self.path, &self.draft, &self.validation())
    }

    /// Write the draft through `create` or `save`.
    pub fn commit(self, store: &mut ConfigStore) -> Result<(), CoreError> {
        match self.original_name {
            None => store.create(&self.path, self.draft, &CreateContext::default()),
            Some(original) => store.save(&self.path, self.draft, &SaveContext::new(original)),
        }
    }

    fn field(&self, name: &str) -> Result<&'static FieldSpec, CoreError> {
        self.spec.field(name).ok_or_else(|| CoreError::UnknownField {
            entity: self.spec.name.to_owned(),
            field: name.to_owned(),
        })
    }

    fn validation(&self) -> ValidationContext {
        ValidationContext {
            original_name: self.original_name.clone(),
        }
    }

    fn with_context<T>(
        &self,
        store: &ConfigStore,
        query: impl FnOnce(&FormContext<'_>) -> T,
    ) -> Result<T, CoreError> {
        let document = store.document();
        let parent = document.parent_of(&self.path)?;
        let ctx = FormContext::new(document, &self.path)
            .editing(self.original_name.as_deref())
            .with_parent(parent);
        Ok(query(&ctx))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::entity::{OPTIONS, SSH_KEYS, VPCS, VSI};
    use crate::model::RecordExt;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn store_with_vpc() -> ConfigStore {
        let mut store = ConfigStore::default();
        let mut form = FormSession::create(&store, StorePath::collection(VPCS)).unwrap();
        form.set(&store, "name", json!("management")).unwrap();
        form.set(&store, "resource_group", json!("management-rg")).unwrap();
        form.commit(&mut store).unwrap();
        store
    }

    #[test]
    fn changing_vpc_clears_scoped_fields() {
        let store = store_with_vpc();
        let mut form = FormSession::create(&store, StorePath::collection(VSI)).unwrap();
        form.set(&store, "subnets", json!(["a", "b"])).unwrap();
        form.set(&store, "vpc", json!("management")).unwrap();
        assert_eq!(form.draft()["subnets"], json!([]));
        assert_eq!(form.groups(&store, "vpc").unwrap(), ["management"]);
    }

    #[test]
    fn use_data_toggle_marks_public_key() {
        let store = ConfigStore::default();
        let mut form = FormSession::create(&store, StorePath::collection(SSH_KEYS)).unwrap();
        form.set(&store, "use_data", json!(true)).unwrap();
        assert_eq!(form.draft().str_field("public_key"), Some("NONE"));
        assert!(form.is_hidden(&store, "public_key").unwrap());
    }

    #[test]
    fn edit_session_saves_by_original_name() {
        let mut store = store_with_vpc();
        let mut form = FormSession::edit(&store, StorePath::collection(VPCS), "management").unwrap();
        form.set(&store, "name", json!("edge")).unwrap();
        assert!(!form.should_disable_save(&store).unwrap());
        form.commit(&mut store).unwrap();
        assert_eq!(store.document().names(VPCS), ["edge"]);
    }

    #[test]
    fn unknown_fields_and_singleton_creates_are_refused() {
        let store = ConfigStore::default();
        let mut form = FormSession::edit(&store, StorePath::collection(OPTIONS), OPTIONS).unwrap();
        let err = form.set(&store, "colour", json!("red")).unwrap_err();
        assert!(matches!(err, CoreError::UnknownField { .. }));

        let err = FormSession::create(&store, StorePath::collection(OPTIONS)).unwrap_err();
        assert!(matches!(err, CoreError::Unsupported { .. }));
    }
}
