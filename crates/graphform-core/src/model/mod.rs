// ── Document model ──

pub mod context;
pub mod document;
pub mod path;
pub mod record;

pub use context::{CreateContext, DeleteContext, FormContext, SaveContext, ValidationContext};
pub use document::{Document, NAME};
pub use path::StorePath;
pub use record::{Record, RecordExt, is_blank_value};
