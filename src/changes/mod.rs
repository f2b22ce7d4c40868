pub mod differ;
pub mod schema;

pub use differ::diff_snapshots;
pub use schema::{Changeset, FieldChange, FieldValue, TrackedField};
