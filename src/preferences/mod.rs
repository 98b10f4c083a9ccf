//! Preference records and their JSON-file store

mod record;
mod store;

pub use record::{current_timestamp, Preference, PreferenceSource};
pub use store::{check, PreferenceStore, StoreError, StoreReport, DEFAULT_PREFERENCES_FILE};
