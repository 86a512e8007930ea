pub mod drafts;
pub mod error;

pub use drafts::{Draft, DraftKey, DraftStore, FormMode};
pub use error::{Result, StoreError};
