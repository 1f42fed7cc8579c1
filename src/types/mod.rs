//! Public types for the Vordr API.

mod request;
mod snapshot;

pub use request::{Request, RequestKey, RequestMode};
pub use snapshot::{ResponseKind, SERVICE_UNAVAILABLE_BODY, Snapshot, StoredSnapshot};
