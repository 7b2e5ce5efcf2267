pub mod payload;
pub mod record;

pub use payload::{DocumentPayload, InteractionPayload, RemotePayload};
pub use record::{Outcome, Record, RecordKind, normalize_tag};
