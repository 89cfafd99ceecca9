//! In-memory archive model and interchange format

mod format;
mod model;

pub use format::FORMAT_VERSION;
pub use model::{Archive, Body, BodyEncoding, Entry, Header, RecordedRequest, RecordedResponse};
