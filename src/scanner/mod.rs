mod document;
mod extract;

pub use document::ConfigDocument;
pub(crate) use document::scalar_str;
pub use extract::{scan_document, DocumentScan, JobEnvironment, Orb, OrbVersion, Parameter};
