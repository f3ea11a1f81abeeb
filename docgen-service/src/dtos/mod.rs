pub mod documents;

pub use documents::{GenerateDocumentRequest, ValidDocumentRequest};
