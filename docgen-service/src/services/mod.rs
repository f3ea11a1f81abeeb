pub mod generator;
pub mod metrics;
pub mod storage;

pub use generator::{GeneratedDocument, DOCX_CONTENT_TYPE};
pub use metrics::{get_metrics, init_metrics};
pub use storage::{LocalStorage, MemoryStorage, Storage};
