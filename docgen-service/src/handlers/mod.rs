pub mod documents;
pub mod health;
pub mod home;

pub use documents::generate_document;
pub use health::{health_check, metrics_endpoint, readiness_check};
pub use home::index;
