//! service-core: Shared infrastructure for the docgen workspace.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;

pub use axum;
pub use serde;
pub use serde_json;
pub use tokio;
pub use tower;
pub use tower_http;
pub use tracing;
pub use validator;

#[cfg(test)]
mod tests {
    #[test]
    fn test_manifest_has_no_async_trait_dependency() {
        // No async trait is defined in this crate.
        let manifest = include_str!("../Cargo.toml");
        assert!(!manifest.contains("async-trait"));
    }
}
