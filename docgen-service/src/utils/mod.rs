pub mod extract;

pub use extract::FormOrJson;
