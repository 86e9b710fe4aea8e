pub mod connectors;
pub mod metadata;
pub mod schema;
pub mod session;
