pub mod actions;
pub mod manager;
pub mod naming;

pub use naming::AuditTarget;
