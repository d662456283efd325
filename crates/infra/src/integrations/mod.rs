//! External service integrations

pub mod source_ap;
pub mod target_crm;

pub use source_ap::SourceApClient;
pub use target_crm::TargetCrmClient;
