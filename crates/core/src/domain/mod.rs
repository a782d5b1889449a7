// Domain Layer - Pure business logic and entities

pub mod error;
pub mod experience;
pub mod normalizer;
pub mod posting;
pub mod source;

// Re-exports
pub use error::DomainError;
pub use experience::ExperienceLevel;
pub use posting::{JobPosting, RawPosting, Requirement, StringOrList};
pub use source::{PublicationWindow, SourceKind};
