//! Data models for Compilatio.

mod discovery;
mod manuscript;
mod repository;

pub use discovery::DiscoveryStub;
pub use manuscript::{Manuscript, ManuscriptRecord};
pub use repository::RepositoryInfo;
