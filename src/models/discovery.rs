//! Discovery stubs produced by the enumeration phase.

use serde::{Deserialize, Serialize};

/// One identified-but-not-yet-imported candidate manuscript.
///
/// Stubs are ephemeral: cached as a flat JSON array next to the checkpoint
/// file, never written to the relational store. The hint fields serve as
/// fallbacks when the manifest fetch fails or omits a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryStub {
    /// Natural identifier within the source (druid, ARK, manifest URL...).
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shelfmark: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manifest_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
}

impl DiscoveryStub {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }
}
