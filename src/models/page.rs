use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Pagination block of the canonical page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u32,
    pub total_pages: u32,
    pub has_next: bool,
    pub has_previous: bool,
}

/// Response metadata. Passed through from the primary shape, synthesized
/// for the alternate one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMetadata {
    pub timestamp: Option<String>,
    pub version: Option<String>,
    pub request_id: Option<String>,
}

/// The single internal page shape every wire response is converted to.
///
/// Records stay as raw JSON until classification so that entries which are
/// not patient-shaped at all still reach the per-record fallback.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CanonicalPage {
    pub records: Vec<Value>,
    pub pagination: Pagination,
    pub metadata: PageMetadata,
}
