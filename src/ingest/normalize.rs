//! Wire-response normalization.
//!
//! The patient API answers in one of two shapes and gives no version tag:
//!
//! - primary: `{ data: [...], pagination: { page, limit, total, totalPages, hasNext?, hasPrevious? }, metadata? }`
//! - alternate: `{ patients: [...], current_page, per_page, total_records }`
//!
//! Shapes are told apart structurally, primary first, and converted at once
//! to [`CanonicalPage`]. Nothing downstream sees the wire shapes.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use uuid::Uuid;

use super::error::FetchError;
use crate::models::{CanonicalPage, PageMetadata, Pagination};

/// Version stamped on metadata synthesized for alternate-shape responses.
const SYNTHESIZED_VERSION: &str = "v1.0";

#[derive(Debug, Deserialize)]
struct PrimaryPagination {
    #[serde(deserialize_with = "whole_number")]
    page: u32,
    #[serde(deserialize_with = "whole_number")]
    limit: u32,
    #[serde(deserialize_with = "whole_number")]
    total: u32,
    #[serde(rename = "totalPages", deserialize_with = "whole_number")]
    total_pages: u32,
    #[serde(rename = "hasNext", default)]
    has_next: Value,
    #[serde(rename = "hasPrevious", default)]
    has_previous: Value,
}

#[derive(Debug, Deserialize)]
struct PrimaryResponse {
    data: Vec<Value>,
    pagination: PrimaryPagination,
    #[serde(default)]
    metadata: Value,
}

#[derive(Debug, Deserialize)]
struct AlternateResponse {
    patients: Vec<Value>,
    #[serde(deserialize_with = "whole_number")]
    current_page: u32,
    #[serde(deserialize_with = "whole_number")]
    per_page: u32,
    #[serde(deserialize_with = "whole_number")]
    total_records: u32,
}

/// The two accepted response shapes. Variant order is detection order.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum WireResponse {
    Primary(PrimaryResponse),
    Alternate(AlternateResponse),
}

/// Decode a response body and normalize it.
pub fn parse_body(body: &str) -> Result<CanonicalPage, FetchError> {
    let value: Value =
        serde_json::from_str(body).map_err(|e| FetchError::MalformedJson(e.to_string()))?;
    normalize(&value)
}

/// Normalize an already-decoded response.
pub fn normalize(value: &Value) -> Result<CanonicalPage, FetchError> {
    let wire = WireResponse::deserialize(value).map_err(|_| {
        FetchError::InvalidResponseShape(
            "body matches neither the data+pagination nor the patients+current_page shape".into(),
        )
    })?;

    match wire {
        WireResponse::Primary(r) => {
            tracing::debug!("Detected data+pagination response shape");
            Ok(from_primary(r))
        }
        WireResponse::Alternate(r) => {
            tracing::debug!("Detected patients+current_page response shape");
            from_alternate(r)
        }
    }
}

/// `totalPages` is trusted as sent, even when it disagrees with
/// `ceil(total / limit)`.
fn from_primary(r: PrimaryResponse) -> CanonicalPage {
    let p = r.pagination;
    let has_next = p.has_next.as_bool().unwrap_or(p.page < p.total_pages);
    let has_previous = p.has_previous.as_bool().unwrap_or(p.page > 1);

    CanonicalPage {
        records: r.data,
        pagination: Pagination {
            page: p.page,
            limit: p.limit,
            total: p.total,
            total_pages: p.total_pages,
            has_next,
            has_previous,
        },
        metadata: PageMetadata {
            timestamp: text_field(&r.metadata, "timestamp"),
            version: text_field(&r.metadata, "version"),
            request_id: text_field(&r.metadata, "requestId"),
        },
    }
}

fn from_alternate(r: AlternateResponse) -> Result<CanonicalPage, FetchError> {
    if r.per_page == 0 {
        return Err(FetchError::InvalidResponseShape(
            "per_page must be positive".into(),
        ));
    }
    let total_pages = r.total_records.div_ceil(r.per_page);

    Ok(CanonicalPage {
        records: r.patients,
        pagination: Pagination {
            page: r.current_page,
            limit: r.per_page,
            total: r.total_records,
            total_pages,
            has_next: r.current_page < total_pages,
            has_previous: r.current_page > 1,
        },
        metadata: PageMetadata {
            timestamp: Some(chrono::Utc::now().to_rfc3339()),
            version: Some(SYNTHESIZED_VERSION.into()),
            request_id: Some(Uuid::new_v4().simple().to_string()),
        },
    })
}

/// Any JSON number that is a finite, non-negative whole value fitting in
/// `u32`, so `50` and `50.0` read the same.
fn whole_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let n = f64::deserialize(deserializer)?;
    if n.is_finite() && n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX) {
        Ok(n as u32)
    } else {
        Err(serde::de::Error::custom(format!(
            "expected a non-negative whole number, got {n}"
        )))
    }
}

fn text_field(metadata: &Value, key: &str) -> Option<String> {
    metadata.get(key).and_then(Value::as_str).map(str::to_string)
}
