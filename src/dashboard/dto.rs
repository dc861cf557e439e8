//! Data Transfer Objects
//!
//! Response types of the Backend API. Every list defaults to empty, whether
//! missing or `null`, so a sparse or partial response still decodes.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// ============================================
// METADATA / PREVIEW
// ============================================

/// GET meta
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Columns usable as a boxplot metric, in display order
    #[serde(default, deserialize_with = "null_as_empty")]
    pub numeric_columns: Vec<String>,
    /// Columns usable for grouping, in display order
    #[serde(default, deserialize_with = "null_as_empty")]
    pub group_columns: Vec<String>,
    #[serde(default)]
    pub row_count: Option<u64>,
}

/// GET preview
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Preview {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub columns: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub rows: Vec<Map<String, Value>>,
}

// ============================================
// UPLOAD / RESET
// ============================================

/// POST upload and POST reset on success
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordCount {
    #[serde(default)]
    pub total_records: Option<u64>,
}

/// Error body sent with non-2xx replies
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}

// ============================================
// VISUALIZATIONS
// ============================================

/// Parameters of GET boxplot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoxplotQuery {
    pub metric: String,
    pub group_by: String,
    pub max_groups: u32,
}

impl BoxplotQuery {
    /// `metric=..&group_by=..&max_groups=..`, percent-encoded
    pub fn to_query_string(&self) -> String {
        format!(
            "metric={}&group_by={}&max_groups={}",
            urlencoding::encode(&self.metric),
            urlencoding::encode(&self.group_by),
            self.max_groups
        )
    }
}

/// GET boxplot. `values[i]` belongs to `groups[i]`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoxplotData {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub groups: Vec<String>,
    /// Raw values; non-numeric entries are kept for the chart
    #[serde(default, deserialize_with = "null_as_empty")]
    pub values: Vec<Vec<Value>>,
}

/// GET correlation. `labels` index both axes of `matrix`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CorrelationData {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub labels: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub matrix: Vec<Vec<Option<f64>>>,
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
