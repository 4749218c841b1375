use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub language_code: Option<String>,
    #[serde(default)]
    pub search_result: SearchResult,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SearchResult {
    pub search_result_count: usize,
    pub search_result_count_all: usize,
    pub search_result_items: Vec<SearchItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SearchItem {
    pub matched_object_id: Option<String>,
    pub matched_object_descriptor: Descriptor,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Descriptor {
    #[serde(rename = "PositionID")]
    pub position_id: String,
    pub position_title: String,
    #[serde(rename = "PositionURI")]
    pub position_uri: String,
    #[serde(rename = "ApplyURI")]
    pub apply_uri: Vec<String>,
    pub position_location_display: PositionLocations,
    pub organization_name: String,
    pub department_name: Option<String>,
    pub position_remuneration: Vec<Remuneration>,
    /// RFC 3339 without offset, e.g. `2024-05-01T00:00:00.0000`.
    pub publication_start_date: Option<String>,
    pub user_area: UserArea,
}

/// The API returns either a single display string or a list of them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PositionLocations {
    One(String),
    Many(Vec<String>),
}

impl Default for PositionLocations {
    fn default() -> Self {
        PositionLocations::Many(Vec::new())
    }
}

impl PositionLocations {
    pub fn entries(&self) -> Vec<&str> {
        match self {
            PositionLocations::One(one) => vec![one.as_str()],
            PositionLocations::Many(many) => many.iter().map(String::as_str).collect(),
        }
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Remuneration {
    pub minimum_range: String,
    pub maximum_range: String,
    pub rate_interval_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UserArea {
    pub details: Details,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Details {
    pub job_summary: String,
}
