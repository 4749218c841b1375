use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    #[serde(default)]
    pub results: Vec<ReedJob>,
    #[serde(default)]
    pub total_results: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReedJob {
    pub job_id: u64,
    pub employer_id: Option<u64>,
    pub employer_name: String,
    pub job_title: String,
    pub location_name: String,
    pub minimum_salary: Option<f64>,
    pub maximum_salary: Option<f64>,
    pub currency: Option<String>,
    pub expiration_date: Option<String>,
    /// `dd/mm/yyyy`
    pub date: Option<String>,
    pub job_description: String,
    pub job_url: String,
    pub applications: Option<u32>,
}
