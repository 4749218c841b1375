use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    pub status: String,
    pub request_id: Option<String>,
    pub data: Vec<JSearchJob>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct JSearchJob {
    pub job_id: String,
    pub employer_name: String,
    pub employer_website: Option<String>,
    pub job_publisher: Option<String>,
    pub job_employment_type: Option<String>,
    pub job_title: String,
    pub job_apply_link: String,
    pub job_description: String,
    pub job_is_remote: bool,
    pub job_posted_at_datetime_utc: Option<String>,
    pub job_city: Option<String>,
    pub job_state: Option<String>,
    pub job_country: Option<String>,
    pub job_min_salary: Option<f64>,
    pub job_max_salary: Option<f64>,
    pub job_salary_currency: Option<String>,
    pub job_salary_period: Option<String>,
}
