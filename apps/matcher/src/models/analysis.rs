use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::resume::{Resume, ResumeId};

/// One scored category of a match record (e.g. "Skills Match").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCategory {
    pub category: String,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub matched_items: Option<Vec<String>>,
    #[serde(default)]
    pub missing_items: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Free-form insights extracted from a resume. Every field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumeInsights {
    #[serde(default)]
    pub top_skills: Option<Vec<String>>,
    #[serde(default)]
    pub experience_years: Option<f64>,
    #[serde(default, alias = "matched_education")]
    pub education_level: Option<Vec<String>>,
}

/// A single record of the bulk scoring response, as returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub resume_id: ResumeId,
    #[serde(default)]
    pub overall_score: Option<f64>,
    #[serde(default)]
    pub matches: Option<Vec<MatchCategory>>,
    #[serde(default)]
    pub resume_insights: Option<ResumeInsights>,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_date: Option<DateTime<Utc>>,
}

/// A match record joined to the resume it describes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelatedResult {
    pub resume: Resume,
    pub analysis: MatchRecord,
}
