use serde::{Deserialize, Serialize};

/// Job-description criteria as edited in the form. Ephemeral, never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Criteria {
    pub job_title: String,
    pub job_description: String,
    pub skills: String,
    pub experience: String,
    pub education: String,
    pub company: String,
}

/// Addressable form fields, named as the form names them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CriteriaField {
    JobTitle,
    JobDescription,
    Skills,
    Experience,
    Education,
    Company,
}

/// The outbound `/analyze-all/` form, field names as the service expects them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzeForm {
    pub job_title: String,
    pub job_description: String,
    pub required_skills: String,
    pub experience: String,
    pub education: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<String>,
}

impl AnalyzeForm {
    /// Multipart text fields in submission order. `company` is only present when non-empty.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        let mut fields = vec![
            ("job_title", self.job_title.as_str()),
            ("job_description", self.job_description.as_str()),
            ("required_skills", self.required_skills.as_str()),
            ("experience", self.experience.as_str()),
            ("education", self.education.as_str()),
        ];
        if let Some(company) = &self.company {
            fields.push(("company", company.as_str()));
        }
        fields
    }
}
