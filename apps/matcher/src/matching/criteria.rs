use serde::Serialize;

use crate::models::criteria::{AnalyzeForm, Criteria, CriteriaField};

/// Holds the mutable criteria form. Updates never validate; validation happens
/// once, at submission, through `is_submittable`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct CriteriaBuilder {
    criteria: Criteria,
}

impl CriteriaBuilder {
    pub fn new(criteria: Criteria) -> Self {
        Self { criteria }
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn update(&mut self, field: CriteriaField, value: String) {
        let slot = match field {
            CriteriaField::JobTitle => &mut self.criteria.job_title,
            CriteriaField::JobDescription => &mut self.criteria.job_description,
            CriteriaField::Skills => &mut self.criteria.skills,
            CriteriaField::Experience => &mut self.criteria.experience,
            CriteriaField::Education => &mut self.criteria.education,
            CriteriaField::Company => &mut self.criteria.company,
        };
        *slot = value;
    }
}

/// The sole precondition for submitting an analysis.
pub fn is_submittable(criteria: &Criteria, resume_count: usize) -> bool {
    !criteria.job_title.trim().is_empty()
        && !criteria.job_description.trim().is_empty()
        && resume_count > 0
}

/// Encodes criteria into the outbound form. `company` is dropped when empty.
pub fn to_analyze_form(criteria: &Criteria) -> AnalyzeForm {
    AnalyzeForm {
        job_title: criteria.job_title.clone(),
        job_description: criteria.job_description.clone(),
        required_skills: criteria.skills.clone(),
        experience: criteria.experience.clone(),
        education: criteria.education.clone(),
        company: Some(criteria.company.clone()).filter(|c| !c.is_empty()),
    }
}
