use std::collections::HashSet;

use thiserror::Error;
use tracing::{info, warn};

use crate::models::resume::Resume;
use crate::scoring_client::{ScoringError, ScoringService};

#[derive(Debug, Error)]
#[error("Failed to load resumes: {0}")]
pub struct RegistryError(#[from] pub ScoringError);

/// Loads the current resume collection from the scoring service.
pub struct ResumeRegistry<'a> {
    service: &'a dyn ScoringService,
}

impl<'a> ResumeRegistry<'a> {
    pub fn new(service: &'a dyn ScoringService) -> Self {
        Self { service }
    }

    /// One fetch, no retry. Order is preserved; repeated ids keep their first entry.
    pub async fn load(&self) -> Result<Vec<Resume>, RegistryError> {
        let resumes = self.service.list_resumes().await?;
        let total = resumes.len();

        let mut seen = HashSet::new();
        let unique: Vec<Resume> = resumes
            .into_iter()
            .filter(|r| seen.insert(r.id.clone()))
            .collect();

        if unique.len() != total {
            warn!(
                "Dropped {} resume(s) with duplicate ids from registry load",
                total - unique.len()
            );
        }
        info!("Loaded {} resume(s)", unique.len());
        Ok(unique)
    }
}
