#![allow(dead_code)]

//! Joins raw match records back to the resumes they describe.

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use tracing::warn;

use crate::models::analysis::{CorrelatedResult, MatchRecord};
use crate::models::resume::{Resume, ResumeId};

/// Non-fatal signal that some records referenced unknown resumes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrphanWarning {
    pub orphan_count: usize,
    pub orphan_ids: Vec<ResumeId>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Correlation {
    /// Same relative order as the input records.
    pub results: Vec<CorrelatedResult>,
    pub orphans: Vec<ResumeId>,
}

impl Correlation {
    pub fn orphan_count(&self) -> usize {
        self.orphans.len()
    }

    pub fn warning(&self) -> Option<OrphanWarning> {
        (!self.orphans.is_empty()).then(|| OrphanWarning {
            orphan_count: self.orphans.len(),
            orphan_ids: self.orphans.clone(),
        })
    }
}

/// Total over any input: never fails, never emits a result without its resume.
///
/// A resume id appearing in more than one record yields only its first record;
/// later ones are counted as orphans.
pub fn correlate(records: Vec<MatchRecord>, resumes: &[Resume]) -> Correlation {
    let by_id: HashMap<&ResumeId, &Resume> = resumes.iter().map(|r| (&r.id, r)).collect();
    let mut emitted = HashSet::new();
    let mut correlation = Correlation::default();

    for record in records {
        match by_id.get(&record.resume_id) {
            Some(resume) if emitted.insert(record.resume_id.clone()) => {
                correlation.results.push(CorrelatedResult {
                    resume: (*resume).clone(),
                    analysis: record,
                });
            }
            _ => correlation.orphans.push(record.resume_id),
        }
    }

    if !correlation.orphans.is_empty() {
        warn!(
            "Dropped {} match record(s) that did not resolve to a known resume",
            correlation.orphans.len()
        );
    }

    correlation
}
