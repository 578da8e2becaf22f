//! Turns a correlated result into the fully defaulted
//! view-model the report page renders.
//!
//! Pure and deterministic: equal input always produces an equal view-model.

use serde::Serialize;

use crate::matching::classifier::ScoreView;
use crate::models::analysis::{CorrelatedResult, MatchCategory};
use crate::models::resume::Resume;

pub const TOP_CATEGORY_COUNT: usize = 3;

/// How `top_categories` picks its entries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CategoryOrder {
    /// First entries as the service sent them; assumes the service ranks by relevance.
    #[default]
    Received,
    /// Highest scores first; ties keep received order.
    ScoreDescending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySummary {
    pub category: String,
    pub score: ScoreView,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub category: String,
    pub score: ScoreView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Absent rather than empty when nothing matched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightsView {
    pub top_skills: Vec<String>,
    pub experience_years: f64,
    pub education_level: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultViewModel {
    pub resume: Resume,
    pub overall_score: ScoreView,
    pub top_categories: Vec<CategorySummary>,
    pub full_breakdown: Vec<CategoryBreakdown>,
    pub insights: InsightsView,
    pub suggestions: Vec<String>,
}

pub fn build_view_model(result: &CorrelatedResult, order: CategoryOrder) -> ResultViewModel {
    let analysis = &result.analysis;
    let matches: &[MatchCategory] = analysis.matches.as_deref().unwrap_or_default();
    let insights = analysis.resume_insights.clone().unwrap_or_default();

    ResultViewModel {
        resume: result.resume.clone(),
        overall_score: ScoreView::new(analysis.overall_score),
        top_categories: top_categories(matches, order),
        full_breakdown: matches.iter().map(breakdown).collect(),
        insights: InsightsView {
            top_skills: insights.top_skills.unwrap_or_default(),
            experience_years: insights
                .experience_years
                .filter(|years| years.is_finite())
                .unwrap_or(0.0),
            education_level: insights.education_level.unwrap_or_default(),
        },
        suggestions: analysis.suggestions.clone().unwrap_or_default(),
    }
}

fn top_categories(matches: &[MatchCategory], order: CategoryOrder) -> Vec<CategorySummary> {
    let summaries = matches.iter().map(|m| CategorySummary {
        category: m.category.clone(),
        score: ScoreView::new(m.score),
    });

    match order {
        CategoryOrder::Received => summaries.take(TOP_CATEGORY_COUNT).collect(),
        CategoryOrder::ScoreDescending => {
            let mut all: Vec<_> = summaries.collect();
            // stable: equal scores keep received order
            all.sort_by(|a, b| b.score.value.total_cmp(&a.score.value));
            all.truncate(TOP_CATEGORY_COUNT);
            all
        }
    }
}

fn breakdown(category: &MatchCategory) -> CategoryBreakdown {
    CategoryBreakdown {
        category: category.category.clone(),
        score: ScoreView::new(category.score),
        details: category.details.clone(),
        matched: non_empty(&category.matched_items),
        missing: non_empty(&category.missing_items),
    }
}

fn non_empty(items: &Option<Vec<String>>) -> Option<Vec<String>> {
    items.as_ref().filter(|items| !items.is_empty()).cloned()
}
