use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentResultStatus {
    Validated,
    Rejected,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentResult {
    pub id: i64,
    pub assessment_id: i64,
    pub pix_score: i32,
    pub status: AssessmentResultStatus,
    pub emitter: String,
    pub jury_id: Option<i64>,
    pub comment_for_jury: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An assessment result that has not been appended to the history yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAssessmentResult {
    pub assessment_id: i64,
    pub pix_score: i32,
    pub status: AssessmentResultStatus,
    pub emitter: String,
    pub jury_id: Option<i64>,
    pub comment_for_jury: Option<String>,
}

impl NewAssessmentResult {
    pub fn standard(
        assessment_id: i64,
        pix_score: i32,
        status: AssessmentResultStatus,
        emitter: &str,
        jury_id: Option<i64>,
    ) -> Self {
        Self {
            assessment_id,
            pix_score,
            status,
            emitter: emitter.to_string(),
            jury_id,
            comment_for_jury: None,
        }
    }

    pub fn algo_error(assessment_id: i64, error: &str, emitter: &str, jury_id: Option<i64>) -> Self {
        Self {
            assessment_id,
            pix_score: 0,
            status: AssessmentResultStatus::Error,
            emitter: emitter.to_string(),
            jury_id,
            comment_for_jury: Some(error.to_string()),
        }
    }
}

/// Append-only log of the results produced for one assessment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AssessmentResultHistory {
    results: Vec<AssessmentResult>,
}

impl AssessmentResultHistory {
    pub fn new(mut results: Vec<AssessmentResult>) -> Self {
        results.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Self { results }
    }

    /// The result in force: the most recently created one.
    pub fn latest(&self) -> Option<&AssessmentResult> {
        self.results.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AssessmentResult> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
