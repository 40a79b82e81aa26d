use crate::models::certification_assessment_score::ScoredCompetence;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetenceMark {
    pub id: Option<i64>,
    pub assessment_result_id: i64,
    pub competence_id: String,
    pub area_code: String,
    pub level: i32,
    pub score: i32,
}

impl CompetenceMark {
    pub fn from_scored(assessment_result_id: i64, scored: &ScoredCompetence) -> Self {
        Self {
            id: None,
            assessment_result_id,
            competence_id: scored.competence_id.clone(),
            area_code: scored.area_code.clone(),
            level: scored.level,
            score: scored.score,
        }
    }
}
