use crate::models::assessment_result::AssessmentResultStatus;
use crate::models::certified_level::CertifiedLevel;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCompetence {
    pub competence_id: String,
    pub area_code: String,
    pub number_of_challenges_answered: usize,
    pub number_of_correct_answers: usize,
    pub reproducibility_rate: Decimal,
    pub estimated_level: i32,
    pub certified_level: CertifiedLevel,
    pub level: i32,
    pub score: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationAssessmentScore {
    pub competence_marks: Vec<ScoredCompetence>,
    pub percentage_correct_answers: Decimal,
    pub nb_pix: i32,
    pub status: AssessmentResultStatus,
}

impl CertificationAssessmentScore {
    pub fn reproducibility_rate(&self) -> Decimal {
        self.percentage_correct_answers
    }

    pub fn competence_mark(&self, competence_id: &str) -> Option<&ScoredCompetence> {
        self.competence_marks
            .iter()
            .find(|m| m.competence_id == competence_id)
    }

    pub fn is_validated(&self) -> bool {
        self.status == AssessmentResultStatus::Validated
    }
}
