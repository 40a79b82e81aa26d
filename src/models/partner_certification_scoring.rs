use crate::config::ScoringConfig;
use crate::error::{Error, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub const PIX_EMPLOI_CLEA: &str = "PIX_EMPLOI_CLEA";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerCompetenceMark {
    pub competence_id: String,
    pub score: i32,
}

/// Evaluation of a complementary certification layered on top of the base
/// certification score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerCertificationScoring {
    pub certification_course_id: i64,
    pub partner_key: String,
    pub has_acquired_badge: bool,
    pub is_badge_acquisition_still_valid: bool,
    pub reproducibility_rate: Decimal,
    pub competence_marks: Vec<PartnerCompetenceMark>,
    pub max_reachable_pix_by_competence: HashMap<String, i32>,
}

impl PartnerCertificationScoring {
    pub fn is_eligible(&self) -> bool {
        self.has_acquired_badge && self.is_badge_acquisition_still_valid
    }

    pub fn is_acquired(&self, config: &ScoringConfig) -> Result<bool> {
        if !self.has_acquired_badge {
            return Err(Error::NotEligibleCandidate);
        }

        if self.reproducibility_rate <= config.minimum_reproducibility_rate_to_be_certified {
            return Ok(false);
        }

        if self.reproducibility_rate >= config.minimum_reproducibility_rate_to_be_trusted {
            return Ok(true);
        }

        Ok(self.has_required_pix_value(config.partner_min_percentage))
    }

    fn has_required_pix_value(&self, min_percentage: Decimal) -> bool {
        !self.competence_marks.is_empty()
            && self.competence_marks.iter().all(|mark| {
                match self.max_reachable_pix_by_competence.get(&mark.competence_id) {
                    Some(max) => {
                        Decimal::from(mark.score) * Decimal::ONE_HUNDRED
                            >= Decimal::from(*max) * min_percentage
                    }
                    None => false,
                }
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartnerCertification {
    pub certification_course_id: i64,
    pub partner_key: String,
    pub acquired: bool,
}
