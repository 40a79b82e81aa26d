use crate::config::ScoringConfig;
use crate::error::Result;
use crate::models::certification_assessment_score::CertificationAssessmentScore;
use crate::models::partner_certification_scoring::{
    PartnerCertification, PartnerCertificationScoring, PartnerCompetenceMark, PIX_EMPLOI_CLEA,
};
use crate::repositories::{BadgeAcquisitionRepository, PartnerCertificationRepository, PartnerCompetenceRepository};
use std::sync::Arc;
use tracing::{debug, info};

/// Scores the complementary certifications attached to a base certification.
#[derive(Clone)]
pub struct PartnerCertificationService {
    badge_acquisition_repository: Arc<dyn BadgeAcquisitionRepository>,
    partner_competence_repository: Arc<dyn PartnerCompetenceRepository>,
    partner_certification_repository: Arc<dyn PartnerCertificationRepository>,
    config: ScoringConfig,
}

impl PartnerCertificationService {
    pub fn new(
        badge_acquisition_repository: Arc<dyn BadgeAcquisitionRepository>,
        partner_competence_repository: Arc<dyn PartnerCompetenceRepository>,
        partner_certification_repository: Arc<dyn PartnerCertificationRepository>,
        config: ScoringConfig,
    ) -> Self {
        Self {
            badge_acquisition_repository,
            partner_competence_repository,
            partner_certification_repository,
            config,
        }
    }

    /// Returns `None` when the candidate holds no valid badge for the partner.
    pub async fn score(
        &self,
        certification_course_id: i64,
        user_id: i64,
        score: &CertificationAssessmentScore,
    ) -> Result<Option<PartnerCertification>> {
        let badge = self
            .badge_acquisition_repository
            .find_badge_acquisition(user_id, PIX_EMPLOI_CLEA)
            .await?;

        let scoring = PartnerCertificationScoring {
            certification_course_id,
            partner_key: PIX_EMPLOI_CLEA.to_string(),
            has_acquired_badge: badge.is_some(),
            is_badge_acquisition_still_valid: badge.as_ref().map_or(false, |b| b.is_still_valid),
            reproducibility_rate: score.reproducibility_rate(),
            competence_marks: Vec::new(),
            max_reachable_pix_by_competence: Default::default(),
        };
        if !scoring.is_eligible() {
            debug!(certification_course_id, user_id, partner_key = PIX_EMPLOI_CLEA, "Candidate not eligible");
            return Ok(None);
        }

        let max_reachable_pix_by_competence = self
            .partner_competence_repository
            .max_reachable_pix_by_competence(PIX_EMPLOI_CLEA)
            .await?;
        let competence_marks = score
            .competence_marks
            .iter()
            .filter(|mark| max_reachable_pix_by_competence.contains_key(&mark.competence_id))
            .map(|mark| PartnerCompetenceMark {
                competence_id: mark.competence_id.clone(),
                score: mark.score,
            })
            .collect();
        let scoring = PartnerCertificationScoring {
            competence_marks,
            max_reachable_pix_by_competence,
            ..scoring
        };

        let certification = PartnerCertification {
            certification_course_id,
            partner_key: scoring.partner_key.clone(),
            acquired: scoring.is_acquired(&self.config)?,
        };
        self.partner_certification_repository.save(&certification).await?;

        info!(
            certification_course_id,
            partner_key = %certification.partner_key,
            acquired = certification.acquired,
            "Partner certification scored"
        );
        Ok(Some(certification))
    }
}
