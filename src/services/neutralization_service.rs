use crate::error::Result;
use crate::models::certification_assessment::CertificationAssessment;
use crate::models::certification_issue_report::CertificationIssueReport;
use crate::models::events::{ChallengeNeutralizationChanged, NeutralizationDecision};
use crate::repositories::CertificationAssessmentRepository;
use std::sync::Arc;
use tracing::info;

/// Neutralizes the challenges targeted by auto-neutralizable issue reports when
/// the candidate answered them KO or skipped them. Returns the question
/// numbers that ended up neutralized.
pub fn auto_neutralize(
    issue_reports: &[CertificationIssueReport],
    assessment: &mut CertificationAssessment,
) -> Vec<u32> {
    let mut neutralized = Vec::new();
    for question_number in issue_reports
        .iter()
        .filter(|r| r.is_auto_neutralizable)
        .filter_map(|r| r.question_number)
    {
        if assessment.neutralize_challenge_by_number_if_ko_or_skipped(question_number) {
            neutralized.push(question_number);
        }
    }
    neutralized
}

/// Manual neutralization decisions taken by a certification officer.
#[derive(Clone)]
pub struct NeutralizationService {
    certification_assessment_repository: Arc<dyn CertificationAssessmentRepository>,
}

impl NeutralizationService {
    pub fn new(certification_assessment_repository: Arc<dyn CertificationAssessmentRepository>) -> Self {
        Self {
            certification_assessment_repository,
        }
    }

    pub async fn neutralize_challenge(
        &self,
        certification_course_id: i64,
        challenge_id: &str,
        jury_id: Option<i64>,
    ) -> Result<ChallengeNeutralizationChanged> {
        let mut assessment = self
            .certification_assessment_repository
            .get_by_certification_course_id(certification_course_id)
            .await?;
        assessment.neutralize_challenge_by_challenge_id(challenge_id)?;
        self.certification_assessment_repository.save(&assessment).await?;

        info!(certification_course_id, challenge_id, ?jury_id, "Challenge neutralized");
        Ok(ChallengeNeutralizationChanged {
            certification_course_id,
            challenge_id: challenge_id.to_string(),
            decision: NeutralizationDecision::Neutralized,
            jury_id,
        })
    }

    pub async fn deneutralize_challenge(
        &self,
        certification_course_id: i64,
        challenge_id: &str,
        jury_id: Option<i64>,
    ) -> Result<ChallengeNeutralizationChanged> {
        let mut assessment = self
            .certification_assessment_repository
            .get_by_certification_course_id(certification_course_id)
            .await?;
        assessment.deneutralize_challenge_by_challenge_id(challenge_id)?;
        self.certification_assessment_repository.save(&assessment).await?;

        info!(certification_course_id, challenge_id, ?jury_id, "Challenge deneutralized");
        Ok(ChallengeNeutralizationChanged {
            certification_course_id,
            challenge_id: challenge_id.to_string(),
            decision: NeutralizationDecision::Deneutralized,
            jury_id,
        })
    }
}
