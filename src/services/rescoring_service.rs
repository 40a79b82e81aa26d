use crate::error::{Error, Result};
use crate::models::assessment_result::{AssessmentResult, NewAssessmentResult};
use crate::models::certification_assessment::CertificationAssessment;
use crate::models::certification_assessment_score::CertificationAssessmentScore;
use crate::models::competence_mark::CompetenceMark;
use crate::models::events::{CertificationRescoringCompleted, ChallengeNeutralizationChanged};
use crate::repositories::{AssessmentResultRepository, CertificationAssessmentRepository, CompetenceMarkRepository};
use crate::services::scoring_service::ScoringCertificationService;
use std::sync::Arc;
use tracing::{info, warn};

/// Identifies results produced by automatic rescoring after a neutralization
/// change, as opposed to results entered by a jury.
pub const NEUTRALIZATION_EMITTER: &str = "PIX-ALGO-NEUTRALIZATION";

#[derive(Debug)]
pub enum RescoringOutcome {
    Scored {
        user_id: i64,
        certification_course_id: i64,
        assessment_result: AssessmentResult,
        competence_marks: Vec<CompetenceMark>,
        score: CertificationAssessmentScore,
    },
    ComputeError {
        certification_course_id: i64,
        assessment_result: AssessmentResult,
    },
}

impl RescoringOutcome {
    pub fn assessment_result(&self) -> &AssessmentResult {
        match self {
            RescoringOutcome::Scored { assessment_result, .. } => assessment_result,
            RescoringOutcome::ComputeError { assessment_result, .. } => assessment_result,
        }
    }

    /// Event raised when the certification got a usable score.
    pub fn completed_event(&self) -> Option<CertificationRescoringCompleted> {
        match self {
            RescoringOutcome::Scored {
                user_id,
                certification_course_id,
                score,
                ..
            } => Some(CertificationRescoringCompleted {
                certification_course_id: *certification_course_id,
                user_id: *user_id,
                reproducibility_rate: score.reproducibility_rate(),
                is_validated: score.is_validated(),
            }),
            RescoringOutcome::ComputeError { .. } => None,
        }
    }
}

#[derive(Clone)]
pub struct RescoringService {
    certification_assessment_repository: Arc<dyn CertificationAssessmentRepository>,
    assessment_result_repository: Arc<dyn AssessmentResultRepository>,
    competence_mark_repository: Arc<dyn CompetenceMarkRepository>,
    scoring_certification_service: Arc<dyn ScoringCertificationService>,
}

impl RescoringService {
    pub fn new(
        certification_assessment_repository: Arc<dyn CertificationAssessmentRepository>,
        assessment_result_repository: Arc<dyn AssessmentResultRepository>,
        competence_mark_repository: Arc<dyn CompetenceMarkRepository>,
        scoring_certification_service: Arc<dyn ScoringCertificationService>,
    ) -> Self {
        Self {
            certification_assessment_repository,
            assessment_result_repository,
            competence_mark_repository,
            scoring_certification_service,
        }
    }

    /// Appends a new result for the certification. A certification that
    /// cannot be computed gets an ERROR result instead of failing the call.
    pub async fn handle_rescoring(&self, event: &ChallengeNeutralizationChanged) -> Result<RescoringOutcome> {
        let assessment = self
            .certification_assessment_repository
            .get_by_certification_course_id(event.certification_course_id)
            .await?;

        match self
            .scoring_certification_service
            .calculate_certification_assessment_score(&assessment)
            .await
        {
            Ok(score) => self.save_result(&assessment, score, event.jury_id).await,
            Err(Error::CertificationCompute(detail)) => {
                warn!(
                    certification_course_id = event.certification_course_id,
                    assessment_id = assessment.id,
                    error = %detail,
                    "Certification could not be rescored"
                );
                let assessment_result = self
                    .assessment_result_repository
                    .save(NewAssessmentResult::algo_error(
                        assessment.id,
                        &detail,
                        NEUTRALIZATION_EMITTER,
                        event.jury_id,
                    ))
                    .await?;
                Ok(RescoringOutcome::ComputeError {
                    certification_course_id: event.certification_course_id,
                    assessment_result,
                })
            }
            Err(other) => Err(other),
        }
    }

    async fn save_result(
        &self,
        assessment: &CertificationAssessment,
        score: CertificationAssessmentScore,
        jury_id: Option<i64>,
    ) -> Result<RescoringOutcome> {
        let assessment_result = self
            .assessment_result_repository
            .save(NewAssessmentResult::standard(
                assessment.id,
                score.nb_pix,
                score.status,
                NEUTRALIZATION_EMITTER,
                jury_id,
            ))
            .await?;

        let mut competence_marks = Vec::with_capacity(score.competence_marks.len());
        for scored in &score.competence_marks {
            let mark = self
                .competence_mark_repository
                .save(CompetenceMark::from_scored(assessment_result.id, scored))
                .await?;
            competence_marks.push(mark);
        }

        info!(
            certification_course_id = assessment.certification_course_id,
            assessment_result_id = assessment_result.id,
            pix_score = score.nb_pix,
            status = ?score.status,
            "Certification rescored"
        );
        Ok(RescoringOutcome::Scored {
            user_id: assessment.user_id,
            certification_course_id: assessment.certification_course_id,
            assessment_result,
            competence_marks,
            score,
        })
    }
}
