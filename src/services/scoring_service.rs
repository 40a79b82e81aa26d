use crate::config::ScoringConfig;
use crate::error::{Error, Result};
use crate::models::assessment_result::AssessmentResultStatus;
use crate::models::certification_assessment::CertificationAssessment;
use crate::models::certification_assessment_score::{CertificationAssessmentScore, ScoredCompetence};
use crate::models::certified_level::{CertifiedLevel, CertifiedLevelInput, CertifiedLevelStatus, UNCERTIFIED_LEVEL};
use crate::models::placement_profile::PlacementProfile;
use crate::repositories::PlacementProfileService;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;

/// Minimum number of scorable answers per competence for legacy certifications.
pub const LEGACY_MINIMUM_ANSWERS_BY_COMPETENCE: usize = 3;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ScoringCertificationService: Send + Sync {
    async fn calculate_certification_assessment_score(
        &self,
        assessment: &CertificationAssessment,
    ) -> Result<CertificationAssessmentScore>;
}

#[derive(Clone)]
pub struct ScoringService {
    placement_profile_service: Arc<dyn PlacementProfileService>,
    config: ScoringConfig,
}

impl ScoringService {
    pub fn new(placement_profile_service: Arc<dyn PlacementProfileService>, config: ScoringConfig) -> Self {
        Self {
            placement_profile_service,
            config,
        }
    }
}

#[async_trait]
impl ScoringCertificationService for ScoringService {
    async fn calculate_certification_assessment_score(
        &self,
        assessment: &CertificationAssessment,
    ) -> Result<CertificationAssessmentScore> {
        ensure_completed(assessment)?;
        let placement_profile = self
            .placement_profile_service
            .get_placement_profile(assessment.user_id, assessment.created_at)
            .await?;
        compute_assessment_score(assessment, &placement_profile, &self.config)
    }
}

fn ensure_completed(assessment: &CertificationAssessment) -> Result<()> {
    if !assessment.is_completed() {
        return Err(Error::InvalidCertificationAssessment(format!(
            "assessment {} is not completed and cannot be scored",
            assessment.id
        )));
    }
    Ok(())
}

pub fn reproducibility_rate(number_of_correct_answers: usize, number_of_challenges_answered: usize) -> Decimal {
    if number_of_challenges_answered == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(number_of_correct_answers as u64) * Decimal::ONE_HUNDRED
        / Decimal::from(number_of_challenges_answered as u64))
    .round_dp(2)
}

/// Scores a completed certification. Neutralized challenges count neither as
/// answered nor as correct.
pub fn compute_assessment_score(
    assessment: &CertificationAssessment,
    placement_profile: &PlacementProfile,
    config: &ScoringConfig,
) -> Result<CertificationAssessmentScore> {
    ensure_completed(assessment)?;

    let neutralized: HashSet<&str> = assessment
        .certification_challenges()
        .iter()
        .filter(|c| c.is_neutralized)
        .map(|c| c.challenge_id.as_str())
        .collect();

    let scorable_answers: Vec<_> = assessment
        .certification_answers_by_date()
        .iter()
        .filter(|a| !neutralized.contains(a.challenge_id.as_str()))
        .collect();

    if scorable_answers.is_empty() {
        return Err(Error::CertificationCompute(format!(
            "assessment {} has no answered challenge left to score",
            assessment.id
        )));
    }

    let overall_correct = scorable_answers.iter().filter(|a| a.result.is_ok()).count();
    let overall_rate = reproducibility_rate(overall_correct, scorable_answers.len());

    let mut competence_marks = Vec::new();
    for competence_id in assessment.list_competence_ids() {
        let challenge_ids: HashSet<&str> = assessment
            .certification_challenges()
            .iter()
            .filter(|c| c.competence_id == competence_id && !c.is_neutralized)
            .map(|c| c.challenge_id.as_str())
            .collect();
        let answers: Vec<_> = scorable_answers
            .iter()
            .filter(|a| challenge_ids.contains(a.challenge_id.as_str()))
            .collect();

        if !assessment.is_v2_certification && answers.len() < LEGACY_MINIMUM_ANSWERS_BY_COMPETENCE {
            return Err(Error::CertificationCompute(format!(
                "competence {} has {} scorable answers, {} required",
                competence_id,
                answers.len(),
                LEGACY_MINIMUM_ANSWERS_BY_COMPETENCE
            )));
        }

        let user_competence = placement_profile.competence(competence_id).ok_or_else(|| {
            Error::CertificationCompute(format!(
                "competence {} is missing from the placement profile of user {}",
                competence_id, assessment.user_id
            ))
        })?;

        let number_of_challenges_answered = answers.len();
        let number_of_correct_answers = answers.iter().filter(|a| a.result.is_ok()).count();
        let rate = reproducibility_rate(number_of_correct_answers, number_of_challenges_answered);
        let estimated_level = user_competence.estimated_level.min(config.max_reachable_level);

        let certified_level = CertifiedLevel::from(
            CertifiedLevelInput {
                number_of_correct_answers,
                estimated_level,
                reproducibility_rate: rate,
            },
            config.minimum_reproducibility_rate_to_be_trusted,
        );

        let positioned_score = user_competence
            .pix_score
            .min(config.max_reachable_level * config.pix_count_by_level);
        let score = match certified_level.status {
            CertifiedLevelStatus::Uncertified => 0,
            CertifiedLevelStatus::Downgraded => (positioned_score - config.pix_count_by_level).max(0),
            CertifiedLevelStatus::Validated => positioned_score,
        };

        competence_marks.push(ScoredCompetence {
            competence_id: competence_id.to_string(),
            area_code: user_competence.area_code.clone(),
            number_of_challenges_answered,
            number_of_correct_answers,
            reproducibility_rate: rate,
            estimated_level,
            certified_level,
            level: certified_level.value,
            score,
        });
    }

    if overall_rate < config.minimum_reproducibility_rate_to_be_certified {
        for mark in &mut competence_marks {
            mark.certified_level = CertifiedLevel::uncertified();
            mark.level = UNCERTIFIED_LEVEL;
            mark.score = 0;
        }
    }

    let nb_pix = competence_marks.iter().map(|m| m.score).sum();
    let status = if competence_marks.iter().all(|m| m.certified_level.is_uncertified()) {
        AssessmentResultStatus::Rejected
    } else {
        AssessmentResultStatus::Validated
    };

    Ok(CertificationAssessmentScore {
        competence_marks,
        percentage_correct_answers: overall_rate,
        nb_pix,
        status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::answer::{AnswerStatus, CertificationAnswer};
    use crate::models::certification_assessment::{AssessmentState, NewCertificationAssessment};
    use crate::models::certification_challenge::CertificationChallenge;
    use crate::models::placement_profile::UserCompetence;
    use crate::repositories::MockPlacementProfileService;
    use chrono::Utc;

    fn config() -> ScoringConfig {
        ScoringConfig {
            minimum_reproducibility_rate_to_be_certified: Decimal::from(50),
            minimum_reproducibility_rate_to_be_trusted: Decimal::from(80),
            partner_min_percentage: Decimal::from(75),
            pix_count_by_level: 8,
            max_reachable_level: 5,
        }
    }

    /// One entry per challenge: (competence, result, neutralized).
    fn assessment(
        rows: &[(&str, Option<AnswerStatus>, bool)],
        state: AssessmentState,
        is_v2: bool,
    ) -> CertificationAssessment {
        let mut challenges = Vec::new();
        let mut answers = Vec::new();
        for (idx, (competence_id, result, neutralized)) in rows.iter().enumerate() {
            let challenge_id = format!("rec{}", idx + 1);
            challenges.push(CertificationChallenge {
                id: idx as i64 + 1,
                question_number: idx as u32 + 1,
                challenge_id: challenge_id.clone(),
                competence_id: competence_id.to_string(),
                associated_skill_name: format!("@skill{}", idx + 1),
                is_neutralized: *neutralized,
            });
            if let Some(result) = result {
                answers.push(CertificationAnswer {
                    id: idx as i64 + 1,
                    challenge_id,
                    result: *result,
                });
            }
        }
        CertificationAssessment::new(NewCertificationAssessment {
            id: 100,
            user_id: 200,
            certification_course_id: 300,
            created_at: Utc::now(),
            completed_at: Some(Utc::now()),
            state,
            is_v2_certification: is_v2,
            certification_challenges: challenges,
            certification_answers_by_date: answers,
        })
        .unwrap()
    }

    fn profile() -> PlacementProfile {
        PlacementProfile {
            user_id: 200,
            profile_date: Utc::now(),
            user_competences: vec![
                UserCompetence {
                    competence_id: "compA".to_string(),
                    area_code: "1".to_string(),
                    estimated_level: 3,
                    pix_score: 26,
                },
                UserCompetence {
                    competence_id: "compB".to_string(),
                    area_code: "2".to_string(),
                    estimated_level: 4,
                    pix_score: 35,
                },
            ],
        }
    }

    use AnswerStatus::{Ko, Ok as Good, Skipped};

    #[test]
    fn validates_competences_with_all_correct_answers() {
        let assessment = assessment(
            &[
                ("compA", Some(Good), false),
                ("compA", Some(Good), false),
                ("compA", Some(Good), false),
                ("compB", Some(Good), false),
                ("compB", Some(Good), false),
                ("compB", Some(Good), false),
            ],
            AssessmentState::Completed,
            true,
        );

        let score = compute_assessment_score(&assessment, &profile(), &config()).unwrap();

        assert_eq!(score.nb_pix, 26 + 35);
        assert_eq!(score.status, AssessmentResultStatus::Validated);
        assert_eq!(score.percentage_correct_answers, Decimal::ONE_HUNDRED);
        assert_eq!(score.competence_mark("compA").map(|m| m.level), Some(3));
        assert_eq!(score.competence_mark("compB").map(|m| m.level), Some(4));
    }

    #[test]
    fn downgrades_at_exactly_two_correct_answers_below_trust() {
        let assessment = assessment(
            &[
                ("compA", Some(Good), false),
                ("compA", Some(Good), false),
                ("compA", Some(Ko), false),
                ("compB", Some(Good), false),
                ("compB", Some(Good), false),
                ("compB", Some(Good), false),
            ],
            AssessmentState::Completed,
            true,
        );

        let score = compute_assessment_score(&assessment, &profile(), &config()).unwrap();
        let mark = score.competence_mark("compA").unwrap();

        assert!(mark.certified_level.is_downgraded());
        assert_eq!(mark.level, 2);
        assert_eq!(mark.score, 26 - 8);
    }

    #[test]
    fn three_correct_answers_below_trust_is_not_downgraded() {
        let assessment = assessment(
            &[
                ("compA", Some(Good), false),
                ("compA", Some(Good), false),
                ("compA", Some(Good), false),
                ("compA", Some(Ko), false),
                ("compA", Some(Ko), false),
                ("compB", Some(Good), false),
                ("compB", Some(Good), false),
            ],
            AssessmentState::Completed,
            true,
        );

        let score = compute_assessment_score(&assessment, &profile(), &config()).unwrap();
        let mark = score.competence_mark("compA").unwrap();

        assert_eq!(mark.reproducibility_rate, Decimal::from(60));
        assert_eq!(mark.certified_level.status, CertifiedLevelStatus::Validated);
        assert_eq!(mark.score, 26);
    }

    #[test]
    fn one_correct_answer_is_uncertified_even_at_full_rate() {
        let assessment = assessment(
            &[
                ("compA", Some(Good), false),
                ("compA", Some(Ko), true),
                ("compA", Some(Ko), true),
                ("compB", Some(Good), false),
                ("compB", Some(Good), false),
                ("compB", Some(Good), false),
            ],
            AssessmentState::Completed,
            true,
        );

        let score = compute_assessment_score(&assessment, &profile(), &config()).unwrap();
        let mark = score.competence_mark("compA").unwrap();

        assert_eq!(mark.reproducibility_rate, Decimal::ONE_HUNDRED);
        assert!(mark.certified_level.is_uncertified());
        assert_eq!(mark.level, UNCERTIFIED_LEVEL);
        assert_eq!(mark.score, 0);
    }

    #[test]
    fn neutralized_answers_leave_numerator_and_denominator() {
        let assessment = assessment(
            &[
                ("compA", Some(Good), false),
                ("compA", Some(Ko), true),
                ("compA", Some(Good), false),
                ("compB", Some(Good), false),
                ("compB", Some(Skipped), true),
                ("compB", Some(Good), false),
            ],
            AssessmentState::Completed,
            true,
        );

        let score = compute_assessment_score(&assessment, &profile(), &config()).unwrap();
        let mark = score.competence_mark("compA").unwrap();

        assert_eq!(mark.number_of_challenges_answered, 2);
        assert_eq!(mark.number_of_correct_answers, 2);
        assert_eq!(score.percentage_correct_answers, Decimal::ONE_HUNDRED);
    }

    #[test]
    fn low_overall_rate_rejects_every_competence() {
        let assessment = assessment(
            &[
                ("compA", Some(Good), false),
                ("compA", Some(Good), false),
                ("compA", Some(Ko), false),
                ("compA", Some(Ko), false),
                ("compA", Some(Ko), false),
                ("compB", Some(Ko), false),
                ("compB", Some(Ko), false),
            ],
            AssessmentState::Completed,
            true,
        );

        let score = compute_assessment_score(&assessment, &profile(), &config()).unwrap();

        assert!(score.percentage_correct_answers < Decimal::from(50));
        assert_eq!(score.nb_pix, 0);
        assert_eq!(score.status, AssessmentResultStatus::Rejected);
        assert!(score.competence_marks.iter().all(|m| m.level == UNCERTIFIED_LEVEL));
    }

    #[test]
    fn nothing_left_to_score_is_a_compute_error() {
        let assessment = assessment(
            &[("compA", Some(Ko), true), ("compB", None, false)],
            AssessmentState::Completed,
            true,
        );

        let result = compute_assessment_score(&assessment, &profile(), &config());
        assert!(matches!(result, Err(Error::CertificationCompute(_))));
    }

    #[test]
    fn competence_outside_placement_profile_is_a_compute_error() {
        let assessment = assessment(
            &[("compZ", Some(Good), false), ("compZ", Some(Good), false)],
            AssessmentState::Completed,
            true,
        );

        let result = compute_assessment_score(&assessment, &profile(), &config());
        assert!(matches!(result, Err(Error::CertificationCompute(_))));
    }

    #[test]
    fn legacy_certification_needs_three_answers_per_competence() {
        let assessment = assessment(
            &[
                ("compA", Some(Good), false),
                ("compA", Some(Good), false),
                ("compB", Some(Good), false),
                ("compB", Some(Good), false),
                ("compB", Some(Good), false),
            ],
            AssessmentState::Completed,
            false,
        );

        let result = compute_assessment_score(&assessment, &profile(), &config());
        assert!(matches!(result, Err(Error::CertificationCompute(_))));
    }

    #[test]
    fn started_assessment_is_rejected() {
        let assessment = assessment(&[("compA", Some(Good), false)], AssessmentState::Started, true);

        let result = compute_assessment_score(&assessment, &profile(), &config());
        assert!(matches!(result, Err(Error::InvalidCertificationAssessment(_))));
    }

    #[test]
    fn estimated_level_is_capped() {
        let mut profile = profile();
        profile.user_competences[0].estimated_level = 7;
        profile.user_competences[0].pix_score = 60;
        let assessment = assessment(
            &[
                ("compA", Some(Good), false),
                ("compA", Some(Good), false),
                ("compA", Some(Good), false),
            ],
            AssessmentState::Completed,
            true,
        );

        let score = compute_assessment_score(&assessment, &profile, &config()).unwrap();
        let mark = score.competence_mark("compA").unwrap();

        assert_eq!(mark.level, 5);
        assert_eq!(mark.score, 40);
    }

    #[tokio::test]
    async fn service_fetches_profile_as_of_assessment_creation() {
        let assessment = assessment(
            &[
                ("compA", Some(Good), false),
                ("compA", Some(Good), false),
                ("compB", Some(Good), false),
                ("compB", Some(Good), false),
            ],
            AssessmentState::Completed,
            true,
        );
        let created_at = assessment.created_at;

        let mut placement = MockPlacementProfileService::new();
        placement
            .expect_get_placement_profile()
            .withf(move |user_id, limit_date| *user_id == 200 && *limit_date == created_at)
            .times(1)
            .returning(|_, _| Ok(profile()));

        let service = ScoringService::new(Arc::new(placement), config());
        let score = service
            .calculate_certification_assessment_score(&assessment)
            .await
            .unwrap();

        assert_eq!(score.nb_pix, 26 + 35);
    }
}
