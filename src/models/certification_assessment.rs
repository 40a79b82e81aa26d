use crate::error::{Error, Result};
use crate::models::answer::CertificationAnswer;
use crate::models::certification_challenge::CertificationChallenge;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssessmentState {
    Started,
    Completed,
}

/// Challenges presented to one candidate during a certification test, in
/// presentation order, and the answers they gave.
///
/// Once completed, only the neutralization flags of the challenges may change.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificationAssessment {
    pub id: i64,
    pub user_id: i64,
    pub certification_course_id: i64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub state: AssessmentState,
    pub is_v2_certification: bool,
    certification_challenges: Vec<CertificationChallenge>,
    certification_answers_by_date: Vec<CertificationAnswer>,
}

pub struct NewCertificationAssessment {
    pub id: i64,
    pub user_id: i64,
    pub certification_course_id: i64,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub state: AssessmentState,
    pub is_v2_certification: bool,
    pub certification_challenges: Vec<CertificationChallenge>,
    pub certification_answers_by_date: Vec<CertificationAnswer>,
}

impl CertificationAssessment {
    pub fn new(payload: NewCertificationAssessment) -> Result<Self> {
        for (idx, challenge) in payload.certification_challenges.iter().enumerate() {
            if challenge.question_number as usize != idx + 1 {
                return Err(Error::InvalidCertificationAssessment(format!(
                    "challenge {} has question number {}, expected {}",
                    challenge.challenge_id,
                    challenge.question_number,
                    idx + 1
                )));
            }
        }

        let challenge_ids: HashSet<&str> = payload
            .certification_challenges
            .iter()
            .map(|c| c.challenge_id.as_str())
            .collect();
        if challenge_ids.len() != payload.certification_challenges.len() {
            return Err(Error::InvalidCertificationAssessment(
                "a challenge is presented more than once".to_string(),
            ));
        }

        let mut answered: HashSet<&str> = HashSet::new();
        for answer in &payload.certification_answers_by_date {
            if !challenge_ids.contains(answer.challenge_id.as_str()) {
                return Err(Error::InvalidCertificationAssessment(format!(
                    "answer {} references unknown challenge {}",
                    answer.id, answer.challenge_id
                )));
            }
            if !answered.insert(answer.challenge_id.as_str()) {
                return Err(Error::InvalidCertificationAssessment(format!(
                    "challenge {} is answered more than once",
                    answer.challenge_id
                )));
            }
        }

        Ok(Self {
            id: payload.id,
            user_id: payload.user_id,
            certification_course_id: payload.certification_course_id,
            created_at: payload.created_at,
            completed_at: payload.completed_at,
            state: payload.state,
            is_v2_certification: payload.is_v2_certification,
            certification_challenges: payload.certification_challenges,
            certification_answers_by_date: payload.certification_answers_by_date,
        })
    }

    pub fn certification_challenges(&self) -> &[CertificationChallenge] {
        &self.certification_challenges
    }

    pub fn certification_answers_by_date(&self) -> &[CertificationAnswer] {
        &self.certification_answers_by_date
    }

    pub fn is_completed(&self) -> bool {
        self.state == AssessmentState::Completed
    }

    pub fn find_challenge_by_question_number(
        &self,
        question_number: u32,
    ) -> Option<&CertificationChallenge> {
        self.certification_challenges
            .iter()
            .find(|c| c.question_number == question_number)
    }

    pub fn find_answer_by_challenge_id(&self, challenge_id: &str) -> Option<&CertificationAnswer> {
        self.certification_answers_by_date
            .iter()
            .find(|a| a.challenge_id == challenge_id)
    }

    /// Competence ids in order of first appearance among the challenges.
    pub fn list_competence_ids(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.certification_challenges
            .iter()
            .map(|c| c.competence_id.as_str())
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Returns true when the challenge is neutralized after the call. Answers
    /// other than KO or SKIPPED are left untouched.
    pub fn neutralize_challenge_by_number_if_ko_or_skipped(&mut self, question_number: u32) -> bool {
        let Some(position) = self
            .certification_challenges
            .iter()
            .position(|c| c.question_number == question_number)
        else {
            return false;
        };

        let challenge_id = self.certification_challenges[position].challenge_id.clone();
        let is_ko_or_skipped = self
            .find_answer_by_challenge_id(&challenge_id)
            .map(|a| a.result.is_ko_or_skipped())
            .unwrap_or(false);

        if is_ko_or_skipped {
            self.certification_challenges[position].neutralize();
        }
        is_ko_or_skipped
    }

    pub fn neutralize_challenge_by_challenge_id(&mut self, challenge_id: &str) -> Result<()> {
        let challenge = self
            .certification_challenges
            .iter_mut()
            .find(|c| c.challenge_id == challenge_id)
            .ok_or_else(|| Error::ChallengeToBeNeutralizedNotFound(challenge_id.to_string()))?;
        challenge.neutralize();
        Ok(())
    }

    pub fn deneutralize_challenge_by_challenge_id(&mut self, challenge_id: &str) -> Result<()> {
        let challenge = self
            .certification_challenges
            .iter_mut()
            .find(|c| c.challenge_id == challenge_id)
            .ok_or_else(|| Error::ChallengeToBeDeneutralizedNotFound(challenge_id.to_string()))?;
        challenge.deneutralize();
        Ok(())
    }
}
