use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFinalized {
    pub session_id: i64,
    pub finalized_at: DateTime<Utc>,
    pub has_examiner_global_comment: bool,
    pub certification_center_name: String,
    pub session_date: NaiveDate,
    pub session_time: NaiveTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NeutralizationDecision {
    Neutralized,
    Deneutralized,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChallengeNeutralizationChanged {
    pub certification_course_id: i64,
    pub challenge_id: String,
    pub decision: NeutralizationDecision,
    pub jury_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationRescoringCompleted {
    pub certification_course_id: i64,
    pub user_id: i64,
    pub reproducibility_rate: Decimal,
    pub is_validated: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum DomainEvent {
    SessionFinalized(SessionFinalized),
    ChallengeNeutralizationChanged(ChallengeNeutralizationChanged),
    CertificationRescoringCompleted(CertificationRescoringCompleted),
}

impl DomainEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::SessionFinalized(_) => "session_finalized",
            DomainEvent::ChallengeNeutralizationChanged(_) => "challenge_neutralization_changed",
            DomainEvent::CertificationRescoringCompleted(_) => "certification_rescoring_completed",
        }
    }
}
