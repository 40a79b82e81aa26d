use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Created,
    Finalized,
    InProcess,
    Processed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Session {
    pub id: i64,
    pub certification_center_id: i64,
    pub certification_center: String,
    pub address: Option<String>,
    pub room: Option<String>,
    pub examiner: Option<String>,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub description: Option<String>,
    pub access_code: String,
    pub examiner_global_comment: Option<String>,
    pub finalized_at: Option<DateTime<Utc>>,
    pub published_at: Option<DateTime<Utc>>,
    pub results_sent_to_prescriber_at: Option<DateTime<Utc>>,
    pub assigned_certification_officer_id: Option<i64>,
}

impl Session {
    pub fn status(&self) -> SessionStatus {
        if self.published_at.is_some() {
            return SessionStatus::Processed;
        }
        if self.assigned_certification_officer_id.is_some() {
            return SessionStatus::InProcess;
        }
        if self.finalized_at.is_some() {
            return SessionStatus::Finalized;
        }
        SessionStatus::Created
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized_at.is_some()
    }

    pub fn is_published(&self) -> bool {
        self.published_at.is_some()
    }

    pub fn are_results_flagged_as_sent(&self) -> bool {
        self.results_sent_to_prescriber_at.is_some()
    }
}

/// Values written when a session is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizeSession {
    pub id: i64,
    pub examiner_global_comment: Option<String>,
    pub finalized_at: DateTime<Utc>,
}
