use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerStatus {
    Ok,
    Ko,
    #[serde(rename = "aband")]
    Skipped,
    Partially,
    #[serde(rename = "timedout")]
    TimedOut,
    #[serde(rename = "focusedOut")]
    FocusedOut,
    Unimplemented,
}

impl AnswerStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, AnswerStatus::Ok)
    }

    pub fn is_ko_or_skipped(&self) -> bool {
        matches!(self, AnswerStatus::Ko | AnswerStatus::Skipped)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationAnswer {
    pub id: i64,
    pub challenge_id: String,
    pub result: AnswerStatus,
}
