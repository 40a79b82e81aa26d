use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Positioning of a candidate on one competence, as estimated by the
/// placement service before the certification started.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCompetence {
    pub competence_id: String,
    pub area_code: String,
    pub estimated_level: i32,
    pub pix_score: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementProfile {
    pub user_id: i64,
    pub profile_date: DateTime<Utc>,
    pub user_competences: Vec<UserCompetence>,
}

impl PlacementProfile {
    pub fn competence(&self, competence_id: &str) -> Option<&UserCompetence> {
        self.user_competences
            .iter()
            .find(|c| c.competence_id == competence_id)
    }
}
