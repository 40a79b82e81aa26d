use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationChallenge {
    pub id: i64,
    pub question_number: u32,
    pub challenge_id: String,
    pub competence_id: String,
    pub associated_skill_name: String,
    #[serde(default)]
    pub is_neutralized: bool,
}

impl CertificationChallenge {
    pub fn neutralize(&mut self) {
        self.is_neutralized = true;
    }

    pub fn deneutralize(&mut self) {
        self.is_neutralized = false;
    }
}
