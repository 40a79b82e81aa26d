use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BadgeAcquisition {
    pub user_id: i64,
    pub badge_key: String,
    pub is_still_valid: bool,
}
