use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const UNCERTIFIED_LEVEL: i32 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertifiedLevelStatus {
    Uncertified,
    Downgraded,
    Validated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertifiedLevel {
    pub value: i32,
    pub status: CertifiedLevelStatus,
}

pub struct CertifiedLevelInput {
    pub number_of_correct_answers: usize,
    pub estimated_level: i32,
    pub reproducibility_rate: Decimal,
}

impl CertifiedLevel {
    /// The only place where a competence level gets downgraded.
    pub fn from(input: CertifiedLevelInput, minimum_reproducibility_rate_to_be_trusted: Decimal) -> Self {
        if input.number_of_correct_answers < 2 {
            return Self::uncertified();
        }
        if input.reproducibility_rate < minimum_reproducibility_rate_to_be_trusted
            && input.number_of_correct_answers == 2
        {
            return Self::downgraded(input.estimated_level);
        }
        Self::validated(input.estimated_level)
    }

    pub fn uncertified() -> Self {
        Self {
            value: UNCERTIFIED_LEVEL,
            status: CertifiedLevelStatus::Uncertified,
        }
    }

    fn downgraded(estimated_level: i32) -> Self {
        Self {
            value: estimated_level - 1,
            status: CertifiedLevelStatus::Downgraded,
        }
    }

    fn validated(estimated_level: i32) -> Self {
        Self {
            value: estimated_level,
            status: CertifiedLevelStatus::Validated,
        }
    }

    pub fn is_uncertified(&self) -> bool {
        self.status == CertifiedLevelStatus::Uncertified
    }

    pub fn is_downgraded(&self) -> bool {
        self.status == CertifiedLevelStatus::Downgraded
    }
}
