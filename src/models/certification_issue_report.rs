use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

pub const MAX_QUESTION_NUMBER: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificationIssueReportCategory {
    Other,
    LateOrLeaving,
    CandidateInformationsChanges,
    ConnectionOrEndScreen,
    InChallenge,
    Fraud,
    TechnicalProblem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CertificationIssueReportSubcategory {
    NameOrBirthdate,
    ExtraTimePercentage,
    LeftExamRoom,
    SignatureIssue,
    ImageNotDisplaying,
    LinkNotWorking,
    EmbedNotWorking,
    FileNotOpening,
    WebsiteUnavailable,
    WebsiteBlocked,
    Other,
    ExtraTimeExceeded,
    SoftwareNotWorking,
}

impl CertificationIssueReportCategory {
    fn required_action_code(&self) -> Option<&'static str> {
        match self {
            Self::TechnicalProblem => Some("A1"),
            Self::Other => Some("A2"),
            Self::Fraud => Some("C6"),
            _ => None,
        }
    }

    fn allowed_subcategories(&self) -> &'static [CertificationIssueReportSubcategory] {
        use CertificationIssueReportSubcategory::*;
        match self {
            Self::LateOrLeaving => &[LeftExamRoom, SignatureIssue],
            Self::CandidateInformationsChanges => &[NameOrBirthdate, ExtraTimePercentage],
            Self::InChallenge => &[
                ImageNotDisplaying,
                LinkNotWorking,
                EmbedNotWorking,
                FileNotOpening,
                WebsiteUnavailable,
                WebsiteBlocked,
                Other,
                ExtraTimeExceeded,
                SoftwareNotWorking,
            ],
            _ => &[],
        }
    }
}

impl CertificationIssueReportSubcategory {
    fn required_action_code(&self) -> Option<&'static str> {
        match self {
            Self::NameOrBirthdate => Some("C1"),
            Self::LeftExamRoom => Some("C3"),
            Self::ImageNotDisplaying => Some("E1"),
            Self::EmbedNotWorking => Some("E2"),
            Self::FileNotOpening => Some("E3"),
            Self::WebsiteUnavailable => Some("E4"),
            Self::WebsiteBlocked => Some("E5"),
            Self::LinkNotWorking => Some("E6"),
            Self::Other => Some("E7"),
            Self::ExtraTimeExceeded => Some("E8"),
            Self::SoftwareNotWorking => Some("E9"),
            Self::ExtraTimePercentage | Self::SignatureIssue => None,
        }
    }

    pub fn is_deprecated(&self) -> bool {
        matches!(self, Self::LinkNotWorking | Self::Other)
    }

    /// Platform faults that are not attributable to the candidate.
    pub fn is_platform_fault(&self) -> bool {
        matches!(
            self,
            Self::ImageNotDisplaying
                | Self::LinkNotWorking
                | Self::EmbedNotWorking
                | Self::FileNotOpening
                | Self::WebsiteUnavailable
                | Self::WebsiteBlocked
                | Self::ExtraTimeExceeded
                | Self::SoftwareNotWorking
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCertificationIssueReport {
    pub id: Option<i64>,
    pub certification_course_id: i64,
    pub category: CertificationIssueReportCategory,
    pub subcategory: Option<CertificationIssueReportSubcategory>,
    pub description: Option<String>,
    pub question_number: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificationIssueReport {
    pub id: Option<i64>,
    pub certification_course_id: i64,
    pub category: CertificationIssueReportCategory,
    pub subcategory: Option<CertificationIssueReportSubcategory>,
    pub description: Option<String>,
    pub question_number: Option<u32>,
    pub is_action_required: bool,
    pub is_auto_neutralizable: bool,
}

impl CertificationIssueReport {
    /// Builds a report entered by a proctor, validated against the schema of
    /// its category.
    pub fn new(payload: NewCertificationIssueReport) -> Result<Self> {
        validate(&payload)?;
        if payload.subcategory.map(|s| s.is_deprecated()).unwrap_or(false) {
            return Err(Error::DeprecatedCertificationIssueReportSubcategory);
        }
        Ok(Self::restore(payload))
    }

    /// Rebuilds a stored report. Stored reports may carry subcategories that
    /// have been deprecated since.
    pub fn restore(payload: NewCertificationIssueReport) -> Self {
        use CertificationIssueReportCategory::*;

        let category = payload.category;
        let subcategory = match category {
            Other | ConnectionOrEndScreen => None,
            _ => payload.subcategory,
        };
        let description = match category {
            ConnectionOrEndScreen => None,
            _ => payload.description,
        };
        let question_number = match category {
            InChallenge => payload.question_number,
            _ => None,
        };

        // Action is decided on the subcategory as submitted, before it is dropped.
        let is_action_required = payload
            .subcategory
            .and_then(|s| s.required_action_code())
            .or_else(|| category.required_action_code())
            .is_some();
        let is_auto_neutralizable = category == InChallenge
            && subcategory.map(|s| s.is_platform_fault()).unwrap_or(false);

        Self {
            id: payload.id,
            certification_course_id: payload.certification_course_id,
            category,
            subcategory,
            description,
            question_number,
            is_action_required,
            is_auto_neutralizable,
        }
    }

    pub fn required_action_code(&self) -> Option<&'static str> {
        self.subcategory
            .and_then(|s| s.required_action_code())
            .or_else(|| self.category.required_action_code())
    }
}

fn validate(payload: &NewCertificationIssueReport) -> Result<()> {
    use CertificationIssueReportCategory::*;
    use CertificationIssueReportSubcategory::LeftExamRoom;

    let has_description = payload
        .description
        .as_deref()
        .map(|d| !d.trim().is_empty())
        .unwrap_or(false);

    let description_required = match payload.category {
        Other | CandidateInformationsChanges | TechnicalProblem => true,
        LateOrLeaving => payload.subcategory == Some(LeftExamRoom),
        ConnectionOrEndScreen | InChallenge | Fraud => false,
    };
    if description_required && !has_description {
        return Err(Error::InvalidCertificationIssueReport(format!(
            "description is required for category {:?}",
            payload.category
        )));
    }

    let allowed = payload.category.allowed_subcategories();
    if !allowed.is_empty() {
        match payload.subcategory {
            Some(subcategory) if allowed.contains(&subcategory) => {}
            Some(subcategory) => {
                return Err(Error::InvalidCertificationIssueReport(format!(
                    "subcategory {:?} is not valid for category {:?}",
                    subcategory, payload.category
                )))
            }
            None => {
                return Err(Error::InvalidCertificationIssueReport(format!(
                    "subcategory is required for category {:?}",
                    payload.category
                )))
            }
        }
    }

    if payload.category == InChallenge {
        match payload.question_number {
            Some(n) if (1..=MAX_QUESTION_NUMBER).contains(&n) => {}
            _ => {
                return Err(Error::InvalidCertificationIssueReport(format!(
                    "question number must be between 1 and {}",
                    MAX_QUESTION_NUMBER
                )))
            }
        }
    }

    Ok(())
}
