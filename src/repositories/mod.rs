//! Collaborator contracts consumed by the scoring and finalization services.
//!
//! Every trait is implemented for PostgreSQL in [`postgres`]; tests provide
//! their own doubles.

pub mod postgres;

use crate::error::Result;
use crate::models::assessment_result::{AssessmentResult, AssessmentResultHistory, NewAssessmentResult};
use crate::models::badge_acquisition::BadgeAcquisition;
use crate::models::certification_assessment::CertificationAssessment;
use crate::models::certification_issue_report::CertificationIssueReport;
use crate::models::certification_report::CertificationReport;
use crate::models::competence_mark::CompetenceMark;
use crate::models::partner_certification_scoring::PartnerCertification;
use crate::models::placement_profile::PlacementProfile;
use crate::models::session::{FinalizeSession, Session};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    async fn is_finalized(&self, session_id: i64) -> Result<bool>;
    async fn finalize(&self, finalization: FinalizeSession) -> Result<Session>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificationReportRepository: Send + Sync {
    async fn finalize_all(&self, reports: &[CertificationReport]) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificationIssueReportRepository: Send + Sync {
    async fn find_by_certification_course_id(
        &self,
        certification_course_id: i64,
    ) -> Result<Vec<CertificationIssueReport>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificationAssessmentRepository: Send + Sync {
    async fn get_by_certification_course_id(
        &self,
        certification_course_id: i64,
    ) -> Result<CertificationAssessment>;
    async fn save(&self, assessment: &CertificationAssessment) -> Result<()>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssessmentResultRepository: Send + Sync {
    async fn save(&self, result: NewAssessmentResult) -> Result<AssessmentResult>;
    async fn find_history_by_assessment_id(&self, assessment_id: i64) -> Result<AssessmentResultHistory>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompetenceMarkRepository: Send + Sync {
    async fn save(&self, mark: CompetenceMark) -> Result<CompetenceMark>;
}

/// Estimated level and positioned pix score per competence, as produced by
/// the adaptive placement algorithm.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlacementProfileService: Send + Sync {
    async fn get_placement_profile(
        &self,
        user_id: i64,
        limit_date: DateTime<Utc>,
    ) -> Result<PlacementProfile>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BadgeAcquisitionRepository: Send + Sync {
    async fn find_badge_acquisition(
        &self,
        user_id: i64,
        badge_key: &str,
    ) -> Result<Option<BadgeAcquisition>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PartnerCompetenceRepository: Send + Sync {
    async fn max_reachable_pix_by_competence(&self, partner_key: &str) -> Result<HashMap<String, i32>>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PartnerCertificationRepository: Send + Sync {
    async fn save(&self, certification: &PartnerCertification) -> Result<()>;
}
