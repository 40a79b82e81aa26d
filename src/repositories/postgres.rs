use crate::database::unit_of_work::PgUnitOfWork;
use crate::error::{Error, Result};
use crate::models::answer::CertificationAnswer;
use crate::models::assessment_result::{AssessmentResult, AssessmentResultHistory, NewAssessmentResult};
use crate::models::badge_acquisition::BadgeAcquisition;
use crate::models::certification_assessment::{CertificationAssessment, NewCertificationAssessment};
use crate::models::certification_challenge::CertificationChallenge;
use crate::models::certification_issue_report::{CertificationIssueReport, NewCertificationIssueReport};
use crate::models::certification_report::CertificationReport;
use crate::models::competence_mark::CompetenceMark;
use crate::models::partner_certification_scoring::PartnerCertification;
use crate::models::placement_profile::{PlacementProfile, UserCompetence};
use crate::models::session::{FinalizeSession, Session};
use crate::repositories::{
    AssessmentResultRepository, BadgeAcquisitionRepository, CertificationAssessmentRepository,
    CertificationIssueReportRepository, CertificationReportRepository, CompetenceMarkRepository,
    PartnerCertificationRepository, PartnerCompetenceRepository, PlacementProfileService, SessionRepository,
};
use crate::utils::enum_text::{from_text, to_text};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;
use std::collections::HashMap;

fn question_number(value: i32) -> Result<u32> {
    u32::try_from(value).map_err(|_| Error::Internal(format!("invalid question number {}", value)))
}

pub struct PgSessionRepository {
    uow: PgUnitOfWork,
}

impl PgSessionRepository {
    pub fn new(uow: PgUnitOfWork) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn is_finalized(&self, session_id: i64) -> Result<bool> {
        let mut guard = self.uow.acquire().await?;
        let row = sqlx::query("SELECT finalized_at IS NOT NULL AS finalized FROM sessions WHERE id = $1")
            .bind(session_id)
            .fetch_one(guard.conn())
            .await?;
        Ok(row.try_get("finalized")?)
    }

    async fn finalize(&self, finalization: FinalizeSession) -> Result<Session> {
        let mut guard = self.uow.acquire().await?;
        // The finalized_at guard keeps a concurrent finalization from overwriting the first one.
        let session = sqlx::query_as::<_, Session>(
            r#"
            UPDATE sessions
            SET examiner_global_comment = $2, finalized_at = $3
            WHERE id = $1 AND finalized_at IS NULL
            RETURNING id, certification_center_id, certification_center, address, room, examiner,
                      date, time, description, access_code, examiner_global_comment, finalized_at,
                      published_at, results_sent_to_prescriber_at, assigned_certification_officer_id
            "#,
        )
        .bind(finalization.id)
        .bind(finalization.examiner_global_comment)
        .bind(finalization.finalized_at)
        .fetch_optional(guard.conn())
        .await?;
        session.ok_or(Error::SessionAlreadyFinalized)
    }
}

pub struct PgCertificationReportRepository {
    uow: PgUnitOfWork,
}

impl PgCertificationReportRepository {
    pub fn new(uow: PgUnitOfWork) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl CertificationReportRepository for PgCertificationReportRepository {
    async fn finalize_all(&self, reports: &[CertificationReport]) -> Result<()> {
        let mut guard = self.uow.acquire().await?;
        for report in reports {
            let updated = sqlx::query(
                r#"
                UPDATE certification_courses
                SET examiner_comment = $2, has_seen_end_test_screen = $3, updated_at = NOW()
                WHERE id = $1
                "#,
            )
            .bind(report.certification_course_id)
            .bind(&report.examiner_comment)
            .bind(report.has_seen_end_test_screen.unwrap_or(false))
            .execute(guard.conn())
            .await?;
            if updated.rows_affected() == 0 {
                return Err(Error::NotFound(format!(
                    "certification course {}",
                    report.certification_course_id
                )));
            }
        }
        Ok(())
    }
}

pub struct PgCertificationIssueReportRepository {
    uow: PgUnitOfWork,
}

impl PgCertificationIssueReportRepository {
    pub fn new(uow: PgUnitOfWork) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl CertificationIssueReportRepository for PgCertificationIssueReportRepository {
    async fn find_by_certification_course_id(
        &self,
        certification_course_id: i64,
    ) -> Result<Vec<CertificationIssueReport>> {
        let mut guard = self.uow.acquire().await?;
        let rows = sqlx::query(
            r#"
            SELECT id, certification_course_id, category, subcategory, description, question_number
            FROM certification_issue_reports
            WHERE certification_course_id = $1
            ORDER BY id
            "#,
        )
        .bind(certification_course_id)
        .fetch_all(guard.conn())
        .await?;

        rows.iter()
            .map(|row| -> Result<CertificationIssueReport> {
                let subcategory: Option<String> = row.try_get("subcategory")?;
                let question: Option<i32> = row.try_get("question_number")?;
                Ok(CertificationIssueReport::restore(NewCertificationIssueReport {
                    id: Some(row.try_get("id")?),
                    certification_course_id: row.try_get("certification_course_id")?,
                    category: from_text(row.try_get::<&str, _>("category")?)?,
                    subcategory: subcategory.as_deref().map(from_text).transpose()?,
                    description: row.try_get("description")?,
                    question_number: question.map(question_number).transpose()?,
                }))
            })
            .collect()
    }
}

pub struct PgCertificationAssessmentRepository {
    uow: PgUnitOfWork,
}

impl PgCertificationAssessmentRepository {
    pub fn new(uow: PgUnitOfWork) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl CertificationAssessmentRepository for PgCertificationAssessmentRepository {
    async fn get_by_certification_course_id(
        &self,
        certification_course_id: i64,
    ) -> Result<CertificationAssessment> {
        let mut guard = self.uow.acquire().await?;
        let row = sqlx::query(
            r#"
            SELECT a.id, a.user_id, a.certification_course_id, a.state, a.created_at, a.completed_at,
                   cc.is_v2_certification
            FROM assessments a
            JOIN certification_courses cc ON cc.id = a.certification_course_id
            WHERE a.certification_course_id = $1
            "#,
        )
        .bind(certification_course_id)
        .fetch_optional(guard.conn())
        .await?
        .ok_or_else(|| Error::NotFound(format!("assessment for certification course {}", certification_course_id)))?;
        let assessment_id: i64 = row.try_get("id")?;

        let challenge_rows = sqlx::query(
            r#"
            SELECT id, question_number, challenge_id, competence_id, associated_skill_name, is_neutralized
            FROM certification_challenges
            WHERE certification_course_id = $1
            ORDER BY question_number
            "#,
        )
        .bind(certification_course_id)
        .fetch_all(guard.conn())
        .await?;
        let certification_challenges = challenge_rows
            .iter()
            .map(|r| -> Result<CertificationChallenge> {
                Ok(CertificationChallenge {
                    id: r.try_get("id")?,
                    question_number: question_number(r.try_get("question_number")?)?,
                    challenge_id: r.try_get("challenge_id")?,
                    competence_id: r.try_get("competence_id")?,
                    associated_skill_name: r.try_get("associated_skill_name")?,
                    is_neutralized: r.try_get("is_neutralized")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let answer_rows = sqlx::query(
            "SELECT id, challenge_id, result FROM answers WHERE assessment_id = $1 ORDER BY created_at, id",
        )
        .bind(assessment_id)
        .fetch_all(guard.conn())
        .await?;
        let certification_answers_by_date = answer_rows
            .iter()
            .map(|r| -> Result<CertificationAnswer> {
                Ok(CertificationAnswer {
                    id: r.try_get("id")?,
                    challenge_id: r.try_get("challenge_id")?,
                    result: from_text(r.try_get::<&str, _>("result")?)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        CertificationAssessment::new(NewCertificationAssessment {
            id: assessment_id,
            user_id: row.try_get("user_id")?,
            certification_course_id: row.try_get("certification_course_id")?,
            created_at: row.try_get("created_at")?,
            completed_at: row.try_get("completed_at")?,
            state: from_text(row.try_get::<&str, _>("state")?)?,
            is_v2_certification: row.try_get("is_v2_certification")?,
            certification_challenges,
            certification_answers_by_date,
        })
    }

    /// Only neutralization flags are persisted; the rest of a completed
    /// assessment is immutable.
    async fn save(&self, assessment: &CertificationAssessment) -> Result<()> {
        let (challenge_ids, flags): (Vec<String>, Vec<bool>) = assessment
            .certification_challenges()
            .iter()
            .map(|c| (c.challenge_id.clone(), c.is_neutralized))
            .unzip();

        let mut guard = self.uow.acquire().await?;
        sqlx::query(
            r#"
            UPDATE certification_challenges AS c
            SET is_neutralized = v.is_neutralized
            FROM UNNEST($2::text[], $3::bool[]) AS v(challenge_id, is_neutralized)
            WHERE c.certification_course_id = $1 AND c.challenge_id = v.challenge_id
            "#,
        )
        .bind(assessment.certification_course_id)
        .bind(challenge_ids)
        .bind(flags)
        .execute(guard.conn())
        .await?;
        Ok(())
    }
}

pub struct PgAssessmentResultRepository {
    uow: PgUnitOfWork,
}

impl PgAssessmentResultRepository {
    pub fn new(uow: PgUnitOfWork) -> Self {
        Self { uow }
    }
}

fn assessment_result_from_row(row: &PgRow) -> Result<AssessmentResult> {
    Ok(AssessmentResult {
        id: row.try_get("id")?,
        assessment_id: row.try_get("assessment_id")?,
        pix_score: row.try_get("pix_score")?,
        status: from_text(row.try_get::<&str, _>("status")?)?,
        emitter: row.try_get("emitter")?,
        jury_id: row.try_get("jury_id")?,
        comment_for_jury: row.try_get("comment_for_jury")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl AssessmentResultRepository for PgAssessmentResultRepository {
    async fn save(&self, result: NewAssessmentResult) -> Result<AssessmentResult> {
        let status = to_text(&result.status)?;
        let mut guard = self.uow.acquire().await?;
        let row = sqlx::query(
            r#"
            INSERT INTO assessment_results (assessment_id, pix_score, status, emitter, jury_id, comment_for_jury)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, assessment_id, pix_score, status, emitter, jury_id, comment_for_jury, created_at
            "#,
        )
        .bind(result.assessment_id)
        .bind(result.pix_score)
        .bind(status)
        .bind(result.emitter)
        .bind(result.jury_id)
        .bind(result.comment_for_jury)
        .fetch_one(guard.conn())
        .await?;
        assessment_result_from_row(&row)
    }

    async fn find_history_by_assessment_id(&self, assessment_id: i64) -> Result<AssessmentResultHistory> {
        let mut guard = self.uow.acquire().await?;
        let rows = sqlx::query(
            r#"
            SELECT id, assessment_id, pix_score, status, emitter, jury_id, comment_for_jury, created_at
            FROM assessment_results
            WHERE assessment_id = $1
            "#,
        )
        .bind(assessment_id)
        .fetch_all(guard.conn())
        .await?;
        let results = rows
            .iter()
            .map(assessment_result_from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(AssessmentResultHistory::new(results))
    }
}

pub struct PgCompetenceMarkRepository {
    uow: PgUnitOfWork,
}

impl PgCompetenceMarkRepository {
    pub fn new(uow: PgUnitOfWork) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl CompetenceMarkRepository for PgCompetenceMarkRepository {
    async fn save(&self, mark: CompetenceMark) -> Result<CompetenceMark> {
        let mut guard = self.uow.acquire().await?;
        let row = sqlx::query(
            r#"
            INSERT INTO competence_marks (assessment_result_id, competence_id, area_code, level, score)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id
            "#,
        )
        .bind(mark.assessment_result_id)
        .bind(&mark.competence_id)
        .bind(&mark.area_code)
        .bind(mark.level)
        .bind(mark.score)
        .fetch_one(guard.conn())
        .await?;
        Ok(CompetenceMark {
            id: Some(row.try_get("id")?),
            ..mark
        })
    }
}

/// Reads the latest competence estimates recorded before the limit date.
pub struct PgPlacementProfileService {
    uow: PgUnitOfWork,
}

impl PgPlacementProfileService {
    pub fn new(uow: PgUnitOfWork) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl PlacementProfileService for PgPlacementProfileService {
    async fn get_placement_profile(&self, user_id: i64, limit_date: DateTime<Utc>) -> Result<PlacementProfile> {
        let mut guard = self.uow.acquire().await?;
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT ON (competence_id) competence_id, area_code, estimated_level, pix_score
            FROM user_competence_estimates
            WHERE user_id = $1 AND computed_at <= $2
            ORDER BY competence_id, computed_at DESC
            "#,
        )
        .bind(user_id)
        .bind(limit_date)
        .fetch_all(guard.conn())
        .await?;
        let user_competences = rows
            .iter()
            .map(|r| -> Result<UserCompetence> {
                Ok(UserCompetence {
                    competence_id: r.try_get("competence_id")?,
                    area_code: r.try_get("area_code")?,
                    estimated_level: r.try_get("estimated_level")?,
                    pix_score: r.try_get("pix_score")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(PlacementProfile {
            user_id,
            profile_date: limit_date,
            user_competences,
        })
    }
}

pub struct PgBadgeAcquisitionRepository {
    uow: PgUnitOfWork,
}

impl PgBadgeAcquisitionRepository {
    pub fn new(uow: PgUnitOfWork) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl BadgeAcquisitionRepository for PgBadgeAcquisitionRepository {
    async fn find_badge_acquisition(&self, user_id: i64, badge_key: &str) -> Result<Option<BadgeAcquisition>> {
        let mut guard = self.uow.acquire().await?;
        let row = sqlx::query(
            r#"
            SELECT user_id, badge_key, is_still_valid
            FROM badge_acquisitions
            WHERE user_id = $1 AND badge_key = $2
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(badge_key)
        .fetch_optional(guard.conn())
        .await?;
        row.map(|r| -> Result<BadgeAcquisition> {
            Ok(BadgeAcquisition {
                user_id: r.try_get("user_id")?,
                badge_key: r.try_get("badge_key")?,
                is_still_valid: r.try_get("is_still_valid")?,
            })
        })
        .transpose()
    }
}

pub struct PgPartnerCompetenceRepository {
    uow: PgUnitOfWork,
}

impl PgPartnerCompetenceRepository {
    pub fn new(uow: PgUnitOfWork) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl PartnerCompetenceRepository for PgPartnerCompetenceRepository {
    async fn max_reachable_pix_by_competence(&self, partner_key: &str) -> Result<HashMap<String, i32>> {
        let mut guard = self.uow.acquire().await?;
        let rows = sqlx::query(
            "SELECT competence_id, max_reachable_pix FROM partner_competence_max_pix WHERE partner_key = $1",
        )
        .bind(partner_key)
        .fetch_all(guard.conn())
        .await?;
        rows.iter()
            .map(|r| -> Result<(String, i32)> { Ok((r.try_get("competence_id")?, r.try_get("max_reachable_pix")?)) })
            .collect()
    }
}

pub struct PgPartnerCertificationRepository {
    uow: PgUnitOfWork,
}

impl PgPartnerCertificationRepository {
    pub fn new(uow: PgUnitOfWork) -> Self {
        Self { uow }
    }
}

#[async_trait]
impl PartnerCertificationRepository for PgPartnerCertificationRepository {
    async fn save(&self, certification: &PartnerCertification) -> Result<()> {
        let mut guard = self.uow.acquire().await?;
        sqlx::query(
            r#"
            INSERT INTO partner_certifications (certification_course_id, partner_key, acquired)
            VALUES ($1, $2, $3)
            ON CONFLICT (certification_course_id, partner_key)
            DO UPDATE SET acquired = EXCLUDED.acquired, updated_at = NOW()
            "#,
        )
        .bind(certification.certification_course_id)
        .bind(&certification.partner_key)
        .bind(certification.acquired)
        .execute(guard.conn())
        .await?;
        Ok(())
    }
}
