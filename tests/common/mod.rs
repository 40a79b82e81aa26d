#![allow(dead_code)]

use async_trait::async_trait;
use certification_scoring::config::ScoringConfig;
use certification_scoring::error::{Error, Result};
use certification_scoring::models::answer::{AnswerStatus, CertificationAnswer};
use certification_scoring::models::assessment_result::{
    AssessmentResult, AssessmentResultHistory, NewAssessmentResult,
};
use certification_scoring::models::certification_assessment::{
    AssessmentState, CertificationAssessment, NewCertificationAssessment,
};
use certification_scoring::models::certification_challenge::CertificationChallenge;
use certification_scoring::models::certification_issue_report::{
    CertificationIssueReport, CertificationIssueReportCategory, CertificationIssueReportSubcategory,
    NewCertificationIssueReport,
};
use certification_scoring::models::certification_report::CertificationReport;
use certification_scoring::models::competence_mark::CompetenceMark;
use certification_scoring::models::placement_profile::{PlacementProfile, UserCompetence};
use certification_scoring::models::session::{FinalizeSession, Session};
use certification_scoring::repositories::{
    AssessmentResultRepository, CertificationAssessmentRepository, CertificationIssueReportRepository,
    CertificationReportRepository, CompetenceMarkRepository, PlacementProfileService, SessionRepository,
};
use certification_scoring::services::finalization_service::FinalizationService;
use certification_scoring::services::rescoring_service::RescoringService;
use certification_scoring::services::scoring_service::ScoringService;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const SESSION_ID: i64 = 1;
pub const COURSE_ID: i64 = 10;
pub const USER_ID: i64 = 100;
pub const ASSESSMENT_ID: i64 = 1000;

pub fn scoring_config() -> ScoringConfig {
    ScoringConfig {
        minimum_reproducibility_rate_to_be_certified: Decimal::from(50),
        minimum_reproducibility_rate_to_be_trusted: Decimal::from(80),
        partner_min_percentage: Decimal::from(75),
        pix_count_by_level: 8,
        max_reachable_level: 5,
    }
}

/// Rows kept in memory, shared by every repository of a test.
#[derive(Default)]
pub struct InMemoryStore {
    pub sessions: Mutex<HashMap<i64, Session>>,
    pub finalized_reports: Mutex<Vec<CertificationReport>>,
    pub issue_reports: Mutex<HashMap<i64, Vec<CertificationIssueReport>>>,
    pub assessments: Mutex<HashMap<i64, CertificationAssessment>>,
    pub assessment_results: Mutex<Vec<AssessmentResult>>,
    pub competence_marks: Mutex<Vec<CompetenceMark>>,
    pub user_competences: Mutex<HashMap<i64, Vec<UserCompetence>>>,
    pub assessment_fetches: Mutex<usize>,
}

impl InMemoryStore {
    pub fn with_session() -> Arc<Self> {
        let store = Self::default();
        store.sessions.lock().unwrap().insert(
            SESSION_ID,
            Session {
                id: SESSION_ID,
                certification_center_id: 5,
                certification_center: "Centre des Anne-Etoile".to_string(),
                address: Some("1 rue de la Paix".to_string()),
                room: Some("B12".to_string()),
                examiner: Some("Ada".to_string()),
                date: NaiveDate::from_ymd_opt(2021, 6, 1).unwrap(),
                time: NaiveTime::from_hms_opt(14, 30, 0).unwrap(),
                description: None,
                access_code: "FMKP39".to_string(),
                examiner_global_comment: None,
                finalized_at: None,
                published_at: None,
                results_sent_to_prescriber_at: None,
                assigned_certification_officer_id: None,
            },
        );
        Arc::new(store)
    }

    pub fn add_assessment(&self, assessment: CertificationAssessment) {
        self.assessments
            .lock()
            .unwrap()
            .insert(assessment.certification_course_id, assessment);
    }

    pub fn add_issue_report(&self, report: CertificationIssueReport) {
        self.issue_reports
            .lock()
            .unwrap()
            .entry(report.certification_course_id)
            .or_default()
            .push(report);
    }

    pub fn set_user_competences(&self, user_id: i64, competences: Vec<UserCompetence>) {
        self.user_competences.lock().unwrap().insert(user_id, competences);
    }

    pub fn session(&self) -> Session {
        self.sessions.lock().unwrap()[&SESSION_ID].clone()
    }

    pub fn assessment(&self, certification_course_id: i64) -> CertificationAssessment {
        self.assessments.lock().unwrap()[&certification_course_id].clone()
    }

    pub fn marks_for(&self, assessment_result_id: i64) -> Vec<CompetenceMark> {
        self.competence_marks
            .lock()
            .unwrap()
            .iter()
            .filter(|m| m.assessment_result_id == assessment_result_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl SessionRepository for InMemoryStore {
    async fn is_finalized(&self, session_id: i64) -> Result<bool> {
        self.sessions
            .lock()
            .unwrap()
            .get(&session_id)
            .map(|s| s.is_finalized())
            .ok_or_else(|| Error::NotFound(format!("session {}", session_id)))
    }

    async fn finalize(&self, finalization: FinalizeSession) -> Result<Session> {
        let mut sessions = self.sessions.lock().unwrap();
        let session = sessions
            .get_mut(&finalization.id)
            .ok_or_else(|| Error::NotFound(format!("session {}", finalization.id)))?;
        if session.finalized_at.is_some() {
            return Err(Error::SessionAlreadyFinalized);
        }
        session.examiner_global_comment = finalization.examiner_global_comment;
        session.finalized_at = Some(finalization.finalized_at);
        Ok(session.clone())
    }
}

#[async_trait]
impl CertificationReportRepository for InMemoryStore {
    async fn finalize_all(&self, reports: &[CertificationReport]) -> Result<()> {
        self.finalized_reports.lock().unwrap().extend_from_slice(reports);
        Ok(())
    }
}

#[async_trait]
impl CertificationIssueReportRepository for InMemoryStore {
    async fn find_by_certification_course_id(
        &self,
        certification_course_id: i64,
    ) -> Result<Vec<CertificationIssueReport>> {
        Ok(self
            .issue_reports
            .lock()
            .unwrap()
            .get(&certification_course_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl CertificationAssessmentRepository for InMemoryStore {
    async fn get_by_certification_course_id(
        &self,
        certification_course_id: i64,
    ) -> Result<CertificationAssessment> {
        *self.assessment_fetches.lock().unwrap() += 1;
        self.assessments
            .lock()
            .unwrap()
            .get(&certification_course_id)
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("assessment for certification course {}", certification_course_id)))
    }

    async fn save(&self, assessment: &CertificationAssessment) -> Result<()> {
        self.add_assessment(assessment.clone());
        Ok(())
    }
}

#[async_trait]
impl AssessmentResultRepository for InMemoryStore {
    async fn save(&self, result: NewAssessmentResult) -> Result<AssessmentResult> {
        let mut results = self.assessment_results.lock().unwrap();
        let saved = AssessmentResult {
            id: results.len() as i64 + 1,
            assessment_id: result.assessment_id,
            pix_score: result.pix_score,
            status: result.status,
            emitter: result.emitter,
            jury_id: result.jury_id,
            comment_for_jury: result.comment_for_jury,
            // Strictly increasing so that history order is deterministic.
            created_at: base_time() + Duration::seconds(results.len() as i64 + 1),
        };
        results.push(saved.clone());
        Ok(saved)
    }

    async fn find_history_by_assessment_id(&self, assessment_id: i64) -> Result<AssessmentResultHistory> {
        Ok(AssessmentResultHistory::new(
            self.assessment_results
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.assessment_id == assessment_id)
                .cloned()
                .collect(),
        ))
    }
}

#[async_trait]
impl CompetenceMarkRepository for InMemoryStore {
    async fn save(&self, mark: CompetenceMark) -> Result<CompetenceMark> {
        let mut marks = self.competence_marks.lock().unwrap();
        let saved = CompetenceMark {
            id: Some(marks.len() as i64 + 1),
            ..mark
        };
        marks.push(saved.clone());
        Ok(saved)
    }
}

#[async_trait]
impl PlacementProfileService for InMemoryStore {
    async fn get_placement_profile(&self, user_id: i64, limit_date: DateTime<Utc>) -> Result<PlacementProfile> {
        Ok(PlacementProfile {
            user_id,
            profile_date: limit_date,
            user_competences: self
                .user_competences
                .lock()
                .unwrap()
                .get(&user_id)
                .cloned()
                .unwrap_or_default(),
        })
    }
}

pub fn base_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2021-06-01T14:30:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

pub fn finalization_service(store: &Arc<InMemoryStore>) -> FinalizationService {
    FinalizationService::new(store.clone(), store.clone(), store.clone(), store.clone())
}

pub fn rescoring_service(store: &Arc<InMemoryStore>) -> RescoringService {
    RescoringService::new(
        store.clone(),
        store.clone(),
        store.clone(),
        Arc::new(ScoringService::new(store.clone(), scoring_config())),
    )
}

/// Builds a completed v2 assessment; each entry is (competence id, answer).
pub fn completed_assessment(challenges: &[(&str, AnswerStatus)]) -> CertificationAssessment {
    let certification_challenges = challenges
        .iter()
        .enumerate()
        .map(|(idx, (competence_id, _))| CertificationChallenge {
            id: idx as i64 + 1,
            question_number: idx as u32 + 1,
            challenge_id: format!("rec{}", idx + 1),
            competence_id: competence_id.to_string(),
            associated_skill_name: format!("@skill{}", idx + 1),
            is_neutralized: false,
        })
        .collect();
    let certification_answers_by_date = challenges
        .iter()
        .enumerate()
        .map(|(idx, (_, result))| CertificationAnswer {
            id: idx as i64 + 1,
            challenge_id: format!("rec{}", idx + 1),
            result: *result,
        })
        .collect();

    CertificationAssessment::new(NewCertificationAssessment {
        id: ASSESSMENT_ID,
        user_id: USER_ID,
        certification_course_id: COURSE_ID,
        created_at: base_time(),
        completed_at: Some(base_time() + Duration::minutes(45)),
        state: AssessmentState::Completed,
        is_v2_certification: true,
        certification_challenges,
        certification_answers_by_date,
    })
    .expect("valid assessment")
}

pub fn user_competence(competence_id: &str, estimated_level: i32, pix_score: i32) -> UserCompetence {
    UserCompetence {
        competence_id: competence_id.to_string(),
        area_code: competence_id.chars().last().unwrap_or('1').to_string(),
        estimated_level,
        pix_score,
    }
}

pub fn in_challenge_report(
    subcategory: CertificationIssueReportSubcategory,
    question_number: u32,
) -> CertificationIssueReport {
    CertificationIssueReport::new(NewCertificationIssueReport {
        id: None,
        certification_course_id: COURSE_ID,
        category: CertificationIssueReportCategory::InChallenge,
        subcategory: Some(subcategory),
        description: None,
        question_number: Some(question_number),
    })
    .expect("valid issue report")
}

pub fn certification_report(has_seen_end_test_screen: Option<bool>) -> CertificationReport {
    CertificationReport {
        certification_course_id: COURSE_ID,
        first_name: "Katherine".to_string(),
        last_name: "Johnson".to_string(),
        examiner_comment: None,
        has_seen_end_test_screen,
        certification_issue_reports: vec![],
    }
}
