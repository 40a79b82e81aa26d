pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod repositories;
pub mod services;
pub mod utils;

use crate::config::ScoringConfig;
use crate::database::unit_of_work::PgUnitOfWork;
use crate::error::Result;
use crate::models::certification_report::CertificationReport;
use crate::models::events::{ChallengeNeutralizationChanged, DomainEvent, SessionFinalized};
use crate::repositories::postgres::{
    PgAssessmentResultRepository, PgBadgeAcquisitionRepository, PgCertificationAssessmentRepository,
    PgCertificationIssueReportRepository, PgCertificationReportRepository, PgCompetenceMarkRepository,
    PgPartnerCertificationRepository, PgPartnerCompetenceRepository, PgPlacementProfileService,
    PgSessionRepository,
};
use crate::services::{
    event_queue_service::EventQueueService,
    finalization_service::FinalizationService,
    neutralization_service::NeutralizationService,
    partner_scoring_service::PartnerCertificationService,
    rescoring_service::{RescoringOutcome, RescoringService},
    scoring_service::ScoringService,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::info;

/// Services bound to one unit of work.
struct UnitOfWorkServices {
    finalization: FinalizationService,
    neutralization: NeutralizationService,
    rescoring: RescoringService,
    partner_scoring: PartnerCertificationService,
}

impl UnitOfWorkServices {
    fn new(uow: &PgUnitOfWork, scoring_config: &ScoringConfig) -> Self {
        let assessments = Arc::new(PgCertificationAssessmentRepository::new(uow.clone()));
        let scoring = Arc::new(ScoringService::new(
            Arc::new(PgPlacementProfileService::new(uow.clone())),
            scoring_config.clone(),
        ));

        Self {
            finalization: FinalizationService::new(
                Arc::new(PgSessionRepository::new(uow.clone())),
                Arc::new(PgCertificationReportRepository::new(uow.clone())),
                Arc::new(PgCertificationIssueReportRepository::new(uow.clone())),
                assessments.clone(),
            ),
            neutralization: NeutralizationService::new(assessments.clone()),
            rescoring: RescoringService::new(
                assessments,
                Arc::new(PgAssessmentResultRepository::new(uow.clone())),
                Arc::new(PgCompetenceMarkRepository::new(uow.clone())),
                scoring,
            ),
            partner_scoring: PartnerCertificationService::new(
                Arc::new(PgBadgeAcquisitionRepository::new(uow.clone())),
                Arc::new(PgPartnerCompetenceRepository::new(uow.clone())),
                Arc::new(PgPartnerCertificationRepository::new(uow.clone())),
                scoring_config.clone(),
            ),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub scoring_config: ScoringConfig,
    pub event_queue_service: EventQueueService,
}

impl AppState {
    pub fn new(pool: PgPool, scoring_config: ScoringConfig) -> Self {
        let event_queue_service = EventQueueService::new(pool.clone());
        Self {
            pool,
            scoring_config,
            event_queue_service,
        }
    }

    pub async fn finalize_session(
        &self,
        session_id: i64,
        examiner_global_comment: Option<String>,
        certification_reports: Vec<CertificationReport>,
    ) -> Result<SessionFinalized> {
        let uow = PgUnitOfWork::begin(&self.pool).await?;
        let services = UnitOfWorkServices::new(&uow, &self.scoring_config);

        let event = services
            .finalization
            .finalize_session(session_id, examiner_global_comment, certification_reports)
            .await?;
        self.event_queue_service
            .enqueue(&uow, &DomainEvent::SessionFinalized(event.clone()))
            .await?;

        uow.commit().await?;
        Ok(event)
    }

    /// Neutralizes a challenge and rescores the certification in the same
    /// transaction.
    pub async fn neutralize_challenge(
        &self,
        certification_course_id: i64,
        challenge_id: &str,
        jury_id: Option<i64>,
    ) -> Result<RescoringOutcome> {
        let uow = PgUnitOfWork::begin(&self.pool).await?;
        let services = UnitOfWorkServices::new(&uow, &self.scoring_config);

        let event = services
            .neutralization
            .neutralize_challenge(certification_course_id, challenge_id, jury_id)
            .await?;
        let outcome = self.rescore_within(&uow, &services, &event).await?;

        uow.commit().await?;
        Ok(outcome)
    }

    pub async fn deneutralize_challenge(
        &self,
        certification_course_id: i64,
        challenge_id: &str,
        jury_id: Option<i64>,
    ) -> Result<RescoringOutcome> {
        let uow = PgUnitOfWork::begin(&self.pool).await?;
        let services = UnitOfWorkServices::new(&uow, &self.scoring_config);

        let event = services
            .neutralization
            .deneutralize_challenge(certification_course_id, challenge_id, jury_id)
            .await?;
        let outcome = self.rescore_within(&uow, &services, &event).await?;

        uow.commit().await?;
        Ok(outcome)
    }

    /// Rescores after a neutralization change recorded elsewhere.
    pub async fn rescore(&self, event: &ChallengeNeutralizationChanged) -> Result<RescoringOutcome> {
        let uow = PgUnitOfWork::begin(&self.pool).await?;
        let services = UnitOfWorkServices::new(&uow, &self.scoring_config);

        let outcome = self.rescore_within(&uow, &services, event).await?;

        uow.commit().await?;
        Ok(outcome)
    }

    async fn rescore_within(
        &self,
        uow: &PgUnitOfWork,
        services: &UnitOfWorkServices,
        event: &ChallengeNeutralizationChanged,
    ) -> Result<RescoringOutcome> {
        let outcome = services.rescoring.handle_rescoring(event).await?;

        if let RescoringOutcome::Scored {
            user_id,
            certification_course_id,
            score,
            ..
        } = &outcome
        {
            services
                .partner_scoring
                .score(*certification_course_id, *user_id, score)
                .await?;
        }
        if let Some(completed) = outcome.completed_event() {
            self.event_queue_service
                .enqueue(uow, &DomainEvent::CertificationRescoringCompleted(completed))
                .await?;
        }
        Ok(outcome)
    }

    /// Handles one event taken from the outbox.
    pub async fn dispatch(&self, event: &DomainEvent) -> Result<()> {
        match event {
            DomainEvent::ChallengeNeutralizationChanged(changed) => {
                self.rescore(changed).await?;
            }
            DomainEvent::SessionFinalized(finalized) => {
                info!(
                    session_id = finalized.session_id,
                    certification_center = %finalized.certification_center_name,
                    finalized_at = %finalized.finalized_at,
                    has_examiner_global_comment = finalized.has_examiner_global_comment,
                    "Session finalized, ready for jury review"
                );
            }
            DomainEvent::CertificationRescoringCompleted(completed) => {
                info!(
                    certification_course_id = completed.certification_course_id,
                    user_id = completed.user_id,
                    reproducibility_rate = %completed.reproducibility_rate,
                    is_validated = completed.is_validated,
                    "Certification rescoring completed"
                );
            }
        }
        Ok(())
    }
}
