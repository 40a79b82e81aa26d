pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Cannot finalize session more than once")]
    SessionAlreadyFinalized,

    #[error("Invalid certification report for finalization: {0}")]
    InvalidCertificationReportForFinalization(String),

    #[error("Invalid certification issue report: {0}")]
    InvalidCertificationIssueReport(String),

    #[error("Certification issue report subcategory is deprecated")]
    DeprecatedCertificationIssueReportSubcategory,

    #[error("Invalid certification assessment: {0}")]
    InvalidCertificationAssessment(String),

    #[error("Candidate is not eligible to the partner certification")]
    NotEligibleCandidate,

    #[error("Certification could not be computed: {0}")]
    CertificationCompute(String),

    #[error("Challenge to be neutralized not found: {0}")]
    ChallengeToBeNeutralizedNotFound(String),

    #[error("Challenge to be deneutralized not found: {0}")]
    ChallengeToBeDeneutralizedNotFound(String),
}

impl Error {
    /// Expected outcomes of the domain, as opposed to infrastructure failures.
    pub fn is_domain_error(&self) -> bool {
        !matches!(
            self,
            Error::Config(_)
                | Error::NotFound(_)
                | Error::Database(_)
                | Error::Migrate(_)
                | Error::Json(_)
                | Error::Internal(_)
        )
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}
