pub mod answer;
pub mod assessment_result;
pub mod badge_acquisition;
pub mod certification_assessment;
pub mod certification_assessment_score;
pub mod certification_challenge;
pub mod certification_issue_report;
pub mod certification_report;
pub mod certified_level;
pub mod competence_mark;
pub mod events;
pub mod partner_certification_scoring;
pub mod placement_profile;
pub mod session;
