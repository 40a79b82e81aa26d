pub mod event_queue_service;
pub mod finalization_service;
pub mod neutralization_service;
pub mod partner_scoring_service;
pub mod rescoring_service;
pub mod scoring_service;
