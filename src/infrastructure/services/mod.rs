//! Infrastructure services

mod completion_service;
mod orchestrator;
mod profile_service;
mod recommendation_service;
mod session;
mod vision_service;

pub use completion_service::{CompletionClient, FragmentStream};
pub use orchestrator::{AiOrchestrator, OrchestratorSettings, ScanOutcome};
pub use profile_service::ProfileService;
pub use recommendation_service::RecommendationService;
pub use session::SessionContext;
pub use vision_service::VisionService;
