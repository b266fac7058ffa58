//! Swipe-based job matching: feed supply, the swipe session state machine, gesture
//! interpretation, application recording and asynchronous match score refinement.
//!
//! Callers pass the candidate and the store handles explicitly; nothing here reads
//! ambient user or store state.

pub mod domain;
pub mod feed;
pub mod gesture;
pub mod import;
pub mod recorder;
pub mod refiner;
pub mod repository;
pub mod review;
pub mod router;
pub mod scoring;
pub mod seed;
pub mod service;
pub mod session;

#[cfg(test)]
mod tests;

pub use domain::{
    Application, ApplicationId, ApplicationPatch, ApplicationStatus, CandidateId,
    CandidateProfile, CompanyId, ExperienceLevel, Job, JobId, JobLocation, MatchScore,
    MatchTier, NewApplication, RecruiterId, RoleType, SalaryRange, SwipeDirection,
};
pub use feed::{assemble_feed, Feed, FeedError, FeedSource, JobFeedSupplier};
pub use gesture::{CardFeedback, GestureDecision, GestureInterpreter, GestureThresholds};
pub use import::{JobCsvImporter, JobImportError};
pub use recorder::{ApplicationRecorder, RecorderConfig, RecorderError, RecordingHandle};
pub use refiner::{
    CompletionClient, CompletionError, HttpCompletionClient, MatchScoreRefiner, RefineError,
    RefineOutcome, RefineRequest, RefinedScore, RefinerConfig,
};
pub use repository::{
    ApplicationRepository, JobRepository, Notification, NotificationKind, Notifier,
    NotifyError, RepositoryError, SilentNotifier,
};
pub use review::{ApplicantView, ApplicationReview, ReviewError};
pub use router::swipe_router;
pub use scoring::{MatchScorer, RandomBandScorer, SkillOverlapScorer};
pub use service::{
    DragView, PipelineHandle, PipelineOutcome, SessionId, SessionSnapshot, SwipeReceipt,
    SwipeService, SwipeServiceError, SwipeSettings,
};
pub use session::{
    CommitOutcome, ReleaseOutcome, SessionError, SessionEvent, SessionObserver, SessionState,
    SwipeEntry, SwipeSession, UndoOutcome,
};
