use crate::domain::value_objects::SurveyorId;

/// Supplies the authenticated surveyor identity at sync time. Offline-created
/// records carry no owner; the orchestrator resolves one per pass and aborts
/// the pass (records stay queued) when no session is active.
pub trait SessionProvider: Send + Sync {
    fn current_surveyor(&self) -> Option<SurveyorId>;
}
