//! Autosave of article drafts: debounced triggers, create-vs-update
//! reconciliation against the article gateway and the status the form renders.

pub mod reconciler;
pub mod scheduler;
pub mod session;
pub mod status;

pub use scheduler::DelayPolicy;
pub use session::{AuthoringSession, SaveError, SessionSnapshot};
pub use status::SaveIndicator;
