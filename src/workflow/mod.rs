mod navigator;
mod progress;
mod session;
mod status;

pub use navigator::SequenceNavigator;
pub use progress::{ProgressEstimator, ProgressSnapshot};
pub use session::{BatchSession, RenamePolicy, VisitEntry};
pub use status::{FinishOutcome, SessionStatus, StateMachine, VisitStatus};
