pub mod models;
pub mod session;
pub mod submission;
pub mod wizard;

pub use models::{BookingRecord, BookingSelection};
pub use session::BookingSession;
pub use submission::{BookingError, BookingSubmitter};
pub use wizard::{ApplyOutcome, BookingWizard, FetchTicket, WizardError, WizardStep};
