pub mod api;
pub mod submission;

pub use api::{ApiClient, ApiError};
pub use submission::{BookingConfirmation, CardDetails, ProcessingPhase, SubmissionError};
