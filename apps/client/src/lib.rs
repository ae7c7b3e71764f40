//! Client side of the careers intake pipeline.
//!
//! `FormState` holds what the applicant has entered, `encode` freezes it into a
//! wire payload, and `SubmissionClient` / `FormController` deliver it to
//! `POST /contact` and track the outcome.

pub mod encode;
pub mod form;
pub mod transport;

pub use encode::{encode, EncodedSubmission};
pub use form::{
    ApplicationFields, Education, Experience, FormError, FormState, NoticePeriod, ResumeFile,
};
pub use transport::{Acknowledgement, FormController, SubmissionClient, SubmitError, SubmitStatus};
