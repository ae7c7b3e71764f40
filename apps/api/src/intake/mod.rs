// Submission intake pipeline.
// Decode → stage attachment → validate → compose → dispatch. The staged file is
// owned by the request and removed when the handler returns, on every path.

pub mod compose;
pub mod dispatch;
pub mod handlers;
pub mod payload;
pub mod staging;
pub mod validation;
