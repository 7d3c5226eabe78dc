//! Middleware for the AUREV Guard API
//!
//! - **Request ids**: every request is tagged with an id that flows into
//!   logs, decision bundles and error bodies.

pub mod request_id;

pub use request_id::{assign_request_id, current_request_id, RequestId, REQUEST_ID_HEADER};
