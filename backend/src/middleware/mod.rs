//! Request middleware.
//!
//! Purpose: request lifecycle concerns shared by every route, currently
//! request correlation.

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, RequestId, RequestIdentity};
