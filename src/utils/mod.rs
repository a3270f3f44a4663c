//! Utility functions and helpers.

pub mod clock;
pub mod http;
pub mod text;

pub use clock::{Clock, ManualClock, SystemClock};
pub use http::{HttpFetch, HttpResponse, ReqwestFetch};
