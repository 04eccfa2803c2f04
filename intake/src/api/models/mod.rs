//! API request and response data models.
//!
//! - [`echo`]: payload accepted and returned by the echo endpoint
//! - [`downloads`]: download query parameters

pub mod downloads;
pub mod echo;
