//! Application tracking: the status state machine, the service applying it
//! against the store, and its HTTP handlers.

pub mod handlers;
pub mod service;
pub mod state_machine;

pub use service::TrackingService;
