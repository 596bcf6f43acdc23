//! Integration test common infrastructure.
//!
//! Provides a scripted terminal for driving whole sessions and a one-shot
//! HTTP responder standing in for a work item server.

pub mod http;
pub mod session;

#[allow(unused_imports)]
pub use http::{CannedServer, RecordedRequest};
#[allow(unused_imports)]
pub use session::{Capture, run_raw_script, run_script};
