//! Dynamics 365 Web API Module
//!
//! A versioned request client ([`RequestClient`]) that performs one HTTP round-trip
//! per call and classifies the response, plus convenience operations ([`WebApi`])
//! that fold every outcome into an [`ExecutionResult`].

pub mod client;
pub mod constants;
pub mod error;
pub mod identity;
pub mod notify;
pub mod operations;
pub mod request;
pub mod version;

pub use client::{ClientSettings, PreparedRequest, RequestClient};
pub use error::{ApiError, SdkError};
pub use identity::{CallerIdentity, NoCallerIdentity, StaticCallerId};
pub use notify::{ConsoleSink, LogSink, NotificationSink, SilentSink, select_sink};
pub use operations::{CallOptions, ExecutionResult, WebApi};
pub use request::{ExtraHeader, RawResponse, RequestDescriptor, Verb};
pub use version::{ApiVersion, ComponentError, VersionManager};
