//! Application-provided search engines.
//!
//! An [`AppProvidedEngine`] is built from an [`EngineConfig`] and owns an
//! [`IconBinding`] that resolves its icon through a shared
//! [`seicon_cache::IconHandler`]. The [`EngineRegistry`] tells the handler
//! which engines are alive so refreshed icons can be pushed to them.

pub mod config;
pub mod engine;
pub mod error;
pub mod icon;
pub mod registry;
pub mod url;

pub use config::{EngineConfig, ParamConfig, UrlConfig, WebExtension};
pub use engine::{AppProvidedEngine, EngineEvent, EngineSettings};
pub use error::{EngineError, EngineResult};
pub use icon::{IconBinding, IconFuture};
pub use registry::EngineRegistry;
pub use url::{EngineUrl, ParamValue, Submission, UrlParam, UrlType};
