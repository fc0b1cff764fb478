//! Batch inspection workflow engine.
//!
//! An operator walks an ordered round of hives within one apiary visit,
//! completing or deferring each one, while the engine tracks the session's
//! status and estimates the remaining work. Sessions are plain values: load
//! one from a [`store::SessionStore`], apply an operation, persist it back.

pub mod config;
pub mod error;
pub mod service;
pub mod sites;
pub mod store;
pub mod workflow;

pub use error::{Result, WorkflowError};
