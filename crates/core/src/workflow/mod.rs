//! Budget entry workflow.
//!
//! This module implements the entry lifecycle state machine, the edit
//! policy for stored amounts, and the history views built from the audit log.
//!
//! # Modules
//!
//! - `types` - Transitions and the actions they produce
//! - `error` - Workflow-specific error types
//! - `service` - State transition logic, single and batch
//! - `edit` - Who may change which amounts
//! - `window` - Business-day deadline for approved entries
//! - `history` - Submission and rejection views

pub mod edit;
pub mod error;
pub mod history;
pub mod service;
pub mod types;
pub mod window;

#[cfg(test)]
mod service_props;
#[cfg(test)]
mod window_props;

pub use edit::{EditDecision, EditMode, EditPolicy, EditRequest, EntrySnapshot};
pub use error::WorkflowError;
pub use history::{EntryRef, LogRecord, RejectionGroup, SubmissionBatch};
pub use service::WorkflowService;
pub use types::{BatchOutcome, DEFAULT_REJECTION_REASON, Transition, WorkflowAction};
pub use window::EditWindow;
