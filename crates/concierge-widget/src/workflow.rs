//! Action Workflow Engine
//!
//! Bridges an assistant-triggered action id to a rendered form. Sensitive
//! actions are gated behind guest verification; successful submissions may
//! chain into further steps that carry a [`FlowContext`](crate::actions::FlowContext).
//!
//! ```text
//! Idle --trigger--> Showing --submit--> Submitting --ok+nextStep--> Showing
//!   |                                       |--ok--> Idle
//!   |                                       |--retryable--> Showing
//!   |                                       '--terminal/network--> Idle
//!   '--gated trigger--> Gating --verified--> Replaying --delay--> Showing
//! ```
//! Cancel returns to `Idle` from every state.

pub mod engine;

pub use engine::WorkflowEngine;

use crate::actions::{ActionDefinition, ActionResult};
use crate::error::Result;
use crate::forms::FormModel;
use crate::scheduler::TaskHandle;
use crate::session::VerificationStatus;

/// Session accessors the engine reads at the point of use
pub trait SessionView {
    /// Current verification status
    fn verification_status(&self) -> VerificationStatus;

    /// Current bearer token, if a session exists
    fn session_token(&self) -> Option<String>;
}

/// Deferred input for the engine's loop
#[derive(Debug)]
pub enum WorkflowEvent {
    /// Verification-replay delay elapsed
    ReplayDue {
        /// Replay this event belongs to
        ticket: u64,
    },
    /// A submission finished
    SubmissionFinished {
        /// Submission this event belongs to
        ticket: u64,
        /// Backend verdict or transport failure
        outcome: Result<ActionResult>,
    },
    /// An action list fetch finished
    ActionsFetched {
        /// Locale the fetch was made for
        locale: String,
        /// Definitions or failure
        result: Result<Vec<ActionDefinition>>,
    },
}

/// Where the engine is in a flow
///
/// Pending action and flow context live inside the variants that need them,
/// so e.g. a pending action without a visible verification form cannot exist.
#[derive(Debug, Default)]
pub enum WorkflowState {
    /// No form shown
    #[default]
    Idle,
    /// Verification form shown, `pending` waits for it
    Gating {
        /// Action to replay after verification
        pending: String,
        /// Verification form (possibly a chained step of it)
        form: FormModel,
    },
    /// Action form shown
    Showing {
        /// The form, carrying the flow context
        form: FormModel,
    },
    /// Submission in flight
    Submitting {
        /// Form being submitted (submit control disabled)
        form: FormModel,
        /// Action to replay if this is a verification submission
        pending: Option<String>,
        /// Trigger that arrived while submitting; handled after the outcome
        queued: Option<String>,
        /// Submission id
        ticket: u64,
        /// The request task
        request: TaskHandle,
    },
    /// Verification done, waiting before showing the requested action
    Replaying {
        /// Action to show
        action_id: String,
        /// Replay id
        ticket: u64,
        /// The delay timer
        timer: TaskHandle,
    },
}

impl WorkflowState {
    /// Short name for logs and assertions
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            WorkflowState::Idle => "idle",
            WorkflowState::Gating { .. } => "gating",
            WorkflowState::Showing { .. } => "showing",
            WorkflowState::Submitting { .. } => "submitting",
            WorkflowState::Replaying { .. } => "replaying",
        }
    }

    /// Whether no flow is active
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, WorkflowState::Idle)
    }
}
