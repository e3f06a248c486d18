//! Workflow engine implementation

use std::mem;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::{SessionView, WorkflowEvent, WorkflowState};
use crate::actions::{ActionDefinition, ActionRegistry, ActionResult, FlowContext};
use crate::config::WidgetConfig;
use crate::error::{Error, Result};
use crate::forms::{FormEditError, FormModel};
use crate::scheduler::{Scheduler, TaskHandle};
use crate::ui::{UiCommand, UiSender, WidgetStrings};

/// Orchestrates verification gating, forms, submission and step chaining
pub struct WorkflowEngine {
    registry: ActionRegistry,
    verification_action_id: String,
    replay_delay: Duration,
    ui: UiSender,
    scheduler: Scheduler<WorkflowEvent>,
    state: WorkflowState,
    fetch: Option<TaskHandle>,
    next_ticket: u64,
}

impl WorkflowEngine {
    /// Create an idle engine; deferred work is posted to `events_tx`
    pub fn new(
        config: &WidgetConfig,
        registry: ActionRegistry,
        ui: UiSender,
        events_tx: mpsc::UnboundedSender<WorkflowEvent>,
    ) -> Self {
        Self {
            registry,
            verification_action_id: config.verification_action_id.clone(),
            replay_delay: config.replay_delay(),
            ui,
            scheduler: Scheduler::new(events_tx),
            state: WorkflowState::Idle,
            fetch: None,
            next_ticket: 0,
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    /// Action waiting for verification, if any
    #[must_use]
    pub fn pending_action(&self) -> Option<&str> {
        match &self.state {
            WorkflowState::Gating { pending, .. } => Some(pending),
            WorkflowState::Submitting { pending, .. } => pending.as_deref(),
            _ => None,
        }
    }

    /// Form currently shown or being submitted
    #[must_use]
    pub fn active_form(&self) -> Option<&FormModel> {
        match &self.state {
            WorkflowState::Gating { form, .. }
            | WorkflowState::Showing { form }
            | WorkflowState::Submitting { form, .. } => Some(form),
            _ => None,
        }
    }

    /// Context of the active flow step, if any
    #[must_use]
    pub fn flow_context(&self) -> Option<&FlowContext> {
        self.active_form().map(FormModel::context)
    }

    /// Number of timers and requests that can still deliver an event
    #[must_use]
    pub fn pending_tasks(&self) -> usize {
        let state_task = match &self.state {
            WorkflowState::Submitting { request, .. } => Some(request),
            WorkflowState::Replaying { timer, .. } => Some(timer),
            _ => None,
        };
        [state_task, self.fetch.as_ref()]
            .into_iter()
            .flatten()
            .filter(|t| t.is_pending())
            .count()
    }

    /// Action registry
    #[must_use]
    pub fn registry(&self) -> &ActionRegistry {
        &self.registry
    }

    /// Mutable action registry
    pub fn registry_mut(&mut self) -> &mut ActionRegistry {
        &mut self.registry
    }

    /// Start refreshing the action cache in the background
    pub fn refresh_actions(&mut self) {
        let backend = self.registry.backend();
        let locale = self.registry.locale().to_string();
        self.fetch = Some(self.scheduler.spawn(async move {
            let result = backend.fetch_actions(&locale).await;
            WorkflowEvent::ActionsFetched { locale, result }
        }));
    }

    /// Switch locale: swap built-in strings when available and refetch actions
    pub fn set_locale(&mut self, locale: &str) {
        info!(locale, "Switching widget locale");
        self.registry.set_locale(locale);
        if let Some(strings) = WidgetStrings::for_locale(locale) {
            self.registry.set_strings(strings);
        }
        self.refresh_actions();
    }

    /// An action was triggered (usually by the assistant)
    pub fn handle_action_trigger(&mut self, action_id: &str, session: &dyn SessionView) {
        if let WorkflowState::Submitting { queued, .. } = &mut self.state {
            debug!(action_id, "Queueing trigger behind in-flight submission");
            *queued = Some(action_id.to_string());
            return;
        }

        let Some(action) = self.registry.get_action(action_id).cloned() else {
            debug!(action_id, "Ignoring trigger for unknown action");
            return;
        };

        if action.requires_verification && !session.verification_status().is_verified() {
            self.gate(action);
        } else {
            self.open(action, FlowContext::new());
        }
    }

    /// Verification finished outside a submission (a `session_update`)
    pub fn on_verification_complete(&mut self) {
        let pending = match &mut self.state {
            WorkflowState::Gating { pending, .. } => mem::take(pending),
            // The submission outcome decides; see `finish_submission`.
            _ => return,
        };
        info!(action_id = %pending, "Verification complete, replaying pending action");
        self.emit(UiCommand::HideForm);
        self.schedule_replay(pending);
    }

    /// Edit a field of the visible form
    pub fn set_field(&mut self, key: &str, value: &str) -> std::result::Result<(), FormEditError> {
        let form = match &mut self.state {
            WorkflowState::Gating { form, .. } | WorkflowState::Showing { form } => form,
            _ => return Err(FormEditError::NotEditable),
        };
        form.set_value(key, value)?;
        let view = form.view(self.registry.strings());
        self.emit(UiCommand::UpdateForm { form: view });
        Ok(())
    }

    /// Submit the visible form
    pub fn submit(&mut self, session: &dyn SessionView) {
        let (mut form, pending) = match mem::take(&mut self.state) {
            WorkflowState::Gating { pending, form } => (form, Some(pending)),
            WorkflowState::Showing { form } => (form, None),
            other => {
                debug!(state = other.name(), "Ignoring submit without an editable form");
                self.state = other;
                return;
            }
        };

        let strings = self.registry.strings().clone();
        let values = match form.validate(&strings) {
            Ok(values) => values,
            Err(e) => {
                debug!(action_id = form.action_id(), field = %e.field, "Form validation failed");
                self.emit(UiCommand::UpdateForm {
                    form: form.view(&strings),
                });
                self.state = resting(form, pending);
                return;
            }
        };

        let Some(token) = session.session_token() else {
            warn!(action_id = form.action_id(), "Submit without an active session");
            self.emit(UiCommand::HideForm);
            self.system_message(Error::NoSession.user_message(&strings));
            return;
        };

        // Context wins over user input: its fields are read-only.
        let mut body = values;
        body.extend(form.context().clone());

        form.begin_submit();
        self.emit(UiCommand::UpdateForm {
            form: form.view(&strings),
        });

        let ticket = self.ticket();
        let backend = self.registry.backend();
        let action_id = form.action_id().to_string();
        info!(action_id = %action_id, ticket, "Submitting action");
        let request = self.scheduler.spawn(async move {
            let outcome = backend.submit_action(&action_id, &token, &body).await;
            WorkflowEvent::SubmissionFinished { ticket, outcome }
        });

        self.state = WorkflowState::Submitting {
            form,
            pending,
            queued: None,
            ticket,
            request,
        };
    }

    /// User cancelled the flow
    pub fn cancel(&mut self) {
        if self.state.is_idle() {
            return;
        }
        info!(state = self.state.name(), "Flow cancelled");
        self.state = WorkflowState::Idle;
        self.emit(UiCommand::HideForm);
    }

    /// Handle a deferred event
    pub fn handle_event(&mut self, event: WorkflowEvent, session: &dyn SessionView) {
        match event {
            WorkflowEvent::ReplayDue { ticket } => self.finish_replay(ticket),
            WorkflowEvent::SubmissionFinished { ticket, outcome } => {
                self.finish_submission(ticket, outcome, session)
            }
            WorkflowEvent::ActionsFetched { locale, result } => {
                self.fetch = None;
                self.registry.apply_fetch(&locale, result);
            }
        }
    }

    /// Drop every flow, timer and request without touching the view
    pub fn destroy(&mut self) {
        self.state = WorkflowState::Idle;
        self.fetch = None;
    }

    fn gate(&mut self, action: ActionDefinition) {
        let Some(verify) = self
            .registry
            .get_action(&self.verification_action_id)
            .cloned()
        else {
            warn!(
                action_id = %action.id,
                verification_action = %self.verification_action_id,
                "Verification action unavailable, cannot gate"
            );
            let text = self.registry.strings().verify_first.clone();
            self.system_message(text);
            return;
        };

        info!(action_id = %action.id, "Action requires verification");
        let text = self.registry.strings().verify_first.clone();
        self.system_message(text);

        let form = FormModel::new(verify.id, verify.name, verify.fields, FlowContext::new());
        self.show(&form);
        self.state = WorkflowState::Gating {
            pending: action.id,
            form,
        };
    }

    fn open(&mut self, action: ActionDefinition, context: FlowContext) {
        debug!(action_id = %action.id, "Showing action form");
        let form = FormModel::new(action.id, action.name, action.fields, context);
        self.show(&form);
        self.state = WorkflowState::Showing { form };
    }

    fn schedule_replay(&mut self, action_id: String) {
        let ticket = self.ticket();
        let timer = self
            .scheduler
            .once(self.replay_delay, WorkflowEvent::ReplayDue { ticket });
        self.state = WorkflowState::Replaying {
            action_id,
            ticket,
            timer,
        };
    }

    fn finish_replay(&mut self, ticket: u64) {
        let action_id = match &self.state {
            WorkflowState::Replaying {
                action_id,
                ticket: expected,
                ..
            } if *expected == ticket => action_id.clone(),
            _ => {
                debug!(ticket, "Ignoring stale replay");
                return;
            }
        };
        self.state = WorkflowState::Idle;

        // Verification just succeeded; never gate the replayed action again.
        match self.registry.get_action(&action_id).cloned() {
            Some(action) => self.open(action, FlowContext::new()),
            None => warn!(action_id = %action_id, "Pending action vanished before replay"),
        }
    }

    fn finish_submission(
        &mut self,
        ticket: u64,
        outcome: Result<ActionResult>,
        session: &dyn SessionView,
    ) {
        let (mut form, pending, queued) = match mem::take(&mut self.state) {
            WorkflowState::Submitting {
                form,
                pending,
                queued,
                ticket: expected,
                ..
            } if expected == ticket => (form, pending, queued),
            other => {
                debug!(ticket, state = other.name(), "Discarding stale submission outcome");
                self.state = other;
                return;
            }
        };

        form.finish_submit();
        let strings = self.registry.strings().clone();

        match outcome {
            Err(e) => {
                warn!(action_id = form.action_id(), error = %e, "Action submission failed");
                self.emit(UiCommand::HideForm);
                self.system_message(e.user_message(&strings));
            }
            Ok(result) if result.success => {
                self.finish_success(form, pending, result);
            }
            Ok(result) => {
                let terminal = result.is_terminal_failure();
                info!(
                    action_id = form.action_id(),
                    error = result.error.as_deref().unwrap_or(""),
                    terminal,
                    "Action rejected"
                );
                let text = if result.message.is_empty() {
                    strings.action_failed.clone()
                } else {
                    result.message
                };
                self.system_message(text);

                let verified = session.verification_status().is_verified();
                match pending {
                    _ if terminal => self.emit(UiCommand::HideForm),
                    // Verified through another path while this was in flight.
                    Some(pending) if verified => {
                        self.emit(UiCommand::HideForm);
                        self.schedule_replay(pending);
                    }
                    pending => {
                        self.show(&form);
                        self.state = resting(form, pending);
                    }
                }
            }
        }

        if let Some(action_id) = queued {
            self.handle_action_trigger(&action_id, session);
        }
    }

    fn finish_success(&mut self, form: FormModel, pending: Option<String>, result: ActionResult) {
        let ActionResult {
            message, next_step, ..
        } = result;

        if let Some(next) = next_step {
            debug!(action_id = form.action_id(), "Chaining next step");
            self.emit(UiCommand::HideForm);
            if !message.is_empty() {
                self.system_message(message);
            }
            let next_form =
                FormModel::new(form.action_id(), form.title(), next.fields, next.context);
            self.show(&next_form);
            self.state = resting(next_form, pending);
            return;
        }

        self.emit(UiCommand::HideForm);
        if !message.is_empty() {
            self.system_message(message);
        }

        match pending {
            Some(pending) if form.action_id() == self.verification_action_id => {
                info!(action_id = %pending, "Verified, replaying pending action");
                self.schedule_replay(pending);
            }
            _ => {
                info!(action_id = form.action_id(), "Flow completed");
                self.state = WorkflowState::Idle;
            }
        }
    }

    fn show(&self, form: &FormModel) {
        self.emit(UiCommand::ShowForm {
            form: form.view(self.registry.strings()),
        });
    }

    fn system_message(&self, text: String) {
        self.emit(UiCommand::SystemMessage { text });
    }

    fn emit(&self, command: UiCommand) {
        // A closed view just stops rendering.
        let _ = self.ui.send(command);
    }

    fn ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }
}

fn resting(form: FormModel, pending: Option<String>) -> WorkflowState {
    match pending {
        Some(pending) => WorkflowState::Gating { pending, form },
        None => WorkflowState::Showing { form },
    }
}
