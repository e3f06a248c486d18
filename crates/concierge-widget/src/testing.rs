//! Test doubles shared by unit tests

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

use crate::actions::{ActionBackend, ActionDefinition, ActionField, ActionResult, FlowContext};
use crate::connection::{Connector, Transport, TransportEvents};
use crate::error::{Error, Result};
use crate::session::VerificationStatus;
use crate::workflow::SessionView;

/// Build an action definition
pub(crate) fn action(id: &str, requires_verification: bool, fields: Vec<ActionField>) -> ActionDefinition {
    ActionDefinition {
        id: id.to_string(),
        name: format!("{id} form"),
        trigger_hint: String::new(),
        requires_verification,
        fields,
    }
}

/// Successful result with a message
pub(crate) fn succeeded(message: &str) -> ActionResult {
    ActionResult {
        success: true,
        message: message.to_string(),
        data: None,
        error: None,
        next_step: None,
    }
}

/// Failed result with a message and code
pub(crate) fn failed(message: &str, code: &str) -> ActionResult {
    ActionResult {
        success: false,
        message: message.to_string(),
        data: None,
        error: Some(code.to_string()),
        next_step: None,
    }
}

/// One recorded submission
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Submission {
    pub action_id: String,
    pub token: String,
    pub body: FlowContext,
}

/// In-memory [`ActionBackend`] with scripted replies
#[derive(Default)]
pub(crate) struct StubBackend {
    actions: Mutex<Vec<ActionDefinition>>,
    fail_fetches: AtomicBool,
    fetched: Mutex<Vec<String>>,
    replies: Mutex<VecDeque<Result<ActionResult>>>,
    submissions: Mutex<Vec<Submission>>,
}

impl StubBackend {
    pub(crate) fn with_actions(actions: Vec<ActionDefinition>) -> Self {
        let backend = Self::default();
        *backend.actions.lock().unwrap() = actions;
        backend
    }

    pub(crate) fn fail_fetches(&self) {
        self.fail_fetches.store(true, Ordering::SeqCst);
    }

    pub(crate) fn fetched_locales(&self) -> Vec<String> {
        self.fetched.lock().unwrap().clone()
    }

    /// Queue the answer for the next submission
    pub(crate) fn reply(&self, result: ActionResult) {
        self.replies.lock().unwrap().push_back(Ok(result));
    }

    /// Queue a transport failure for the next submission
    pub(crate) fn reply_network_error(&self) {
        self.replies
            .lock()
            .unwrap()
            .push_back(Err(Error::Network("connection refused".to_string())));
    }

    pub(crate) fn submissions(&self) -> Vec<Submission> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl ActionBackend for StubBackend {
    async fn fetch_actions(&self, locale: &str) -> Result<Vec<ActionDefinition>> {
        self.fetched.lock().unwrap().push(locale.to_string());
        if self.fail_fetches.load(Ordering::SeqCst) {
            return Err(Error::Http { status: 503 });
        }
        Ok(self.actions.lock().unwrap().clone())
    }

    async fn submit_action(
        &self,
        action_id: &str,
        token: &str,
        body: &FlowContext,
    ) -> Result<ActionResult> {
        self.submissions.lock().unwrap().push(Submission {
            action_id: action_id.to_string(),
            token: token.to_string(),
            body: body.clone(),
        });
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(succeeded("")))
    }
}

/// Session fixture for engine tests
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeSession {
    pub token: Option<String>,
    pub status: VerificationStatus,
}

impl FakeSession {
    pub(crate) fn anonymous() -> Self {
        Self {
            token: Some("tok-1".to_string()),
            status: VerificationStatus::Anonymous,
        }
    }

    pub(crate) fn verified() -> Self {
        Self {
            token: Some("tok-1".to_string()),
            status: VerificationStatus::Verified,
        }
    }
}

impl SessionView for FakeSession {
    fn verification_status(&self) -> VerificationStatus {
        self.status
    }

    fn session_token(&self) -> Option<String> {
        self.token.clone()
    }
}

/// [`Connector`] that records every attempt and hands out in-memory transports
#[derive(Default, Clone)]
pub(crate) struct FakeConnector {
    opened: Arc<Mutex<Vec<(Url, TransportEvents)>>>,
    sent: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
}

impl FakeConnector {
    pub(crate) fn open_count(&self) -> usize {
        self.opened.lock().unwrap().len()
    }

    /// Reporter of the latest attempt, used to inject transport events
    pub(crate) fn last(&self) -> TransportEvents {
        self.opened.lock().unwrap().last().unwrap().1.clone()
    }

    pub(crate) fn last_url(&self) -> Url {
        self.opened.lock().unwrap().last().unwrap().0.clone()
    }

    /// Frames written to any transport, in order
    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

struct FakeTransport {
    sent: Arc<Mutex<Vec<String>>>,
    closes: Arc<AtomicUsize>,
}

impl Transport for FakeTransport {
    fn send(&mut self, text: String) -> Result<()> {
        self.sent.lock().unwrap().push(text);
        Ok(())
    }

    fn close(&mut self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}

impl Connector for FakeConnector {
    fn open(&self, url: Url, events: TransportEvents) -> Box<dyn Transport> {
        self.opened.lock().unwrap().push((url, events));
        Box::new(FakeTransport {
            sent: self.sent.clone(),
            closes: self.closes.clone(),
        })
    }
}
