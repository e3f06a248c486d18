use super::*;
use std::time::Duration;

use crate::actions::{ActionDefinition, ActionField};
use crate::session::MemorySessionStore;
use crate::testing::{action, succeeded, FakeConnector, StubBackend};
use crate::ui::WidgetStrings;

struct Harness {
    widget: Widget,
    handle: WidgetHandle,
    ui_rx: UiReceiver,
    connector: FakeConnector,
    backend: Arc<StubBackend>,
    store: Arc<MemorySessionStore>,
}

fn catalog() -> Vec<ActionDefinition> {
    vec![
        action(
            "verify-reservation",
            false,
            vec![
                ActionField::text("lastName", "Last name").required(),
                ActionField::text("roomNumber", "Room").required(),
            ],
        ),
        action(
            "book-spa",
            true,
            vec![ActionField::text("treatment", "Treatment").required()],
        ),
    ]
}

impl Harness {
    fn new() -> Self {
        Self::with_store(MemorySessionStore::new())
    }

    fn with_store(store: MemorySessionStore) -> Self {
        let connector = FakeConnector::default();
        let backend = Arc::new(StubBackend::with_actions(catalog()));
        let store = Arc::new(store);
        let (widget, handle, ui_rx) = Widget::new(
            &WidgetConfig::with_origin("http://hotel.example"),
            Arc::new(connector.clone()),
            backend.clone(),
            store.clone(),
        )
        .unwrap();
        Self {
            widget,
            handle,
            ui_rx,
            connector,
            backend,
            store,
        }
    }

    /// Start, open the socket and announce a session
    async fn connected(session_frame: &str) -> Self {
        let mut h = Self::new();
        h.widget.start();
        h.connector.last().opened();
        h.frame(session_frame).await;
        h.ui();
        h
    }

    /// Run one round of every queued input, frame, timer and request
    async fn pump(&mut self) {
        loop {
            for _ in 0..3 {
                tokio::task::yield_now().await;
            }
            let mut handled = false;
            while let Ok(event) = self.widget.connection_rx.try_recv() {
                self.widget.on_connection_event(event);
                handled = true;
            }
            while let Ok(event) = self.widget.workflow_rx.try_recv() {
                self.widget.on_workflow_event(event);
                handled = true;
            }
            while let Ok(input) = self.widget.input_rx.try_recv() {
                self.widget.on_input(input);
                handled = true;
            }
            if !handled {
                break;
            }
        }
    }

    async fn frame(&mut self, text: &str) {
        self.connector.last().frame(text);
        self.pump().await;
    }

    fn ui(&mut self) -> Vec<UiCommand> {
        let mut commands = Vec::new();
        while let Ok(command) = self.ui_rx.try_recv() {
            commands.push(command);
        }
        commands
    }
}

const ANONYMOUS: &str = r#"{"type":"session","token":"tok-1","sessionId":"s-1"}"#;

fn shown_action(commands: &[UiCommand]) -> Option<&str> {
    commands.iter().find_map(|c| match c {
        UiCommand::ShowForm { form } => Some(form.action_id.as_str()),
        _ => None,
    })
}

#[tokio::test]
async fn test_session_frame_reports_connection_and_restore() {
    let mut h = Harness::new();
    h.widget.start();
    h.connector.last().opened();
    h.frame(r#"{"type":"session","token":"tok-9","sessionId":"s-9","restored":true}"#)
        .await;

    let ui = h.ui();
    assert_eq!(
        ui,
        vec![
            UiCommand::ConnectionStatus { connected: true },
            UiCommand::SystemMessage {
                text: WidgetStrings::default().session_restored,
            },
        ]
    );
    assert_eq!(h.store.load().as_deref(), Some("tok-9"));
    assert_eq!(h.backend.fetched_locales(), vec!["en"]);

    h.frame(r#"{"type":"history","messages":[{"role":"guest","content":"hello"}]}"#)
        .await;
    assert!(matches!(
        &h.ui()[..],
        [UiCommand::History { messages }] if messages.len() == 1
    ));
}

#[tokio::test(start_paused = true)]
async fn test_assistant_action_is_gated_then_replayed() {
    let mut h = Harness::connected(ANONYMOUS).await;

    h.frame(r#"{"type":"message","role":"assistant","content":"I can book that.","action":"book-spa"}"#)
        .await;
    let ui = h.ui();
    assert!(matches!(ui[0], UiCommand::Message { .. }));
    assert!(ui.contains(&UiCommand::SystemMessage {
        text: WidgetStrings::default().verify_first,
    }));
    assert_eq!(shown_action(&ui), Some("verify-reservation"));

    h.handle.set_field("lastName", "Rossi");
    h.handle.set_field("roomNumber", "412");
    h.backend.reply(succeeded("Thanks, you're verified."));
    h.handle.submit_form();
    h.pump().await;
    h.frame(r#"{"type":"session_update","verificationStatus":"verified"}"#)
        .await;
    let ui = h.ui();
    assert!(ui.contains(&UiCommand::HideForm));
    assert!(shown_action(&ui).is_none());

    tokio::time::advance(Duration::from_millis(300)).await;
    h.pump().await;
    assert_eq!(shown_action(&h.ui()), Some("book-spa"));
    assert_eq!(h.backend.submissions()[0].token, "tok-1");
}

#[tokio::test]
async fn test_typing_indicator_follows_replies() {
    let mut h = Harness::connected(ANONYMOUS).await;

    h.handle.send_message("  Is the pool open?  ");
    h.pump().await;
    assert_eq!(
        h.connector.sent(),
        vec![r#"{"type":"message","content":"Is the pool open?"}"#]
    );
    assert_eq!(h.ui(), vec![UiCommand::Typing { active: true }]);

    h.frame(r#"{"type":"message","role":"assistant","content":"Until 10pm."}"#)
        .await;
    let ui = h.ui();
    assert_eq!(ui[0], UiCommand::Typing { active: false });
    assert!(matches!(ui[1], UiCommand::Message { .. }));

    h.handle.send_message("Thanks");
    h.pump().await;
    h.ui();
    h.frame(r#"{"type":"error","message":"Assistant unavailable","code":"llm_down"}"#)
        .await;
    assert_eq!(
        h.ui(),
        vec![
            UiCommand::Typing { active: false },
            UiCommand::SystemMessage {
                text: "Assistant unavailable".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn test_quick_reply_is_sent_and_cleared() {
    let mut h = Harness::connected(ANONYMOUS).await;

    h.frame(r#"{"type":"message","role":"assistant","content":"Late checkout?","quickReplies":["Yes","No"]}"#)
        .await;
    assert!(h.ui().contains(&UiCommand::QuickReplies {
        replies: vec!["Yes".to_string(), "No".to_string()],
    }));

    h.handle.select_quick_reply(5);
    h.pump().await;
    assert!(h.connector.sent().is_empty());

    h.handle.select_quick_reply(1);
    h.pump().await;
    assert_eq!(
        h.connector.sent(),
        vec![r#"{"type":"message","content":"No"}"#]
    );
    assert_eq!(
        h.ui(),
        vec![
            UiCommand::QuickReplies { replies: vec![] },
            UiCommand::Typing { active: true },
        ]
    );
}

#[tokio::test]
async fn test_message_while_disconnected_is_dropped() {
    let mut h = Harness::new();
    h.widget.start();
    h.handle.send_message("hello?");
    h.pump().await;

    assert!(h.connector.sent().is_empty());
    assert!(h.ui().is_empty());
}

#[tokio::test]
async fn test_disconnect_reports_status() {
    let mut h = Harness::connected(ANONYMOUS).await;
    h.handle.send_message("hi");
    h.pump().await;
    h.ui();

    h.connector.last().closed(None);
    h.pump().await;
    assert_eq!(
        h.ui(),
        vec![
            UiCommand::Typing { active: false },
            UiCommand::ConnectionStatus { connected: false },
        ]
    );
}

#[tokio::test]
async fn test_reset_session_starts_over() {
    let mut h = Harness::with_store(MemorySessionStore::with_token("old"));
    h.widget.start();
    assert_eq!(h.connector.last_url().query(), Some("token=old"));
    h.connector.last().opened();
    h.frame(ANONYMOUS).await;
    h.frame(r#"{"type":"message","role":"assistant","content":"Verify?","action":"verify-reservation"}"#)
        .await;
    h.ui();

    h.handle.reset_session();
    h.pump().await;

    assert!(h.ui().contains(&UiCommand::HideForm));
    assert!(h.store.load().is_none());
    assert_eq!(h.connector.open_count(), 2);
    assert!(h.connector.last_url().query().is_none());
    assert!(h.widget.core.session.current().is_none());
}

#[tokio::test]
async fn test_destroy_stops_the_loop() {
    let h = Harness::new();
    let connector = h.connector.clone();
    let handle = h.handle.clone();
    let task = tokio::spawn(h.widget.run());

    assert!(handle.destroy());
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(connector.open_count(), 1);
    assert_eq!(connector.close_count(), 1);
    assert!(!handle.send_message("anyone there?"));
}
