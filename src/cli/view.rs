//! Plain-text rendering of widget UI commands

use concierge_widget::forms::{Control, InputKind};
use concierge_widget::protocol::{ChatMessage, MessageRole};
use concierge_widget::{FormView, UiCommand};

/// Lines to print for one command
pub fn render(command: &UiCommand) -> Vec<String> {
    match command {
        UiCommand::Message { message } => vec![render_message(message)],
        UiCommand::History { messages } => messages.iter().map(render_message).collect(),
        UiCommand::SystemMessage { text } => vec![format!("* {text}")],
        UiCommand::ShowForm { form } | UiCommand::UpdateForm { form } => render_form(form),
        UiCommand::HideForm => vec!["(form closed)".to_string()],
        UiCommand::ConnectionStatus { connected: true } => vec!["-- connected --".to_string()],
        UiCommand::ConnectionStatus { connected: false } => {
            vec!["-- connection lost, reconnecting --".to_string()]
        }
        UiCommand::QuickReplies { replies } if replies.is_empty() => Vec::new(),
        UiCommand::QuickReplies { replies } => {
            let chips: Vec<String> = replies
                .iter()
                .enumerate()
                .map(|(i, reply)| format!("[{}] {reply}", i + 1))
                .collect();
            vec![format!("  {}   (/reply N)", chips.join("  "))]
        }
        UiCommand::Typing { active: true } => vec!["Concierge is typing...".to_string()],
        UiCommand::Typing { active: false } => Vec::new(),
    }
}

fn render_message(message: &ChatMessage) -> String {
    let who = match message.role {
        MessageRole::Guest => "You",
        MessageRole::Assistant => "Concierge",
        MessageRole::Staff => "Staff",
        MessageRole::System => "System",
    };
    format!("{who}: {}", message.content)
}

fn render_form(form: &FormView) -> Vec<String> {
    let mut lines = vec![format!("== {} ==", form.title)];
    lines.extend(
        form.controls
            .iter()
            .filter(|c| c.visible)
            .map(render_control),
    );
    lines.push(format!(
        "   /set key=value, /submit [{}], /cancel [{}]",
        form.submit_label, form.cancel_label
    ));
    lines
}

fn render_control(control: &Control) -> String {
    let mut line = format!(
        "  {}{} ({}): {}",
        control.label,
        if control.required { "*" } else { "" },
        control.key,
        control.value
    );
    if control.kind == InputKind::Select {
        let options: Vec<&str> = control
            .options
            .iter()
            .map(|o| o.value())
            .filter(|v| !v.is_empty())
            .collect();
        line.push_str(&format!("  <{}>", options.join("|")));
    }
    if control.read_only {
        line.push_str("  [locked]");
    }
    if let Some(error) = &control.error {
        line.push_str(&format!("  ! {error}"));
    }
    line
}
