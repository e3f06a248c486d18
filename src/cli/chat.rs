//! Interactive chat session

use anyhow::{Context, Result};
use concierge_widget::{
    FileSessionStore, HttpActionBackend, MemorySessionStore, SessionStore, UserInput, Widget,
    WidgetConfig, WsConnector,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use super::view;

const HELP: &str = "\
Type a message and press enter. Commands:
  /reply N          send quick reply N
  /set key=value    fill a form field
  /submit           submit the form
  /cancel           close the form
  /locale xx        switch language
  /reset            start a new session
  /quit             leave";

/// One line of terminal input
#[derive(Debug, PartialEq, Eq)]
enum Line {
    Input(UserInput),
    Help,
    Quit,
    Invalid(String),
    Empty,
}

fn parse_line(line: &str) -> Line {
    let line = line.trim();
    if line.is_empty() {
        return Line::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return Line::Input(UserInput::SendMessage(line.to_string()));
    };

    let (name, arg) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(n, a)| (n, a.trim()));

    match name {
        "reply" => match arg.parse::<usize>() {
            Ok(n) if n > 0 => Line::Input(UserInput::SelectQuickReply(n - 1)),
            _ => Line::Invalid("usage: /reply N".to_string()),
        },
        "set" => match arg.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => Line::Input(UserInput::SetField {
                key: key.trim().to_string(),
                value: value.trim().to_string(),
            }),
            _ => Line::Invalid("usage: /set key=value".to_string()),
        },
        "submit" => Line::Input(UserInput::SubmitForm),
        "cancel" => Line::Input(UserInput::CancelForm),
        "locale" if !arg.is_empty() => Line::Input(UserInput::SetLocale(arg.to_string())),
        "locale" => Line::Invalid("usage: /locale xx".to_string()),
        "reset" => Line::Input(UserInput::ResetSession),
        "help" => Line::Help,
        "quit" | "exit" => Line::Quit,
        other => Line::Invalid(format!("unknown command /{other}, try /help")),
    }
}

fn session_store(config: &WidgetConfig, ephemeral: bool) -> Arc<dyn SessionStore> {
    if ephemeral {
        return Arc::new(MemorySessionStore::new());
    }
    let store = match &config.session_file {
        Some(path) => FileSessionStore::new(path),
        None => FileSessionStore::default_location(),
    };
    debug!(path = %store.path().display(), "Using session file");
    Arc::new(store)
}

/// Run the chat until `/quit` or end of input
pub async fn run(config: WidgetConfig, ephemeral: bool) -> Result<()> {
    let backend =
        HttpActionBackend::new(&config).context("Failed to create action backend client")?;
    let (widget, handle, mut ui_rx) = Widget::new(
        &config,
        Arc::new(WsConnector),
        Arc::new(backend),
        session_store(&config, ephemeral),
    )
    .context("Failed to create widget")?;

    println!("Connecting to {} ... (/help for commands)", config.origin);

    let widget_task = tokio::spawn(widget.run());
    let render_task = tokio::spawn(async move {
        while let Some(command) = ui_rx.recv().await {
            for line in view::render(&command) {
                println!("{line}");
            }
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read input")? {
        match parse_line(&line) {
            Line::Input(input) => {
                if !handle.send(input) {
                    break;
                }
            }
            Line::Help => println!("{HELP}"),
            Line::Invalid(message) => println!("{message}"),
            Line::Quit => break,
            Line::Empty => {}
        }
    }

    handle.destroy();
    widget_task.await.context("Widget task failed")?;
    render_task.await.context("Render task failed")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_a_message() {
        assert_eq!(
            parse_line("  is the pool open? "),
            Line::Input(UserInput::SendMessage("is the pool open?".to_string()))
        );
        assert_eq!(parse_line("   "), Line::Empty);
    }

    #[test]
    fn test_commands() {
        assert_eq!(
            parse_line("/reply 2"),
            Line::Input(UserInput::SelectQuickReply(1))
        );
        assert_eq!(
            parse_line("/set lastName = Rossi"),
            Line::Input(UserInput::SetField {
                key: "lastName".to_string(),
                value: "Rossi".to_string(),
            })
        );
        assert_eq!(
            parse_line("/set notes=a=b"),
            Line::Input(UserInput::SetField {
                key: "notes".to_string(),
                value: "a=b".to_string(),
            })
        );
        assert_eq!(parse_line("/submit"), Line::Input(UserInput::SubmitForm));
        assert_eq!(
            parse_line("/locale de"),
            Line::Input(UserInput::SetLocale("de".to_string()))
        );
        assert_eq!(parse_line("/quit"), Line::Quit);
    }

    #[test]
    fn test_bad_commands_are_reported() {
        assert!(matches!(parse_line("/reply 0"), Line::Invalid(_)));
        assert!(matches!(parse_line("/reply x"), Line::Invalid(_)));
        assert!(matches!(parse_line("/set nothing"), Line::Invalid(_)));
        assert!(matches!(parse_line("/locale"), Line::Invalid(_)));
        assert!(matches!(parse_line("/dance"), Line::Invalid(_)));
    }

    #[test]
    fn test_ephemeral_store_starts_empty() {
        let store = session_store(&WidgetConfig::default(), true);
        assert!(store.load().is_none());
    }
}
