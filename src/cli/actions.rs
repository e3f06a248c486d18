//! List action definitions

use anyhow::{Context, Result};
use concierge_widget::{ActionBackend, ActionDefinition, HttpActionBackend, WidgetConfig};

/// Fetch and print the actions declared for the configured locale
pub async fn run(config: WidgetConfig) -> Result<()> {
    let backend =
        HttpActionBackend::new(&config).context("Failed to create action backend client")?;
    let actions = backend
        .fetch_actions(&config.locale)
        .await
        .with_context(|| format!("Failed to fetch actions from {}", config.origin))?;

    println!("\nActions ({})\n", config.locale);
    if actions.is_empty() {
        println!("  No actions declared.");
        return Ok(());
    }
    for action in &actions {
        for line in describe(action, &config.verification_action_id) {
            println!("{line}");
        }
    }
    println!();
    Ok(())
}

fn describe(action: &ActionDefinition, verification_action_id: &str) -> Vec<String> {
    let mut flags = Vec::new();
    if action.id == verification_action_id {
        flags.push("verifies guest");
    }
    if action.requires_verification {
        flags.push("verification required");
    }

    let mut header = format!("  {} - {}", action.id, action.name);
    if !flags.is_empty() {
        header.push_str(&format!(" [{}]", flags.join(", ")));
    }

    let mut lines = vec![header];
    if !action.trigger_hint.is_empty() {
        lines.push(format!("      when: {}", action.trigger_hint));
    }
    for field in &action.fields {
        lines.push(format!(
            "      {}{}: {:?}",
            field.key,
            if field.required { "*" } else { "" },
            field.field_type
        ));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_widget::actions::{ActionField, FieldType};

    #[test]
    fn test_describe_marks_gated_actions() {
        let action = ActionDefinition {
            id: "book-spa".to_string(),
            name: "Book a spa treatment".to_string(),
            trigger_hint: String::new(),
            requires_verification: true,
            fields: vec![ActionField::text("date", "Date")
                .with_type(FieldType::Date)
                .required()],
        };

        assert_eq!(
            describe(&action, "verify-reservation"),
            vec![
                "  book-spa - Book a spa treatment [verification required]",
                "      date*: Date",
            ]
        );
    }
}
