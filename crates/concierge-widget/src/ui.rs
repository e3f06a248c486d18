//! UI commands and localised widget strings
//!
//! The core never touches a view directly. It emits [`UiCommand`] values and
//! the host pattern-matches on them, so one error-rendering path
//! ([`UiCommand::SystemMessage`]) serves every failure the runtime surfaces.

use serde::{Deserialize, Serialize};

use crate::forms::FormView;
use crate::protocol::ChatMessage;

/// Command emitted by the runtime for the view layer
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum UiCommand {
    /// Render a new form, replacing any visible one
    ShowForm {
        /// Form snapshot
        form: FormView,
    },
    /// Re-render the visible form (visibility, inline error, loading state)
    UpdateForm {
        /// Form snapshot
        form: FormView,
    },
    /// Remove the visible form
    HideForm,
    /// Show a system message in the transcript
    SystemMessage {
        /// Localised text
        text: String,
    },
    /// Transport went up or down
    ConnectionStatus {
        /// Whether the transport is open
        connected: bool,
    },
    /// Replace the transcript with replayed history
    History {
        /// Messages in server order
        messages: Vec<ChatMessage>,
    },
    /// Append one live message
    Message {
        /// The message
        message: ChatMessage,
    },
    /// Show quick-reply chips (an empty list clears them)
    QuickReplies {
        /// Reply texts
        replies: Vec<String>,
    },
    /// Toggle the typing indicator
    Typing {
        /// Whether the assistant is composing
        active: bool,
    },
}

/// Sending half of the UI command channel
pub type UiSender = tokio::sync::mpsc::UnboundedSender<UiCommand>;

/// Receiving half of the UI command channel
pub type UiReceiver = tokio::sync::mpsc::UnboundedReceiver<UiCommand>;

/// Texts the runtime emits on its own behalf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetStrings {
    /// Shown when a gated action needs verification first
    pub verify_first: String,
    /// Shown when a submission fails on the wire
    pub submit_failed: String,
    /// Shown when a submission is attempted without a session
    pub no_session: String,
    /// Fallback when a failed [`crate::actions::ActionResult`] has no message
    pub action_failed: String,
    /// Shown for internal failures
    pub generic_error: String,
    /// Shown when the server restored a previous conversation
    pub session_restored: String,
    /// Empty option of a select control
    pub choose: String,
    /// Submit button label
    pub submit: String,
    /// Submit button label while a submission is in flight
    pub submitting: String,
    /// Cancel button label
    pub cancel: String,
    /// Inline error for an empty required field
    pub required_field: String,
}

impl Default for WidgetStrings {
    fn default() -> Self {
        Self {
            verify_first: "Please verify your reservation first to continue.".to_string(),
            submit_failed: "We couldn't send your request. Please try again.".to_string(),
            no_session: "No active session. Please wait for the chat to reconnect.".to_string(),
            action_failed: "Something went wrong. Please try again.".to_string(),
            generic_error: "Something went wrong.".to_string(),
            session_restored: "Welcome back! Your conversation has been restored.".to_string(),
            choose: "Choose...".to_string(),
            submit: "Submit".to_string(),
            submitting: "Sending...".to_string(),
            cancel: "Cancel".to_string(),
            required_field: "This field is required.".to_string(),
        }
    }
}

impl WidgetStrings {
    /// Built-in translation for a locale code (`de`, `de-AT`, ...), if any
    #[must_use]
    pub fn for_locale(locale: &str) -> Option<Self> {
        let lang = locale
            .split(['-', '_'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match lang.as_str() {
            "en" => Some(Self::default()),
            "de" => Some(Self {
                verify_first: "Bitte bestätigen Sie zuerst Ihre Reservierung.".to_string(),
                submit_failed: "Ihre Anfrage konnte nicht gesendet werden. Bitte versuchen Sie es erneut.".to_string(),
                no_session: "Keine aktive Sitzung. Bitte warten Sie, bis der Chat wieder verbunden ist.".to_string(),
                action_failed: "Etwas ist schiefgelaufen. Bitte versuchen Sie es erneut.".to_string(),
                generic_error: "Etwas ist schiefgelaufen.".to_string(),
                session_restored: "Willkommen zurück! Ihr Gespräch wurde wiederhergestellt.".to_string(),
                choose: "Bitte wählen...".to_string(),
                submit: "Senden".to_string(),
                submitting: "Wird gesendet...".to_string(),
                cancel: "Abbrechen".to_string(),
                required_field: "Dieses Feld ist erforderlich.".to_string(),
            }),
            "es" => Some(Self {
                verify_first: "Por favor, verifique primero su reserva.".to_string(),
                submit_failed: "No pudimos enviar su solicitud. Inténtelo de nuevo.".to_string(),
                no_session: "No hay sesión activa. Espere a que el chat se reconecte.".to_string(),
                action_failed: "Algo salió mal. Inténtelo de nuevo.".to_string(),
                generic_error: "Algo salió mal.".to_string(),
                session_restored: "¡Bienvenido de nuevo! Su conversación ha sido restaurada.".to_string(),
                choose: "Seleccione...".to_string(),
                submit: "Enviar".to_string(),
                submitting: "Enviando...".to_string(),
                cancel: "Cancelar".to_string(),
                required_field: "Este campo es obligatorio.".to_string(),
            }),
            "fr" => Some(Self {
                verify_first: "Veuillez d'abord vérifier votre réservation.".to_string(),
                submit_failed: "Nous n'avons pas pu envoyer votre demande. Veuillez réessayer.".to_string(),
                no_session: "Aucune session active. Veuillez patienter pendant la reconnexion.".to_string(),
                action_failed: "Une erreur est survenue. Veuillez réessayer.".to_string(),
                generic_error: "Une erreur est survenue.".to_string(),
                session_restored: "Bon retour ! Votre conversation a été restaurée.".to_string(),
                choose: "Choisir...".to_string(),
                submit: "Envoyer".to_string(),
                submitting: "Envoi...".to_string(),
                cancel: "Annuler".to_string(),
                required_field: "Ce champ est obligatoire.".to_string(),
            }),
            _ => None,
        }
    }
}
