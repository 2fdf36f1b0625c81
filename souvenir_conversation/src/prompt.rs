//! Completion prompt assembly.
//!
//! The prompt always ends with the `Assistant:` cue; response cleaning keeps
//! only what the model wrote after the last occurrence of that cue.

use souvenir_core::{ChatMessage, Role};

use crate::history::HistoryWindow;

/// Trailing cue the model completes.
pub const ASSISTANT_CUE: &str = "Assistant:";

/// Builds `system`, blank line, memory context and blank line (when any),
/// one `<Role>: <content>` line per history turn, then the current turn.
#[must_use]
pub fn assemble_prompt(
    system: &str,
    memory_context: &str,
    history: &[ChatMessage],
    message: &str,
) -> String {
    let mut prompt = format!("{system}\n\n");

    if !memory_context.is_empty() {
        prompt.push_str(memory_context);
        prompt.push_str("\n\n");
    }

    for turn in history {
        prompt.push_str(turn.role.prompt_label());
        prompt.push_str(": ");
        prompt.push_str(&turn.content);
        prompt.push('\n');
    }

    prompt.push_str(Role::User.prompt_label());
    prompt.push_str(": ");
    prompt.push_str(message);
    prompt.push('\n');
    prompt.push_str(ASSISTANT_CUE);
    prompt
}

/// [`assemble_prompt`] with a fixed system instruction and a history window.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    system_prompt: String,
    window: HistoryWindow,
}

impl PromptAssembler {
    #[must_use]
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            window: HistoryWindow::default(),
        }
    }

    #[must_use]
    pub const fn with_window(mut self, window: HistoryWindow) -> Self {
        self.window = window;
        self
    }

    #[must_use]
    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    #[must_use]
    pub fn assemble(&self, memory_context: &str, history: &[ChatMessage], message: &str) -> String {
        let replayed = self.window.select_messages(history);
        assemble_prompt(&self.system_prompt, memory_context, &replayed, message)
    }
}
