//! Per-agent conversation history.

use serde::Serialize;

/// One completed question/answer exchange.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationTurn {
    pub input: String,
    pub output: String,
}

/// Append-only record of finished turns, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    turns: Vec<ConversationTurn>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, input: impl Into<String>, output: impl Into<String>) {
        self.turns.push(ConversationTurn {
            input: input.into(),
            output: output.into(),
        });
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// History as prompt text; empty when nothing has been recorded.
    pub fn render(&self) -> String {
        self.turns
            .iter()
            .map(|t| format!("Human: {}\nAI: {}", t.input, t.output))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_memory_renders_empty() {
        assert_eq!(ConversationMemory::new().render(), "");
    }

    #[test]
    fn turns_render_in_insertion_order() {
        let mut memory = ConversationMemory::new();
        memory.record("Is PS1 compatible?", "Yes.");
        memory.record("Is PS1 compatible?", "Yes.");
        memory.record("How long to install?", "About 15 minutes.");

        assert_eq!(memory.len(), 3);
        assert_eq!(
            memory.render(),
            "Human: Is PS1 compatible?\nAI: Yes.\n\
             Human: Is PS1 compatible?\nAI: Yes.\n\
             Human: How long to install?\nAI: About 15 minutes."
        );
    }
}
