//! Canned prompts offered on the welcome screen.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Suggestion {
    pub label: &'static str,
    /// Literal text placed in the draft when selected.
    pub prompt: &'static str,
}

pub const SUGGESTIONS: [Suggestion; 4] = [
    Suggestion {
        label: "Tell me a joke",
        prompt: "Tell me a joke",
    },
    Suggestion {
        label: "Explain React",
        prompt: "What is React?",
    },
    Suggestion {
        label: "Write a poem",
        prompt: "Write a short poem",
    },
    Suggestion {
        label: "Coding help",
        prompt: "Help me with coding",
    },
];
