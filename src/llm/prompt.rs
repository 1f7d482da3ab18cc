//! Prompt composition
//!
//! The completion endpoint accepts a single string, so the fixed-role
//! conversation is flattened textually: one `"<role>: <content>\n"` line
//! block per entry, roles lower-cased.

use std::fmt::Write;

pub const SYSTEM_INSTRUCTION: &str = "You are a helpful data analysis assistant.";

struct PromptEntry {
    role: &'static str,
    content: String,
}

/// Flatten the instruction, optional context, and question into one prompt.
pub fn compose(question: &str, context: Option<&str>) -> String {
    let mut entries = vec![PromptEntry {
        role: "system",
        content: SYSTEM_INSTRUCTION.to_string(),
    }];

    if let Some(context) = context {
        entries.push(PromptEntry {
            role: "system",
            content: format!("Context:\n{}", context),
        });
    }

    entries.push(PromptEntry {
        role: "user",
        content: question.to_string(),
    });

    let mut prompt = String::new();
    for entry in &entries {
        // write! into a String cannot fail
        let _ = writeln!(prompt, "{}: {}", entry.role, entry.content);
    }
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_format_with_context() {
        let prompt = compose("Q", Some("C"));
        assert_eq!(
            prompt,
            "system: You are a helpful data analysis assistant.\nsystem: Context:\nC\nuser: Q\n"
        );
    }

    #[test]
    fn test_without_context() {
        let prompt = compose("what is a?", None);
        assert_eq!(
            prompt,
            "system: You are a helpful data analysis assistant.\nuser: what is a?\n"
        );
        assert!(!prompt.contains("Context:"));
    }

    #[test]
    fn test_each_entry_ends_with_one_newline() {
        let prompt = compose("Q", Some("C"));
        assert!(prompt.ends_with("user: Q\n"));
        assert!(!prompt.ends_with("\n\n"));
    }
}
