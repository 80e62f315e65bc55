//! OpenAI-backed link selection and market generation.

pub mod client;
pub mod link_selector;
pub mod market_generator;

pub use client::OpenAiClient;
pub use link_selector::OpenAiLinkSelector;
pub use market_generator::OpenAiProposalGenerator;

/// Strips a surrounding markdown code fence, including its language tag.
pub fn strip_code_blocks(content: &str) -> &str {
    let mut content = content.trim();
    if content.starts_with("```") {
        if let Some(newline) = content.find('\n') {
            content = &content[newline + 1..];
        }
        content = content.strip_suffix("```").unwrap_or(content);
    }
    content.trim()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{\"a\": 1}\n```  "), "{\"a\": 1}");
        assert_eq!(strip_code_blocks("  {}  "), "{}");
        assert_eq!(strip_code_blocks("```json\n{}"), "{}");
    }
}
