use serde::Serialize;

pub const DEFAULT_MODEL: &str = "gpt-4-turbo-preview";

/// Chars reserved on top of the template for date and formatting.
const PROMPT_PADDING_CHARS: usize = 500;
const SAFETY_MARGIN_CHARS: i64 = 1000;
/// Chars per token assumed when a token limit is forced by hand.
const OVERRIDE_CHARS_PER_TOKEN: i64 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelProfile {
    pub name: &'static str,
    pub context_window: u64,
    pub max_output_tokens: u64,
    /// Rough average; not a tokenizer.
    pub chars_per_token: f64,
}

const PROFILES: &[ModelProfile] = &[
    ModelProfile {
        name: "gpt-4-turbo-preview",
        context_window: 128_000,
        max_output_tokens: 4096,
        chars_per_token: 4.0,
    },
    ModelProfile {
        name: "gpt-4o",
        context_window: 128_000,
        max_output_tokens: 4096,
        chars_per_token: 4.0,
    },
    ModelProfile {
        name: "gpt-4o-mini",
        context_window: 128_000,
        max_output_tokens: 4096,
        chars_per_token: 4.0,
    },
    ModelProfile {
        name: "gpt-3.5-turbo",
        context_window: 16_385,
        max_output_tokens: 4096,
        chars_per_token: 4.0,
    },
];

/// Profile for `model`, or the default model's profile when unknown.
pub fn profile_for(model: &str) -> &'static ModelProfile {
    PROFILES
        .iter()
        .find(|profile| profile.name == model)
        .unwrap_or(&PROFILES[0])
}

pub fn prompt_overhead(prompt_template: &str) -> usize {
    prompt_template.chars().count() + PROMPT_PADDING_CHARS
}

/// Largest corpus chunk, in chars, that fits one generation call.
pub fn max_corpus_chars(
    model: &str,
    prompt_template: &str,
    max_tokens_override: Option<u64>,
) -> usize {
    let overhead = prompt_overhead(prompt_template) as i64;

    let budget = match max_tokens_override {
        Some(tokens) => (tokens as i64).saturating_mul(OVERRIDE_CHARS_PER_TOKEN) - overhead,
        None => {
            let profile = profile_for(model);
            let available_tokens = profile.context_window.saturating_sub(profile.max_output_tokens);
            let available_chars = (available_tokens as f64 * profile.chars_per_token) as i64;
            available_chars - overhead - SAFETY_MARGIN_CHARS
        }
    };

    budget.max(1) as usize
}
