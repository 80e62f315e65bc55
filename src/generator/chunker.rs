use tracing::{info, warn};

/// Separator between page blocks in an assembled corpus.
pub const PAGE_SEPARATOR: &str = "\n\n--- PAGE:";

/// Splits `corpus` into chunks of at most `max_chars` characters,
/// cutting only at page-block boundaries.
///
/// Blocks are packed greedily in corpus order. Every block after the
/// first keeps its leading separator, so the chunks concatenate back to
/// the corpus. A block longer than `max_chars` on its own is truncated
/// and emitted alone. Whitespace-only chunks are dropped.
pub fn chunk_corpus(corpus: &str, max_chars: usize) -> Vec<String> {
    let total_chars = corpus.chars().count();
    if total_chars <= max_chars {
        return vec![corpus.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0;

    for (index, piece) in corpus.split(PAGE_SEPARATOR).enumerate() {
        let block = if index == 0 {
            piece.to_string()
        } else {
            format!("{}{}", PAGE_SEPARATOR, piece)
        };
        let block_chars = block.chars().count();

        if current_chars + block_chars <= max_chars {
            current.push_str(&block);
            current_chars += block_chars;
            continue;
        }

        if !current.trim().is_empty() {
            chunks.push(std::mem::take(&mut current));
        }

        if block_chars > max_chars {
            warn!(
                "Single page exceeds max_chars ({} > {}), truncating",
                block_chars, max_chars
            );
            current = block.chars().take(max_chars).collect();
            current_chars = max_chars;
        } else {
            current = block;
            current_chars = block_chars;
        }
    }

    if !current.trim().is_empty() {
        chunks.push(current);
    }

    info!(
        "Split corpus ({} chars) into {} chunks",
        total_chars,
        chunks.len()
    );
    chunks
}
