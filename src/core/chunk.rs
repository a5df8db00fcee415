//! Splitting long text into platform-sized messages.

/// Hard per-message content ceiling on Discord.
pub const DISCORD_MESSAGE_LIMIT: usize = 2000;

/// Default chunk size, leaving headroom under the ceiling.
pub const DEFAULT_CHUNK_SIZE: usize = 1900;

/// Separators tried from coarsest to finest.
const SEPARATORS: [&str; 3] = ["\n\n", "\n", " "];

fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Split `text` into chunks of at most `limit` characters.
///
/// Paragraph boundaries are preferred, then line breaks, then spaces. A
/// single word longer than `limit` is cut mid-word as a last resort.
/// Whitespace-only chunks are dropped.
pub fn split_message(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    split_level(text, limit, 0).into_iter().filter(|c| !c.trim().is_empty()).collect()
}

fn split_level(text: &str, limit: usize, level: usize) -> Vec<String> {
    if char_len(text) <= limit {
        return vec![text.to_string()];
    }
    let Some(sep) = SEPARATORS.get(level) else {
        return hard_split(text, limit);
    };

    let mut chunks = Vec::new();
    let mut current = String::new();

    for part in text.split(sep) {
        if part.is_empty() {
            continue;
        }
        let pieces = if char_len(part) > limit {
            split_level(part, limit, level + 1)
        } else {
            vec![part.to_string()]
        };

        for piece in pieces {
            if current.is_empty() {
                current = piece;
            } else if char_len(&current) + char_len(sep) + char_len(&piece) <= limit {
                current.push_str(sep);
                current.push_str(&piece);
            } else {
                chunks.push(std::mem::replace(&mut current, piece));
            }
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

fn hard_split(text: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(limit).map(|c| c.iter().collect()).collect()
}

/// Cut `text` to at most `max` characters.
pub fn truncate(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Cut `text` to at most `max` characters, ending with `…` when cut.
pub fn truncate_with_ellipsis(text: &str, max: usize) -> String {
    if char_len(text) <= max {
        return text.to_string();
    }
    let mut cut = truncate(text, max.saturating_sub(1));
    cut.push('…');
    cut
}
