//! Boundary-aware text chunker with overlap.
//!
//! Splits a record's text into ordered chunks no longer than `max_size`
//! characters, where each chunk after the first starts with the last
//! `overlap` characters of the text emitted before it. Splitting prefers
//! the largest separator available (paragraph break, then line break, then
//! sentence end, then word boundary) and falls back to fixed-width
//! code-point windows when nothing matches.
//!
//! Lengths are counted in code points, never bytes, so a boundary can
//! never land inside a multi-byte character. Concatenating the chunks'
//! novel portions (everything after the overlap prefix) reconstructs the
//! input exactly.

/// Separators tried largest-first. Each separator stays attached to the
/// end of the piece it terminates, so pieces concatenate back to the
/// original text.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Split `text` into chunk texts under `max_size` with `overlap` trailing
/// context, both in characters. Requires `overlap < max_size` (enforced by
/// config validation). Empty input yields no chunks; input that already
/// fits yields exactly one chunk equal to the input.
pub fn split_text(text: &str, max_size: usize, overlap: usize) -> Vec<String> {
    debug_assert!(overlap < max_size);

    if text.is_empty() {
        return Vec::new();
    }
    if char_count(text) <= max_size {
        return vec![text.to_string()];
    }

    // Pieces are capped at the novel capacity of a non-first chunk so any
    // piece fits after an overlap prefix.
    let budget = max_size - overlap;
    let pieces = split_pieces(text, budget, &SEPARATORS);

    let mut chunks: Vec<String> = Vec::new();
    let mut novel = String::new();
    let mut novel_len = 0usize;
    // Last `overlap` chars of everything emitted so far.
    let mut tail = String::new();

    for piece in pieces {
        let piece_len = char_count(&piece);
        let capacity = if chunks.is_empty() { max_size } else { budget };
        if novel_len + piece_len > capacity && !novel.is_empty() {
            flush(&mut chunks, &mut novel, &mut tail, overlap);
            novel_len = 0;
        }
        novel.push_str(&piece);
        novel_len += piece_len;
    }
    if !novel.is_empty() {
        flush(&mut chunks, &mut novel, &mut tail, overlap);
    }

    chunks
}

/// Emit `tail + novel` as a chunk and advance the tail.
fn flush(chunks: &mut Vec<String>, novel: &mut String, tail: &mut String, overlap: usize) {
    let chunk = format!("{}{}", tail, novel);
    *tail = last_chars(&chunk, overlap).to_string();
    chunks.push(chunk);
    novel.clear();
}

/// Recursively split `text` into pieces of at most `budget` characters,
/// trying separators in priority order and keeping each separator attached
/// to the piece it ends.
fn split_pieces(text: &str, budget: usize, seps: &[&str]) -> Vec<String> {
    if char_count(text) <= budget {
        return vec![text.to_string()];
    }
    let Some((sep, rest)) = seps.split_first() else {
        return fixed_windows(text, budget);
    };

    let segments = split_keep_sep(text, sep);
    if segments.len() == 1 {
        // Separator absent; try the next one.
        return split_pieces(text, budget, rest);
    }

    let mut out = Vec::new();
    for segment in segments {
        if char_count(&segment) <= budget {
            out.push(segment);
        } else {
            out.extend(split_pieces(&segment, budget, rest));
        }
    }
    out
}

/// Split on `sep`, keeping the separator at the end of each segment.
/// Concatenating the segments reproduces `text`.
fn split_keep_sep(text: &str, sep: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut start = 0;
    for (idx, _) in text.match_indices(sep) {
        let end = idx + sep.len();
        segments.push(text[start..end].to_string());
        start = end;
    }
    if start < text.len() {
        segments.push(text[start..].to_string());
    }
    if segments.is_empty() {
        segments.push(text.to_string());
    }
    segments
}

/// Fixed-width slicing at `width` code points for separator-less content.
fn fixed_windows(text: &str, width: usize) -> Vec<String> {
    let mut boundaries: Vec<usize> = text.char_indices().map(|(i, _)| i).collect();
    boundaries.push(text.len());

    let mut out = Vec::new();
    let mut start = 0;
    while start + 1 < boundaries.len() {
        let end = (start + width).min(boundaries.len() - 1);
        out.push(text[boundaries[start]..boundaries[end]].to_string());
        start = end;
    }
    out
}

fn char_count(s: &str) -> usize {
    s.chars().count()
}

/// The last `n` code points of `s` (all of it when shorter, nothing when
/// `n` is zero).
fn last_chars(s: &str, n: usize) -> &str {
    if n == 0 {
        return "";
    }
    let count = s.chars().count();
    if count <= n {
        return s;
    }
    match s.char_indices().nth(count - n) {
        Some((idx, _)) => &s[idx..],
        None => s,
    }
}
