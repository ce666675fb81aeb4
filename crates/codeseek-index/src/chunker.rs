//! Line-window chunking with character-sized overlap.
//!
//! Sizes are approximate: characters, not tokens, and boundaries only fall
//! between lines. A line longer than the chunk size becomes its own chunk.

use codeseek_store::Chunk;

use crate::config::ChunkerConfig;

/// Split `content` into overlapping chunks of whole lines.
///
/// Lines accumulate until their size (characters plus one separator per line)
/// reaches `chunk_size`; the chunk is then closed on the current line and its
/// trailing lines, up to `overlap` characters, seed the next one. Whatever
/// window is left at end of input becomes the last chunk, even when it holds
/// only carried lines. Empty or whitespace-only content produces no chunks.
///
/// Output depends only on `(content, config)`, which keeps reindexing idempotent.
#[must_use]
pub fn chunk_text(
    file_path: &str,
    content: &str,
    language: &str,
    config: &ChunkerConfig,
) -> Vec<Chunk> {
    if content.trim().is_empty() {
        return Vec::new();
    }

    let lines: Vec<&str> = content.lines().collect();
    let mut chunks = Vec::new();

    // Window of the current candidate chunk, as indices into `lines`.
    let mut window_start = 0usize;
    let mut window_size = 0usize;

    for (idx, line) in lines.iter().enumerate() {
        window_size += line.chars().count() + 1;

        if window_size >= config.chunk_size() {
            let end = idx + 1;
            chunks.push(make_chunk(file_path, language, &lines, window_start, end));

            let (carried, carried_size) = overlap_tail(&lines[window_start..end], config.overlap());
            window_start = end - carried;
            window_size = carried_size;
        }
    }

    // The leftover window may hold only carried lines; it is still emitted
    // unless it repeats the range of the chunk just closed.
    let repeats_last = chunks
        .last()
        .is_some_and(|last| last.start_line == window_start + 1 && last.end_line == lines.len());
    if window_start < lines.len() && !repeats_last {
        chunks.push(make_chunk(
            file_path,
            language,
            &lines,
            window_start,
            lines.len(),
        ));
    }

    chunks
}

/// Count trailing lines that fit in `overlap` characters, walking backwards.
///
/// A line is carried while the size gathered so far plus its length stays
/// within `overlap`; the first line that would exceed it stops the walk.
/// Returns the line count and their size including separators.
fn overlap_tail(window: &[&str], overlap: usize) -> (usize, usize) {
    let mut carried = 0;
    let mut size = 0;
    for line in window.iter().rev() {
        let len = line.chars().count();
        if size + len > overlap {
            break;
        }
        size += len + 1;
        carried += 1;
    }
    (carried, size)
}

/// Build the chunk for `lines[start..end]` (0-based, exclusive end).
fn make_chunk(file_path: &str, language: &str, lines: &[&str], start: usize, end: usize) -> Chunk {
    Chunk::new(
        file_path,
        lines[start..end].join("\n"),
        language,
        start + 1,
        end,
    )
}
