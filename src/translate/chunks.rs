//! Splitting long text into pieces the translation service will accept.

/// Split `text` into chunks of whole lines.
///
/// Lines are added to the current chunk, each followed by `'\n'`, as long as
/// the chunk's length plus the next line's length stays below
/// `max_chunk_size`. Lengths are counted in `char`s. A single line that is
/// longer than the limit is never split, so it ends up as a chunk of its own
/// that exceeds the limit.
pub fn split_into_chunks(text: &str, max_chunk_size: usize) -> Vec<String> {
    let mut chunks = vec![];
    let mut current = String::new();
    let mut current_len = 0;
    for line in text.split('\n') {
        let line_len = line.chars().count();
        if current_len + line_len >= max_chunk_size && !current.is_empty() {
            chunks.push(std::mem::take(&mut current));
            current_len = 0;
        }
        current.push_str(line);
        current.push('\n');
        current_len += line_len + 1;
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}
