//! `UndoStream` (§4.1): an ordered, memory-accounted buffer of chunks with
//! O(1) amortized push/pop at either end.

use crate::chunk::{ChunkKind, UndoChunk};
use std::collections::VecDeque;

/// FIFO-from-head / LIFO-from-tail buffer of chunks, tracking the running
/// total of `chunk.size()` as `mem_size` (§3 invariant 4).
#[derive(Default)]
pub struct UndoStream {
    chunks: VecDeque<UndoChunk>,
    mem_size: u64,
}

impl UndoStream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: UndoChunk) {
        self.mem_size += chunk.size() as u64;
        self.chunks.push_back(chunk);
    }

    pub fn pop_head(&mut self) -> Option<UndoChunk> {
        let chunk = self.chunks.pop_front()?;
        self.mem_size -= chunk.size() as u64;
        Some(chunk)
    }

    pub fn pop_tail(&mut self) -> Option<UndoChunk> {
        let chunk = self.chunks.pop_back()?;
        self.mem_size -= chunk.size() as u64;
        Some(chunk)
    }

    pub fn peek_head(&self) -> Option<&UndoChunk> {
        self.chunks.front()
    }

    pub fn clear(&mut self) {
        self.chunks.clear();
        self.mem_size = 0;
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn mem_size(&self) -> u64 {
        self.mem_size
    }

    pub fn iter(&self) -> impl Iterator<Item = &UndoChunk> {
        self.chunks.iter()
    }
}

/// Final running depth (`#OPEN - #CLOSE`) after walking `stream` head to
/// tail. Zero means the stream ends "out of group" (§4.3 updateUndo step 3;
/// §9 open question on `out_of_group`).
pub fn is_out_of_group(stream: &UndoStream) -> bool {
    let mut depth: i64 = 0;
    for chunk in stream.iter() {
        match chunk.kind() {
            ChunkKind::Open => depth += 1,
            ChunkKind::Close => depth -= 1,
            _ => {}
        }
    }
    depth == 0
}

/// Walks `stream` head to tail, starting a fresh depth counter at each
/// boundary; every time depth returns to zero it counts as one group (§4.3
/// "Group counting", §8 P5). A lone out-of-group chunk counts as a
/// single-chunk group, matching the open question in §9: depth is only
/// meaningful as "has returned to zero after walking the whole stream", not
/// as an intermediate per-chunk snapshot.
pub fn count_undo_groups(stream: &UndoStream) -> usize {
    let mut groups = 0;
    let mut depth: i64 = 0;
    let mut in_group = false;

    for chunk in stream.iter() {
        in_group = true;
        match chunk.kind() {
            ChunkKind::Open => depth += 1,
            ChunkKind::Close => depth -= 1,
            _ => {}
        }
        if depth == 0 {
            groups += 1;
            in_group = false;
        }
    }

    // A stream ending mid-group (malformed) still counts the partial run as
    // one group so callers never undercount memory under eviction.
    if in_group {
        groups += 1;
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(kind: ChunkKind, payload_len: usize) -> UndoChunk {
        UndoChunk::new(kind, "group", vec![0; payload_len])
    }

    #[test]
    fn push_and_pop_track_mem_size() {
        let mut stream = UndoStream::new();
        let a = chunk(ChunkKind::SetFrame, 4);
        let b = chunk(ChunkKind::SetSize, 8);
        let expected = a.size() as u64 + b.size() as u64;

        stream.push(a);
        stream.push(b);
        assert_eq!(stream.mem_size(), expected);

        stream.pop_head();
        assert!(stream.mem_size() < expected);
        stream.pop_tail();
        assert_eq!(stream.mem_size(), 0);
        assert!(stream.is_empty());
    }

    #[test]
    fn count_groups_matches_top_level_entries() {
        let mut stream = UndoStream::new();
        stream.push(chunk(ChunkKind::SetFrame, 0));
        stream.push(chunk(ChunkKind::Open, 0));
        stream.push(chunk(ChunkKind::SetSize, 0));
        stream.push(chunk(ChunkKind::SetSize, 0));
        stream.push(chunk(ChunkKind::Close, 0));
        stream.push(chunk(ChunkKind::SetFrame, 0));

        assert_eq!(count_undo_groups(&stream), 3);
    }

    #[test]
    fn count_groups_handles_nested_open_close() {
        let mut stream = UndoStream::new();
        stream.push(chunk(ChunkKind::Open, 0));
        stream.push(chunk(ChunkKind::Open, 0));
        stream.push(chunk(ChunkKind::SetSize, 0));
        stream.push(chunk(ChunkKind::Close, 0));
        stream.push(chunk(ChunkKind::Close, 0));

        assert_eq!(count_undo_groups(&stream), 1);
    }

    #[test]
    fn is_out_of_group_after_balanced_group() {
        let mut stream = UndoStream::new();
        stream.push(chunk(ChunkKind::Open, 0));
        stream.push(chunk(ChunkKind::SetSize, 0));
        stream.push(chunk(ChunkKind::Close, 0));
        assert!(is_out_of_group(&stream));

        stream.push(chunk(ChunkKind::Open, 0));
        assert!(!is_out_of_group(&stream));
    }

    #[test]
    fn clear_resets_mem_size() {
        let mut stream = UndoStream::new();
        stream.push(chunk(ChunkKind::SetFrame, 16));
        stream.clear();
        assert!(stream.is_empty());
        assert_eq!(stream.mem_size(), 0);
    }
}
