//! `Open`/`Close` group delimiters (§4.2). Zero payload; inverting one
//! simply emits the other with the same label.

use super::{ChunkKind, UndoChunk};

pub fn encode_open(label: impl Into<String>) -> UndoChunk {
    UndoChunk::new(ChunkKind::Open, label, Vec::new())
}

pub fn encode_close(label: impl Into<String>) -> UndoChunk {
    UndoChunk::new(ChunkKind::Close, label, Vec::new())
}

pub fn invert_open(chunk: &UndoChunk) -> UndoChunk {
    UndoChunk::new(ChunkKind::Close, chunk.label(), Vec::new())
}

pub fn invert_close(chunk: &UndoChunk) -> UndoChunk {
    UndoChunk::new(ChunkKind::Open, chunk.label(), Vec::new())
}
