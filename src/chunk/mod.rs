//! Chunk taxonomy and the invert protocol (§4.2, §6.2).
//!
//! A chunk is a tagged, self-contained record of one reversible mutation.
//! `UndoChunk` holds the tag, the group label, and the tail payload as a
//! single logical byte blob (header + tail in one allocation at the wire
//! level, per §9); `ChunkKind` dispatches encoding and inversion to the
//! per-kind modules below.

mod cel;
mod group;
mod layer;
mod palette;
mod pixels;
mod sprite;
mod stock;

pub mod kinds {
    pub use super::cel::*;
    pub use super::group::*;
    pub use super::layer::*;
    pub use super::palette::*;
    pub use super::pixels::*;
    pub use super::sprite::*;
    pub use super::stock::*;
}

use crate::{
    error::{UndoError, UndoResult},
    io::{ByteReader, ByteWriter},
    object::ObjectsContainer,
};

/// The kind tag stored in a chunk's header (§4.2). Numeric values are a wire
/// format detail (`as_u16`/`from_u16`) and otherwise never observed.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ChunkKind {
    Open,
    Close,
    Data,
    Image,
    Flip,
    Dirty,
    AddImage,
    RemoveImage,
    ReplaceImage,
    AddCel,
    RemoveCel,
    SetLayerName,
    AddLayer,
    RemoveLayer,
    MoveLayer,
    SetLayer,
    AddPalette,
    RemovePalette,
    SetPaletteColors,
    RemapPalette,
    SetMask,
    SetImgType,
    SetSize,
    SetFrame,
    SetFrames,
    SetFrlen,
}

impl ChunkKind {
    pub fn as_u16(self) -> u16 {
        use ChunkKind::*;
        match self {
            Open => 0,
            Close => 1,
            Data => 2,
            Image => 3,
            Flip => 4,
            Dirty => 5,
            AddImage => 6,
            RemoveImage => 7,
            ReplaceImage => 8,
            AddCel => 9,
            RemoveCel => 10,
            SetLayerName => 11,
            AddLayer => 12,
            RemoveLayer => 13,
            MoveLayer => 14,
            SetLayer => 15,
            AddPalette => 16,
            RemovePalette => 17,
            SetPaletteColors => 18,
            RemapPalette => 19,
            SetMask => 20,
            SetImgType => 21,
            SetSize => 22,
            SetFrame => 23,
            SetFrames => 24,
            SetFrlen => 25,
        }
    }

    pub fn from_u16(tag: u16) -> Option<Self> {
        use ChunkKind::*;
        Some(match tag {
            0 => Open,
            1 => Close,
            2 => Data,
            3 => Image,
            4 => Flip,
            5 => Dirty,
            6 => AddImage,
            7 => RemoveImage,
            8 => ReplaceImage,
            9 => AddCel,
            10 => RemoveCel,
            11 => SetLayerName,
            12 => AddLayer,
            13 => RemoveLayer,
            14 => MoveLayer,
            15 => SetLayer,
            16 => AddPalette,
            17 => RemovePalette,
            18 => SetPaletteColors,
            19 => RemapPalette,
            20 => SetMask,
            21 => SetImgType,
            22 => SetSize,
            23 => SetFrame,
            24 => SetFrames,
            25 => SetFrlen,
            _ => return None,
        })
    }

    /// The kind recorded as this kind's inverse (§4.2 table). Most kinds are
    /// self-symmetric; group delimiters swap.
    pub fn inverse(self) -> ChunkKind {
        match self {
            ChunkKind::Open => ChunkKind::Close,
            ChunkKind::Close => ChunkKind::Open,
            ChunkKind::AddImage => ChunkKind::RemoveImage,
            ChunkKind::RemoveImage => ChunkKind::AddImage,
            ChunkKind::AddCel => ChunkKind::RemoveCel,
            ChunkKind::RemoveCel => ChunkKind::AddCel,
            ChunkKind::AddLayer => ChunkKind::RemoveLayer,
            ChunkKind::RemoveLayer => ChunkKind::AddLayer,
            ChunkKind::AddPalette => ChunkKind::RemovePalette,
            ChunkKind::RemovePalette => ChunkKind::AddPalette,
            other => other,
        }
    }
}

/// One atomic, invertible record (§3). `payload` is the kind-specific tail;
/// the fixed `{kind, size, label}` header is materialized only at
/// [`encode`](Self::encode) time.
#[derive(Clone, Debug)]
pub struct UndoChunk {
    kind: ChunkKind,
    label: String,
    payload: Vec<u8>,
}

impl UndoChunk {
    pub fn new(kind: ChunkKind, label: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            kind,
            label: label.into(),
            payload,
        }
    }

    pub fn kind(&self) -> ChunkKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Total wire length of this chunk, header included (§3: "`size` is the
    /// total byte length of the chunk including header and variable tail").
    pub fn size(&self) -> u32 {
        (2 + 4 + 2 + self.label.len() + self.payload.len()) as u32
    }

    /// Serializes `{kind: u16, size: u32, label: text}` followed by the raw
    /// payload tail (§3, §6.2).
    pub fn encode(&self) -> Vec<u8> {
        let mut writer = ByteWriter::with_capacity(self.size() as usize);
        writer.u16(self.kind.as_u16());
        let size_offset = writer.len();
        writer.u32(0);
        writer.text(&self.label);
        writer.bytes(&self.payload);
        let total = writer.len() as u32;
        writer.patch_u32(size_offset, total);
        writer.into_vec()
    }

    pub fn decode(bytes: &[u8]) -> UndoResult<Self> {
        let mut reader = ByteReader::new(bytes);
        let kind = ChunkKind::from_u16(reader.u16())
            .ok_or_else(|| UndoError::precondition("unknown chunk kind tag"))?;
        let _size = reader.u32();
        let label = reader.text();
        let payload = reader.bytes(reader.remaining()).to_vec();
        Ok(Self {
            kind,
            label,
            payload,
        })
    }
}

/// Applies `chunk` to `objects`, returning the chunk recorded on the
/// opposite stream as a side effect (§4.2 general contract).
pub fn invert(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    use ChunkKind::*;
    match chunk.kind() {
        Open => Ok(group::invert_open(chunk)),
        Close => Ok(group::invert_close(chunk)),
        Data => pixels::invert_data(chunk, objects),
        Image => pixels::invert_image(chunk, objects),
        Flip => pixels::invert_flip(chunk, objects),
        Dirty => pixels::invert_dirty(chunk, objects),
        AddImage => stock::invert_add_image(chunk, objects),
        RemoveImage => stock::invert_remove_image(chunk, objects),
        ReplaceImage => stock::invert_replace_image(chunk, objects),
        AddCel => cel::invert_add_cel(chunk, objects),
        RemoveCel => cel::invert_remove_cel(chunk, objects),
        SetLayerName => layer::invert_set_layer_name(chunk, objects),
        AddLayer => layer::invert_add_layer(chunk, objects),
        RemoveLayer => layer::invert_remove_layer(chunk, objects),
        MoveLayer => layer::invert_move_layer(chunk, objects),
        SetLayer => layer::invert_set_layer(chunk, objects),
        AddPalette => palette::invert_add_palette(chunk, objects),
        RemovePalette => palette::invert_remove_palette(chunk, objects),
        SetPaletteColors => palette::invert_set_palette_colors(chunk, objects),
        RemapPalette => palette::invert_remap_palette(chunk, objects),
        SetMask => sprite::invert_set_mask(chunk, objects),
        SetImgType => sprite::invert_set_imgtype(chunk, objects),
        SetSize => sprite::invert_set_size(chunk, objects),
        SetFrame => sprite::invert_set_frame(chunk, objects),
        SetFrames => sprite::invert_set_frames(chunk, objects),
        SetFrlen => sprite::invert_set_frlen(chunk, objects),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_round_trips() {
        let chunk = UndoChunk::new(ChunkKind::Open, "paint stroke", vec![1, 2, 3]);
        let bytes = chunk.encode();
        assert_eq!(bytes.len(), chunk.size() as usize);

        let decoded = UndoChunk::decode(&bytes).unwrap();
        assert_eq!(decoded.kind(), ChunkKind::Open);
        assert_eq!(decoded.label(), "paint stroke");
        assert_eq!(decoded.payload(), &[1, 2, 3]);
    }

    #[test]
    fn inverse_table_matches_group_delimiters() {
        assert_eq!(ChunkKind::Open.inverse(), ChunkKind::Close);
        assert_eq!(ChunkKind::Close.inverse(), ChunkKind::Open);
        assert_eq!(ChunkKind::Flip.inverse(), ChunkKind::Flip);
    }
}
