//! `AddPalette` / `RemovePalette` / `SetPaletteColors` / `RemapPalette`
//! (§4.2, §6.2).

use crate::{
    chunk::{ChunkKind, UndoChunk},
    doc::{Palette, Sprite},
    error::{UndoError, UndoResult},
    io::{ByteReader, ByteWriter},
    object::{ObjectId, ObjectsContainer, PaletteHandle, SpriteHandle},
};
use std::{cell::RefCell, rc::Rc};

fn require_sprite(objects: &ObjectsContainer, id: ObjectId) -> UndoResult<SpriteHandle> {
    objects
        .get::<Sprite>(id)
        .ok_or_else(|| UndoError::mismatch("referenced sprite no longer exists"))
}

/// `u16 frame; u16 ncolors; [u32] × ncolors` (§6.2).
fn encode_palette_blob(palette: &Palette) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer.u16(palette.frame).u16(palette.size() as u16);
    for &color in palette.colors() {
        writer.u32(color);
    }
    writer.into_vec()
}

fn decode_palette_blob(reader: &mut ByteReader) -> Palette {
    let frame = reader.u16();
    let count = reader.u16();
    let colors = (0..count).map(|_| reader.u32()).collect();
    Palette::new(frame, colors)
}

/// `AddPalette`: attaches `palette` at `frame` on `sprite`.
pub fn encode_add_palette(
    objects: &mut ObjectsContainer,
    sprite: SpriteHandle,
    palette: PaletteHandle,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let sprite_id = objects.add(sprite.clone());
    let frame = palette.borrow().frame;
    let palette_id = objects.add(palette.clone());
    sprite.borrow_mut().palettes.insert(frame, palette);

    let mut writer = ByteWriter::new();
    writer.u32(sprite_id.0).u32(palette_id.0);
    Ok(UndoChunk::new(ChunkKind::AddPalette, label, writer.into_vec()))
}

pub fn invert_add_palette(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let sprite_id = ObjectId(reader.u32());
    let palette_id = ObjectId(reader.u32());

    let sprite = require_sprite(objects, sprite_id)?;
    let palette = objects
        .get::<Palette>(palette_id)
        .ok_or_else(|| UndoError::mismatch("referenced palette no longer exists"))?;
    let frame = palette.borrow().frame;
    sprite
        .borrow_mut()
        .palettes
        .remove(&frame)
        .ok_or_else(|| UndoError::mismatch("palette is not attached at its own frame"))?;

    let mut writer = ByteWriter::new();
    writer
        .u32(sprite_id.0)
        .bytes(&encode_palette_blob(&palette.borrow()));
    Ok(UndoChunk::new(ChunkKind::RemovePalette, chunk.label(), writer.into_vec()))
}

/// `RemovePalette`: detaches the palette at `frame` on `sprite`.
pub fn encode_remove_palette(
    objects: &mut ObjectsContainer,
    sprite: SpriteHandle,
    frame: u16,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let sprite_id = objects.add(sprite.clone());
    let palette = sprite
        .borrow_mut()
        .palettes
        .remove(&frame)
        .ok_or_else(|| UndoError::mismatch("sprite has no palette for this frame"))?;

    let mut writer = ByteWriter::new();
    writer
        .u32(sprite_id.0)
        .bytes(&encode_palette_blob(&palette.borrow()));
    Ok(UndoChunk::new(ChunkKind::RemovePalette, label, writer.into_vec()))
}

pub fn invert_remove_palette(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let sprite_id = ObjectId(reader.u32());
    let palette = decode_palette_blob(&mut reader);
    let frame = palette.frame;

    let handle: PaletteHandle = Rc::new(RefCell::new(palette));
    let palette_id = objects.add(handle.clone());
    let sprite = require_sprite(objects, sprite_id)?;
    sprite.borrow_mut().palettes.insert(frame, handle);

    let mut writer = ByteWriter::new();
    writer.u32(sprite_id.0).u32(palette_id.0);
    Ok(UndoChunk::new(ChunkKind::AddPalette, chunk.label(), writer.into_vec()))
}

/// `SetPaletteColors`: symmetric overwrite of `colors[from..=to]` on the
/// palette attached at `frame` (§4.2; pinned to that frame even if the
/// user later navigates elsewhere, per §9 open question 3).
pub fn encode_set_palette_colors(
    objects: &mut ObjectsContainer,
    sprite: SpriteHandle,
    frame: u16,
    from: usize,
    colors: &[u32],
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let sprite_id = objects.add(sprite.clone());
    let palette = sprite
        .borrow()
        .palettes
        .get(&frame)
        .cloned()
        .ok_or_else(|| UndoError::mismatch("sprite has no palette for this frame"))?;
    let to = from + colors.len() - 1;
    let previous = palette.borrow_mut().set_range(from, to, colors);

    let mut writer = ByteWriter::new();
    writer
        .u32(sprite_id.0)
        .u16(frame)
        .u32(from as u32)
        .u32(to as u32)
        .u16(previous.len() as u16);
    for color in previous {
        writer.u32(color);
    }
    Ok(UndoChunk::new(ChunkKind::SetPaletteColors, label, writer.into_vec()))
}

pub fn invert_set_palette_colors(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let sprite_id = ObjectId(reader.u32());
    let frame = reader.u16();
    let from = reader.u32() as usize;
    let to = reader.u32() as usize;
    let count = reader.u16();
    let restore: Vec<u32> = (0..count).map(|_| reader.u32()).collect();

    let sprite = require_sprite(objects, sprite_id)?;
    let palette = sprite
        .borrow()
        .palettes
        .get(&frame)
        .cloned()
        .ok_or_else(|| UndoError::mismatch("sprite has no palette for the pinned frame"))?;
    let current = palette.borrow_mut().set_range(from, to, &restore);

    let mut writer = ByteWriter::new();
    writer
        .u32(sprite_id.0)
        .u16(frame)
        .u32(from as u32)
        .u32(to as u32)
        .u16(current.len() as u16);
    for color in current {
        writer.u32(color);
    }
    Ok(UndoChunk::new(ChunkKind::SetPaletteColors, chunk.label(), writer.into_vec()))
}

/// `RemapPalette`: remaps indexed pixel data and palette order across
/// `[frame_from, frame_to]` by `mapping` (§4.2 REMAP_PALETTE algorithm).
pub fn encode_remap_palette(
    objects: &mut ObjectsContainer,
    sprite: SpriteHandle,
    frame_from: u16,
    frame_to: u16,
    mapping: [u8; 256],
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let sprite_id = objects.add(sprite.clone());
    if !is_permutation(&mapping) {
        return Err(UndoError::precondition("remap_palette mapping is not a permutation of [0, 256)"));
    }
    sprite.borrow().remap_images(frame_from, frame_to, &mapping);

    let mut writer = ByteWriter::new();
    writer.u32(sprite_id.0).u16(frame_from).u16(frame_to).bytes(&mapping);
    Ok(UndoChunk::new(ChunkKind::RemapPalette, label, writer.into_vec()))
}

pub fn invert_remap_palette(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let sprite_id = ObjectId(reader.u32());
    let frame_from = reader.u16();
    let frame_to = reader.u16();
    let mapping: [u8; 256] = reader
        .bytes(256)
        .try_into()
        .map_err(|_| UndoError::precondition("remap_palette mapping is truncated"))?;

    let mut inverse = [0u8; 256];
    for (i, &m) in mapping.iter().enumerate() {
        inverse[m as usize] = i as u8;
    }

    let sprite = require_sprite(objects, sprite_id)?;
    sprite.borrow().remap_images(frame_from, frame_to, &inverse);

    let mut writer = ByteWriter::new();
    writer.u32(sprite_id.0).u16(frame_from).u16(frame_to).bytes(&inverse);
    Ok(UndoChunk::new(ChunkKind::RemapPalette, chunk.label(), writer.into_vec()))
}

fn is_permutation(mapping: &[u8; 256]) -> bool {
    let mut seen = [false; 256];
    for &m in mapping {
        if seen[m as usize] {
            return false;
        }
        seen[m as usize] = true;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::{ImgType, Layer, Stock};

    fn lone_sprite() -> SpriteHandle {
        Rc::new(RefCell::new(Sprite {
            current_frame: 0,
            current_layer: ObjectId::NONE,
            frame_count: 2,
            frame_durations: vec![100, 100],
            palettes: Default::default(),
            width: 1,
            height: 1,
            imgtype: ImgType::Indexed,
            stock: Rc::new(RefCell::new(Stock::new())),
            root: Rc::new(RefCell::new(Layer::new_folder("root", ObjectId::NONE))),
        }))
    }

    #[test]
    fn add_then_undo_removes_palette() {
        let mut objects = ObjectsContainer::new();
        let sprite = lone_sprite();
        let palette: PaletteHandle = Rc::new(RefCell::new(Palette::new(0, vec![0xff0000ff, 0x00ff00ff])));

        let chunk = encode_add_palette(&mut objects, sprite.clone(), palette, "add palette").unwrap();
        assert!(sprite.borrow().palettes.contains_key(&0));

        invert_add_palette(&chunk, &mut objects).unwrap();
        assert!(!sprite.borrow().palettes.contains_key(&0));
    }

    #[test]
    fn set_palette_colors_round_trips() {
        let mut objects = ObjectsContainer::new();
        let sprite = lone_sprite();
        let palette: PaletteHandle = Rc::new(RefCell::new(Palette::new(0, vec![1, 2, 3])));
        sprite.borrow_mut().palettes.insert(0, palette.clone());

        let chunk = encode_set_palette_colors(&mut objects, sprite.clone(), 0, 1, &[99], "recolor").unwrap();
        assert_eq!(palette.borrow().colors(), &[1, 99, 3]);

        invert_set_palette_colors(&chunk, &mut objects).unwrap();
        assert_eq!(palette.borrow().colors(), &[1, 2, 3]);
    }

    #[test]
    fn non_permutation_mapping_is_rejected() {
        let mut objects = ObjectsContainer::new();
        let sprite = lone_sprite();
        let mut mapping = [0u8; 256];
        mapping[1] = 0;
        assert!(encode_remap_palette(&mut objects, sprite, 0, 0, mapping, "remap").is_err());
    }
}
