//! `SetMask` / `SetImgType` / `SetSize` / `SetFrame` / `SetFrames` /
//! `SetFrlen` (§4.2, §6.2) — the sprite/document-level attribute chunks.
//! All six are symmetric: encode snapshots the previous value, inverts swap
//! it back and snapshot the (now reverted) value for the opposite stream.

use crate::{
    chunk::{ChunkKind, UndoChunk},
    doc::{Document, ImgType, Mask, Sprite},
    error::{UndoError, UndoResult},
    io::{ByteReader, ByteWriter},
    object::{DocumentHandle, MaskHandle, ObjectId, ObjectsContainer, SpriteHandle},
};
use std::{cell::RefCell, rc::Rc};

fn require_sprite(objects: &ObjectsContainer, id: ObjectId) -> UndoResult<SpriteHandle> {
    objects
        .get::<Sprite>(id)
        .ok_or_else(|| UndoError::mismatch("referenced sprite no longer exists"))
}

fn require_document(objects: &ObjectsContainer, id: ObjectId) -> UndoResult<DocumentHandle> {
    objects
        .get::<Document>(id)
        .ok_or_else(|| UndoError::mismatch("referenced document no longer exists"))
}

/// `u16 x; u16 y; u16 w; u16 h; [(w+7)/8 × h] bytes`, no body if `w`/`h` are
/// zero (§6.2 "Mask").
fn encode_mask_blob(mask: &Mask) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer.u16(mask.x).u16(mask.y).u16(mask.width).u16(mask.height);
    if mask.width != 0 && mask.height != 0 {
        writer.bytes(mask.bits());
    }
    writer.into_vec()
}

fn decode_mask_blob(reader: &mut ByteReader) -> Mask {
    let x = reader.u16();
    let y = reader.u16();
    let w = reader.u16();
    let h = reader.u16();
    let bits = if w != 0 && h != 0 {
        reader.bytes(Mask::row_bytes(w) * h as usize).to_vec()
    } else {
        Vec::new()
    };
    Mask::from_bits(x, y, w, h, bits)
}

/// `SetMask`: replaces `doc`'s selection mask.
pub fn encode_set_mask(
    objects: &mut ObjectsContainer,
    doc: DocumentHandle,
    new_mask: Mask,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let doc_id = objects.add(doc.clone());
    let handle: MaskHandle = Rc::new(RefCell::new(new_mask));
    let previous = doc.borrow_mut().mask.replace(handle);
    let previous = previous.map(|h| h.borrow().clone()).unwrap_or_else(Mask::empty);

    let mut writer = ByteWriter::new();
    writer.u32(doc_id.0).bytes(&encode_mask_blob(&previous));
    Ok(UndoChunk::new(ChunkKind::SetMask, label, writer.into_vec()))
}

pub fn invert_set_mask(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let doc_id = ObjectId(reader.u32());
    let restore = decode_mask_blob(&mut reader);

    let doc = require_document(objects, doc_id)?;
    let handle: MaskHandle = Rc::new(RefCell::new(restore));
    let current = doc.borrow_mut().mask.replace(handle);
    let current = current.map(|h| h.borrow().clone()).unwrap_or_else(Mask::empty);

    let mut writer = ByteWriter::new();
    writer.u32(doc_id.0).bytes(&encode_mask_blob(&current));
    Ok(UndoChunk::new(ChunkKind::SetMask, chunk.label(), writer.into_vec()))
}

/// `SetImgType`: the sprite's pixel format.
pub fn encode_set_imgtype(
    objects: &mut ObjectsContainer,
    sprite: SpriteHandle,
    new_imgtype: ImgType,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let sprite_id = objects.add(sprite.clone());
    let previous = std::mem::replace(&mut sprite.borrow_mut().imgtype, new_imgtype);

    let mut writer = ByteWriter::new();
    writer.u32(sprite_id.0).u8(previous.as_u8());
    Ok(UndoChunk::new(ChunkKind::SetImgType, label, writer.into_vec()))
}

pub fn invert_set_imgtype(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let sprite_id = ObjectId(reader.u32());
    let restore = ImgType::from_u8(reader.u8())
        .ok_or_else(|| UndoError::precondition("unknown imgtype tag in set_imgtype chunk"))?;

    let sprite = require_sprite(objects, sprite_id)?;
    let current = std::mem::replace(&mut sprite.borrow_mut().imgtype, restore);

    let mut writer = ByteWriter::new();
    writer.u32(sprite_id.0).u8(current.as_u8());
    Ok(UndoChunk::new(ChunkKind::SetImgType, chunk.label(), writer.into_vec()))
}

/// `SetSize`: the sprite's canvas dimensions.
pub fn encode_set_size(
    objects: &mut ObjectsContainer,
    sprite: SpriteHandle,
    width: u16,
    height: u16,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let sprite_id = objects.add(sprite.clone());
    let (prev_w, prev_h) = sprite.borrow_mut().set_size(width, height);

    let mut writer = ByteWriter::new();
    writer.u32(sprite_id.0).u16(prev_w).u16(prev_h);
    Ok(UndoChunk::new(ChunkKind::SetSize, label, writer.into_vec()))
}

pub fn invert_set_size(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let sprite_id = ObjectId(reader.u32());
    let width = reader.u16();
    let height = reader.u16();

    let sprite = require_sprite(objects, sprite_id)?;
    let (cur_w, cur_h) = sprite.borrow_mut().set_size(width, height);

    let mut writer = ByteWriter::new();
    writer.u32(sprite_id.0).u16(cur_w).u16(cur_h);
    Ok(UndoChunk::new(ChunkKind::SetSize, chunk.label(), writer.into_vec()))
}

/// `SetFrame`: the sprite's current frame cursor.
pub fn encode_set_frame(
    objects: &mut ObjectsContainer,
    sprite: SpriteHandle,
    frame: u16,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let sprite_id = objects.add(sprite.clone());
    let previous = std::mem::replace(&mut sprite.borrow_mut().current_frame, frame);

    let mut writer = ByteWriter::new();
    writer.u32(sprite_id.0).u16(previous);
    Ok(UndoChunk::new(ChunkKind::SetFrame, label, writer.into_vec()))
}

pub fn invert_set_frame(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let sprite_id = ObjectId(reader.u32());
    let restore = reader.u16();

    let sprite = require_sprite(objects, sprite_id)?;
    let current = std::mem::replace(&mut sprite.borrow_mut().current_frame, restore);

    let mut writer = ByteWriter::new();
    writer.u32(sprite_id.0).u16(current);
    Ok(UndoChunk::new(ChunkKind::SetFrame, chunk.label(), writer.into_vec()))
}

fn resize_durations(sprite: &SpriteHandle, total: u16) {
    let mut sprite = sprite.borrow_mut();
    sprite.frame_durations.resize(total as usize, 100);
    sprite.frame_count = total;
}

fn encode_frame_count_payload(sprite_id: ObjectId, total: u16, durations: &[u16]) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer.u32(sprite_id.0).u16(total).u16(durations.len() as u16);
    for &duration in durations {
        writer.u16(duration);
    }
    writer.into_vec()
}

/// `SetFrames`: the sprite's total frame count, carrying enough of the
/// previous per-frame durations to restore them exactly on undo.
pub fn encode_set_frames(
    objects: &mut ObjectsContainer,
    sprite: SpriteHandle,
    total: u16,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let sprite_id = objects.add(sprite.clone());
    let (previous_total, previous_durations) = {
        let sprite = sprite.borrow();
        (sprite.frame_count, sprite.frame_durations.clone())
    };
    resize_durations(&sprite, total);

    Ok(UndoChunk::new(
        ChunkKind::SetFrames,
        label,
        encode_frame_count_payload(sprite_id, previous_total, &previous_durations),
    ))
}

pub fn invert_set_frames(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let sprite_id = ObjectId(reader.u32());
    let restore_total = reader.u16();
    let count = reader.u16();
    let restore_durations: Vec<u16> = (0..count).map(|_| reader.u16()).collect();

    let sprite = require_sprite(objects, sprite_id)?;
    let (current_total, current_durations) = {
        let sprite = sprite.borrow();
        (sprite.frame_count, sprite.frame_durations.clone())
    };
    {
        let mut sprite = sprite.borrow_mut();
        sprite.frame_count = restore_total;
        sprite.frame_durations = restore_durations;
    }

    Ok(UndoChunk::new(
        ChunkKind::SetFrames,
        chunk.label(),
        encode_frame_count_payload(sprite_id, current_total, &current_durations),
    ))
}

/// `SetFrlen`: a single frame's duration.
pub fn encode_set_frlen(
    objects: &mut ObjectsContainer,
    sprite: SpriteHandle,
    frame: u16,
    duration: u16,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let sprite_id = objects.add(sprite.clone());
    let previous = sprite.borrow_mut().set_frame_duration(frame, duration);

    let mut writer = ByteWriter::new();
    writer.u32(sprite_id.0).u16(frame).u16(previous);
    Ok(UndoChunk::new(ChunkKind::SetFrlen, label, writer.into_vec()))
}

pub fn invert_set_frlen(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let sprite_id = ObjectId(reader.u32());
    let frame = reader.u16();
    let restore = reader.u16();

    let sprite = require_sprite(objects, sprite_id)?;
    let current = sprite.borrow_mut().set_frame_duration(frame, restore);

    let mut writer = ByteWriter::new();
    writer.u32(sprite_id.0).u16(frame).u16(current);
    Ok(UndoChunk::new(ChunkKind::SetFrlen, chunk.label(), writer.into_vec()))
}
