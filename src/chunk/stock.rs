//! `AddImage` / `RemoveImage` / `ReplaceImage` (§4.2, §6.2).

use crate::{
    chunk::{
        pixels::{decode_image_blob, encode_image_blob},
        ChunkKind, UndoChunk,
    },
    doc::{Image, Stock},
    error::{UndoError, UndoResult},
    io::{ByteReader, ByteWriter},
    object::{ImageHandle, ObjectId, ObjectsContainer, StockHandle},
};
use std::{cell::RefCell, rc::Rc};

fn require_stock(objects: &ObjectsContainer, id: ObjectId) -> UndoResult<StockHandle> {
    objects
        .get::<Stock>(id)
        .ok_or_else(|| UndoError::mismatch("referenced stock no longer exists"))
}

/// Inserts `image` at `index` and records its removal as the inverse.
pub fn encode_add_image(
    objects: &mut ObjectsContainer,
    stock: StockHandle,
    index: usize,
    image: ImageHandle,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let stock_id = objects.add(stock.clone());
    stock.borrow_mut().insert(index, image);

    let mut writer = ByteWriter::new();
    writer.u32(stock_id.0).u16(index as u16);
    Ok(UndoChunk::new(ChunkKind::AddImage, label, writer.into_vec()))
}

pub fn invert_add_image(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let stock_id = ObjectId(reader.u32());
    let index = reader.u16() as usize;

    let stock = require_stock(objects, stock_id)?;
    let image = stock
        .borrow_mut()
        .remove(index)
        .ok_or_else(|| UndoError::mismatch("stock index has no image to remove"))?;
    let image_id = objects.add(image.clone());

    let mut writer = ByteWriter::new();
    writer
        .u32(stock_id.0)
        .u16(index as u16)
        .bytes(&encode_image_blob(image_id, &image.borrow()));
    Ok(UndoChunk::new(ChunkKind::RemoveImage, chunk.label(), writer.into_vec()))
}

/// Removes the image at `index`, snapshotting it into the chunk.
pub fn encode_remove_image(
    objects: &mut ObjectsContainer,
    stock: StockHandle,
    index: usize,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let stock_id = objects.add(stock.clone());
    let image = stock
        .borrow_mut()
        .remove(index)
        .ok_or_else(|| UndoError::mismatch("stock index has no image to remove"))?;
    let image_id = objects.add(image.clone());

    let mut writer = ByteWriter::new();
    writer
        .u32(stock_id.0)
        .u16(index as u16)
        .bytes(&encode_image_blob(image_id, &image.borrow()));
    Ok(UndoChunk::new(ChunkKind::RemoveImage, label, writer.into_vec()))
}

pub fn invert_remove_image(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let stock_id = ObjectId(reader.u32());
    let index = reader.u16() as usize;
    let (image_id, image) = decode_image_blob(&mut reader)?;

    let handle: ImageHandle = Rc::new(RefCell::new(image));
    objects.insert(image_id, handle.clone());
    let stock = require_stock(objects, stock_id)?;
    stock.borrow_mut().insert(index, handle);

    let mut writer = ByteWriter::new();
    writer.u32(stock_id.0).u16(index as u16);
    Ok(UndoChunk::new(ChunkKind::AddImage, chunk.label(), writer.into_vec()))
}

/// Swaps in `new_image` at `index`, snapshotting the image it replaced.
pub fn encode_replace_image(
    objects: &mut ObjectsContainer,
    stock: StockHandle,
    index: usize,
    new_image: ImageHandle,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let stock_id = objects.add(stock.clone());
    let previous = stock
        .borrow_mut()
        .replace(index, new_image)
        .ok_or_else(|| UndoError::mismatch("stock index has no image to replace"))?;
    let previous_id = objects.add(previous.clone());

    let mut writer = ByteWriter::new();
    writer
        .u32(stock_id.0)
        .u16(index as u16)
        .bytes(&encode_image_blob(previous_id, &previous.borrow()));
    Ok(UndoChunk::new(ChunkKind::ReplaceImage, label, writer.into_vec()))
}

pub fn invert_replace_image(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let stock_id = ObjectId(reader.u32());
    let index = reader.u16() as usize;
    let (image_id, image) = decode_image_blob(&mut reader)?;

    let handle: ImageHandle = Rc::new(RefCell::new(image));
    objects.insert(image_id, handle.clone());
    let stock = require_stock(objects, stock_id)?;
    let current = stock
        .borrow_mut()
        .replace(index, handle)
        .ok_or_else(|| UndoError::mismatch("stock index has no image to replace"))?;
    let current_id = objects.add(current.clone());

    let mut writer = ByteWriter::new();
    writer
        .u32(stock_id.0)
        .u16(index as u16)
        .bytes(&encode_image_blob(current_id, &current.borrow()));
    Ok(UndoChunk::new(ChunkKind::ReplaceImage, chunk.label(), writer.into_vec()))
}
