//! Raw-pixel chunk kinds: `Data`, `Image`, `Flip`, `Dirty` (§4.2, §6.2).
//!
//! All four follow the same shape: the encoder performs the live mutation
//! and snapshots what was there before into the chunk; the inverter writes
//! the snapshot back and snapshots the (now reverted) state into a fresh
//! chunk on the opposite stream.

use crate::{
    chunk::{ChunkKind, UndoChunk},
    doc::{FlipAxis, Image, ImgType},
    error::{UndoError, UndoResult},
    io::{ByteReader, ByteWriter},
    object::{ImageHandle, ObjectId, ObjectsContainer},
};

fn require_image(objects: &ObjectsContainer, id: ObjectId) -> UndoResult<ImageHandle> {
    objects
        .get::<Image>(id)
        .ok_or_else(|| UndoError::mismatch("referenced image no longer exists"))
}

/// `u32 id; u8 imgtype; u16 w; u16 h; u32 mask_color; [line_size(w) × h] bytes` (§6.2).
pub(crate) fn encode_image_blob(id: ObjectId, image: &Image) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer
        .u32(id.0)
        .u8(image.imgtype().as_u8())
        .u16(image.width() as u16)
        .u16(image.height() as u16)
        .u32(image.mask_color())
        .bytes(image.pixels());
    writer.into_vec()
}

pub(crate) fn decode_image_blob(reader: &mut ByteReader) -> UndoResult<(ObjectId, Image)> {
    let id = ObjectId(reader.u32());
    let imgtype = ImgType::from_u8(reader.u8())
        .ok_or_else(|| UndoError::precondition("unknown imgtype tag in image blob"))?;
    let width = reader.u16() as u32;
    let height = reader.u16() as u32;
    let mask_color = reader.u32();
    let line_size = width as usize * imgtype.bytes_per_pixel();
    let pixels = reader.bytes(line_size * height as usize).to_vec();
    Ok((id, Image::from_pixels(imgtype, width, height, mask_color, pixels)))
}

/// `Data`: an arbitrary byte range inside an image's pixel buffer (§4.2).
pub fn encode_data(
    objects: &mut ObjectsContainer,
    image: ImageHandle,
    offset: u32,
    new_bytes: &[u8],
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let id = objects.add(image.clone());
    let mut image = image.borrow_mut();
    let len = new_bytes.len() as u32;
    let range = offset as usize..offset as usize + len as usize;
    if range.end > image.pixels().len() {
        return Err(UndoError::precondition("data range is out of bounds"));
    }
    let previous = image.pixels()[range.clone()].to_vec();
    image.pixels_mut()[range].copy_from_slice(new_bytes);

    let mut writer = ByteWriter::new();
    writer.u32(id.0).u32(offset).u32(len).bytes(&previous);
    Ok(UndoChunk::new(ChunkKind::Data, label, writer.into_vec()))
}

pub fn invert_data(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let id = ObjectId(reader.u32());
    let offset = reader.u32();
    let len = reader.u32();
    let restore = reader.bytes(len as usize).to_vec();

    let image = require_image(objects, id)?;
    let mut image = image.borrow_mut();
    let range = offset as usize..offset as usize + len as usize;
    let current = image.pixels()[range.clone()].to_vec();
    image.pixels_mut()[range].copy_from_slice(&restore);

    let mut writer = ByteWriter::new();
    writer.u32(id.0).u32(offset).u32(len).bytes(&current);
    Ok(UndoChunk::new(ChunkKind::Data, chunk.label(), writer.into_vec()))
}

/// `Image`: a rectangular pixel overwrite (§4.2, §6.2).
pub fn encode_image(
    objects: &mut ObjectsContainer,
    image: ImageHandle,
    x: u32,
    y: u32,
    w: u32,
    h: u32,
    new_pixels: &[u8],
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let id = objects.add(image.clone());
    let imgtype = image.borrow().imgtype();
    let previous = image.borrow_mut().write_rect(x, y, w, h, new_pixels)?;

    let mut writer = ByteWriter::new();
    writer
        .u32(id.0)
        .u8(imgtype.as_u8())
        .u16(x as u16)
        .u16(y as u16)
        .u16(w as u16)
        .u16(h as u16)
        .bytes(&previous);
    Ok(UndoChunk::new(ChunkKind::Image, label, writer.into_vec()))
}

pub fn invert_image(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let id = ObjectId(reader.u32());
    let imgtype = ImgType::from_u8(reader.u8())
        .ok_or_else(|| UndoError::precondition("unknown imgtype tag in image chunk"))?;
    let x = reader.u16() as u32;
    let y = reader.u16() as u32;
    let w = reader.u16() as u32;
    let h = reader.u16() as u32;
    let restore = reader.bytes(reader.remaining()).to_vec();

    let image = require_image(objects, id)?;
    if image.borrow().imgtype() != imgtype {
        return Err(UndoError::mismatch("image imgtype changed since recording"));
    }
    let current = image.borrow_mut().write_rect(x, y, w, h, &restore)?;

    let mut writer = ByteWriter::new();
    writer
        .u32(id.0)
        .u8(imgtype.as_u8())
        .u16(x as u16)
        .u16(y as u16)
        .u16(w as u16)
        .u16(h as u16)
        .bytes(&current);
    Ok(UndoChunk::new(ChunkKind::Image, chunk.label(), writer.into_vec()))
}

/// `Flip`: flipping a rect about an axis is its own inverse (§4.2).
pub fn encode_flip(
    objects: &mut ObjectsContainer,
    image: ImageHandle,
    x1: u32,
    y1: u32,
    x2: u32,
    y2: u32,
    axis: FlipAxis,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let id = objects.add(image.clone());
    let imgtype = image.borrow().imgtype();
    image.borrow_mut().flip_rect(x1, y1, x2, y2, axis)?;

    let mut writer = ByteWriter::new();
    writer
        .u32(id.0)
        .u8(imgtype.as_u8())
        .u16(x1 as u16)
        .u16(y1 as u16)
        .u16(x2 as u16)
        .u16(y2 as u16)
        .u8(axis.as_u8());
    Ok(UndoChunk::new(ChunkKind::Flip, label, writer.into_vec()))
}

pub fn invert_flip(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let id = ObjectId(reader.u32());
    let _imgtype = reader.u8();
    let x1 = reader.u16() as u32;
    let y1 = reader.u16() as u32;
    let x2 = reader.u16() as u32;
    let y2 = reader.u16() as u32;
    let axis = FlipAxis::from_u8(reader.u8())
        .ok_or_else(|| UndoError::precondition("unknown flip axis tag"))?;

    let image = require_image(objects, id)?;
    image.borrow_mut().flip_rect(x1, y1, x2, y2, axis)?;

    Ok(UndoChunk::new(ChunkKind::Flip, chunk.label(), chunk.payload().to_vec()))
}

/// One sparse column span inside a [`Dirty`](ChunkKind::Dirty) row: `x`,
/// width, and the pixel bytes to swap in (§6.2).
pub struct DirtyCol {
    pub x: u16,
    pub w: u16,
    pub bytes: Vec<u8>,
}

/// One row of a [`Dirty`](ChunkKind::Dirty) diff (§6.2).
pub struct DirtyRow {
    pub y: u16,
    pub cols: Vec<DirtyCol>,
}

/// `Dirty`: a sparse rectangular pixel diff that carries enough pixels to be
/// its own inverse after a swap (§4.2, GLOSSARY). `new_rows` supplies the
/// pixel bytes to write in; the chunk stores what was overwritten.
pub fn encode_dirty(
    objects: &mut ObjectsContainer,
    image: ImageHandle,
    bbox: (u16, u16, u16, u16),
    new_rows: Vec<DirtyRow>,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let id = objects.add(image.clone());
    let imgtype = image.borrow().imgtype();

    let mut swapped_rows = Vec::with_capacity(new_rows.len());
    for row in new_rows {
        let mut cols = Vec::with_capacity(row.cols.len());
        for col in row.cols {
            let previous = image
                .borrow_mut()
                .write_rect(col.x as u32, row.y as u32, col.w as u32, 1, &col.bytes)?;
            cols.push(DirtyCol {
                x: col.x,
                w: col.w,
                bytes: previous,
            });
        }
        swapped_rows.push(DirtyRow { y: row.y, cols });
    }

    Ok(UndoChunk::new(
        ChunkKind::Dirty,
        label,
        encode_dirty_payload(imgtype, bbox, &swapped_rows, id),
    ))
}

pub fn invert_dirty(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let id = ObjectId(reader.u32());
    let imgtype = ImgType::from_u8(reader.u8())
        .ok_or_else(|| UndoError::precondition("unknown imgtype tag in dirty chunk"))?;
    let bbox = (reader.u16(), reader.u16(), reader.u16(), reader.u16());
    let row_count = reader.u16();

    let image = require_image(objects, id)?;
    let mut swapped_rows = Vec::with_capacity(row_count as usize);
    for _ in 0..row_count {
        let y = reader.u16();
        let col_count = reader.u16();
        let mut cols = Vec::with_capacity(col_count as usize);
        for _ in 0..col_count {
            let x = reader.u16();
            let w = reader.u16();
            let line_size = w as usize * imgtype.bytes_per_pixel();
            let bytes = reader.bytes(line_size).to_vec();
            let previous = image.borrow_mut().write_rect(x as u32, y as u32, w as u32, 1, &bytes)?;
            cols.push(DirtyCol { x, w, bytes: previous });
        }
        swapped_rows.push(DirtyRow { y, cols });
    }

    Ok(UndoChunk::new(
        ChunkKind::Dirty,
        chunk.label(),
        encode_dirty_payload(imgtype, bbox, &swapped_rows, id),
    ))
}

fn encode_dirty_payload(
    imgtype: ImgType,
    bbox: (u16, u16, u16, u16),
    rows: &[DirtyRow],
    id: ObjectId,
) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer
        .u32(id.0)
        .u8(imgtype.as_u8())
        .u16(bbox.0)
        .u16(bbox.1)
        .u16(bbox.2)
        .u16(bbox.3)
        .u16(rows.len() as u16);
    for row in rows {
        writer.u16(row.y).u16(row.cols.len() as u16);
        for col in &row.cols {
            writer.u16(col.x).u16(col.w).bytes(&col.bytes);
        }
    }
    writer.into_vec()
}
