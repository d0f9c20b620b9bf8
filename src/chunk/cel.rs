//! `AddCel` / `RemoveCel` (§4.2, §6.2).

use crate::{
    chunk::{ChunkKind, UndoChunk},
    doc::{Cel, Layer, Sprite},
    error::{UndoError, UndoResult},
    io::{ByteReader, ByteWriter},
    object::{CelHandle, ImageHandle, LayerHandle, ObjectId, ObjectsContainer, StockHandle},
};
use std::rc::Rc;

pub(super) fn require_layer(objects: &ObjectsContainer, id: ObjectId) -> UndoResult<LayerHandle> {
    objects
        .get::<Layer>(id)
        .ok_or_else(|| UndoError::mismatch("referenced layer no longer exists"))
}

pub(super) fn stock_of(objects: &ObjectsContainer, layer: &LayerHandle) -> UndoResult<StockHandle> {
    let sprite_id = layer.borrow().sprite_id;
    let sprite = objects
        .get::<Sprite>(sprite_id)
        .ok_or_else(|| UndoError::mismatch("layer's sprite no longer exists"))?;
    let stock = sprite.borrow().stock.clone();
    Ok(stock)
}

pub(super) fn stock_index_of(stock: &StockHandle, image: &ImageHandle) -> UndoResult<u16> {
    let stock = stock.borrow();
    for index in 0..stock.len() {
        if let Some(candidate) = stock.get(index) {
            if Rc::ptr_eq(&candidate, image) {
                return Ok(index as u16);
            }
        }
    }
    Err(UndoError::mismatch("cel's image is not present in its sprite's stock"))
}

/// `u32 id; u16 frame; u16 image_idx; i16 x; i16 y; u16 opacity` (§6.2).
pub(super) fn encode_cel_blob(id: ObjectId, cel: &Cel, image_idx: u16) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    writer
        .u32(id.0)
        .u16(cel.frame)
        .u16(image_idx)
        .i16(cel.x)
        .i16(cel.y)
        .u16(cel.opacity);
    writer.into_vec()
}

pub(super) struct DecodedCel {
    pub(super) id: ObjectId,
    pub(super) frame: u16,
    pub(super) image_idx: u16,
    pub(super) x: i16,
    pub(super) y: i16,
    pub(super) opacity: u16,
}

pub(super) fn decode_cel_blob(reader: &mut ByteReader) -> DecodedCel {
    DecodedCel {
        id: ObjectId(reader.u32()),
        frame: reader.u16(),
        image_idx: reader.u16(),
        x: reader.i16(),
        y: reader.i16(),
        opacity: reader.u16(),
    }
}

fn remove_cel_from_layer(layer: &LayerHandle, cel: &CelHandle) -> UndoResult<()> {
    let cels = layer
        .borrow_mut()
        .cels_mut()
        .map(|cels| cels.iter().position(|c| Rc::ptr_eq(c, cel)))
        .ok_or_else(|| UndoError::precondition("layer is a folder, not an image layer"))?;
    let index = cels.ok_or_else(|| UndoError::mismatch("cel is not attached to this layer"))?;
    layer.borrow_mut().cels_mut().unwrap().remove(index);
    Ok(())
}

pub fn encode_add_cel(
    objects: &mut ObjectsContainer,
    layer: LayerHandle,
    cel: CelHandle,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let layer_id = objects.add(layer.clone());
    let cel_id = objects.add(cel.clone());
    layer
        .borrow_mut()
        .cels_mut()
        .ok_or_else(|| UndoError::precondition("layer is a folder, not an image layer"))?
        .push(cel);

    let mut writer = ByteWriter::new();
    writer.u32(layer_id.0).u32(cel_id.0);
    Ok(UndoChunk::new(ChunkKind::AddCel, label, writer.into_vec()))
}

pub fn invert_add_cel(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let layer_id = ObjectId(reader.u32());
    let cel_id = ObjectId(reader.u32());

    let layer = require_layer(objects, layer_id)?;
    let cel = objects
        .get::<Cel>(cel_id)
        .ok_or_else(|| UndoError::mismatch("referenced cel no longer exists"))?;
    remove_cel_from_layer(&layer, &cel)?;

    let stock = stock_of(objects, &layer)?;
    let image_idx = stock_index_of(&stock, &cel.borrow().image)?;
    let blob = encode_cel_blob(cel_id, &cel.borrow(), image_idx);

    let mut writer = ByteWriter::new();
    writer.u32(layer_id.0).bytes(&blob);
    Ok(UndoChunk::new(ChunkKind::RemoveCel, chunk.label(), writer.into_vec()))
}

pub fn encode_remove_cel(
    objects: &mut ObjectsContainer,
    layer: LayerHandle,
    cel: CelHandle,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let layer_id = objects.add(layer.clone());
    let cel_id = objects.add(cel.clone());
    remove_cel_from_layer(&layer, &cel)?;

    let stock = stock_of(objects, &layer)?;
    let image_idx = stock_index_of(&stock, &cel.borrow().image)?;
    let blob = encode_cel_blob(cel_id, &cel.borrow(), image_idx);

    let mut writer = ByteWriter::new();
    writer.u32(layer_id.0).bytes(&blob);
    Ok(UndoChunk::new(ChunkKind::RemoveCel, label, writer.into_vec()))
}

pub fn invert_remove_cel(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let layer_id = ObjectId(reader.u32());
    let decoded = decode_cel_blob(&mut reader);

    let layer = require_layer(objects, layer_id)?;
    let stock = stock_of(objects, &layer)?;
    let image = stock
        .borrow()
        .get(decoded.image_idx as usize)
        .ok_or_else(|| UndoError::mismatch("cel's stock index no longer has an image"))?;

    let cel = Cel::new(decoded.frame, image, decoded.x, decoded.y, decoded.opacity);
    let handle: CelHandle = Rc::new(std::cell::RefCell::new(cel));
    objects.insert(decoded.id, handle.clone());
    layer
        .borrow_mut()
        .cels_mut()
        .ok_or_else(|| UndoError::precondition("layer is a folder, not an image layer"))?
        .push(handle);

    let mut writer = ByteWriter::new();
    writer.u32(layer_id.0).u32(decoded.id.0);
    Ok(UndoChunk::new(ChunkKind::AddCel, chunk.label(), writer.into_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::{Image, ImgType};
    use std::cell::RefCell;

    #[test]
    fn add_then_undo_removes_cel() {
        let mut objects = ObjectsContainer::new();
        let stock: StockHandle = Rc::new(RefCell::new(crate::doc::Stock::new()));
        let image: ImageHandle = Rc::new(RefCell::new(Image::new(ImgType::Rgb, 1, 1, 0)));
        stock.borrow_mut().push(image.clone());

        let sprite = Rc::new(RefCell::new(Sprite {
            current_frame: 0,
            current_layer: ObjectId::NONE,
            frame_count: 1,
            frame_durations: vec![100],
            palettes: Default::default(),
            width: 1,
            height: 1,
            imgtype: ImgType::Rgb,
            stock,
            root: Rc::new(RefCell::new(Layer::new_folder("root", ObjectId::NONE))),
        }));
        let sprite_id = objects.add(sprite.clone());
        let layer: LayerHandle = Rc::new(RefCell::new(Layer::new_image("layer 1", sprite_id)));
        let cel: CelHandle = Rc::new(RefCell::new(Cel::new(0, image, 0, 0, 255)));

        let chunk = encode_add_cel(&mut objects, layer.clone(), cel, "add cel").unwrap();
        assert_eq!(layer.borrow().cels().len(), 1);

        let inverse = invert_add_cel(&chunk, &mut objects).unwrap();
        assert_eq!(layer.borrow().cels().len(), 0);
        assert_eq!(inverse.kind(), ChunkKind::RemoveCel);
    }
}
