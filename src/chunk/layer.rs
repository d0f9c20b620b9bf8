//! `SetLayerName` / `AddLayer` / `RemoveLayer` / `MoveLayer` / `SetLayer`
//! (§4.2, §6.2), plus the recursive raw layer subtree blob they share.

use crate::{
    chunk::{
        cel::{decode_cel_blob, encode_cel_blob, require_layer, stock_of, stock_index_of},
        ChunkKind, UndoChunk,
    },
    doc::{Cel, Layer, LayerKind, Sprite},
    error::{UndoError, UndoResult},
    io::{ByteReader, ByteWriter},
    object::{CelHandle, LayerHandle, ObjectId, ObjectsContainer, SpriteHandle},
};
use std::{cell::RefCell, rc::Rc};

const LAYER_TYPE_IMAGE: u16 = 0;
const LAYER_TYPE_FOLDER: u16 = 1;

/// Serializes `layer` and, recursively, its entire subtree (§6.2 "Layer").
/// Cels are resolved to stock indices rather than embedding image bytes —
/// a layer's cels always reference images still present in the sprite's
/// stock, since removing a layer does not touch the stock.
pub(super) fn encode_layer_blob(objects: &mut ObjectsContainer, layer: &LayerHandle) -> UndoResult<Vec<u8>> {
    let id = objects.add(layer.clone());
    let layer_ref = layer.borrow();

    let mut writer = ByteWriter::new();
    writer
        .u32(id.0)
        .text(&layer_ref.name)
        .u8(layer_ref.flags)
        .u16(if layer_ref.is_folder() { LAYER_TYPE_FOLDER } else { LAYER_TYPE_IMAGE })
        .u32(layer_ref.sprite_id.0);

    match &layer_ref.kind {
        LayerKind::Image { cels } => {
            writer.u16(cels.len() as u16);
            let stock = stock_of(objects, layer)?;
            for cel in cels {
                let cel_id = objects.add(cel.clone());
                let image_idx = stock_index_of(&stock, &cel.borrow().image)?;
                writer
                    .bytes(&encode_cel_blob(cel_id, &cel.borrow(), image_idx))
                    .u8(0);
            }
        }
        LayerKind::Folder { children } => {
            writer.u16(children.len() as u16);
            drop(layer_ref);
            for child in children {
                let blob = encode_layer_blob(objects, child)?;
                writer.bytes(&blob);
            }
        }
    }
    Ok(writer.into_vec())
}

pub(super) fn decode_layer_blob(
    reader: &mut ByteReader,
    objects: &mut ObjectsContainer,
) -> UndoResult<(ObjectId, LayerHandle)> {
    let id = ObjectId(reader.u32());
    let name = reader.text();
    let flags = reader.u8();
    let layer_type = reader.u16();
    let sprite_id = ObjectId(reader.u32());

    let kind = match layer_type {
        LAYER_TYPE_IMAGE => {
            let cel_count = reader.u16();
            let sprite = objects
                .get::<Sprite>(sprite_id)
                .ok_or_else(|| UndoError::mismatch("layer subtree's sprite no longer exists"))?;
            let stock = sprite.borrow().stock.clone();

            let mut cels = Vec::with_capacity(cel_count as usize);
            for _ in 0..cel_count {
                let decoded = decode_cel_blob(reader);
                let has_image = reader.u8();
                if has_image != 0 {
                    return Err(UndoError::precondition("inline cel images are not supported"));
                }
                let image = stock
                    .borrow()
                    .get(decoded.image_idx as usize)
                    .ok_or_else(|| UndoError::mismatch("cel's stock index has no image"))?;
                let cel = Cel::new(decoded.frame, image, decoded.x, decoded.y, decoded.opacity);
                let handle: CelHandle = Rc::new(RefCell::new(cel));
                objects.insert(decoded.id, handle.clone());
                cels.push(handle);
            }
            LayerKind::Image { cels }
        }
        LAYER_TYPE_FOLDER => {
            let child_count = reader.u16();
            let mut children = Vec::with_capacity(child_count as usize);
            for _ in 0..child_count {
                let (_child_id, child) = decode_layer_blob(reader, objects)?;
                children.push(child);
            }
            LayerKind::Folder { children }
        }
        _ => return Err(UndoError::precondition("unknown layer type tag")),
    };

    let layer = Layer {
        name,
        flags,
        sprite_id,
        parent: None,
        prev_sibling: None,
        kind,
    };
    let handle: LayerHandle = Rc::new(RefCell::new(layer));
    objects.insert(id, handle.clone());
    Ok((id, handle))
}

fn position_after(children: &[LayerHandle], after_id: ObjectId, objects: &ObjectsContainer) -> UndoResult<usize> {
    if after_id.is_none() {
        return Ok(0);
    }
    let after = require_layer(objects, after_id)?;
    children
        .iter()
        .position(|child| Rc::ptr_eq(child, &after))
        .map(|index| index + 1)
        .ok_or_else(|| UndoError::mismatch("\"after\" layer is not a child of this folder"))
}

fn remove_child(children: &mut Vec<LayerHandle>, layer: &LayerHandle) -> UndoResult<()> {
    let index = children
        .iter()
        .position(|child| Rc::ptr_eq(child, layer))
        .ok_or_else(|| UndoError::mismatch("layer is not a child of this folder"))?;
    children.remove(index);
    Ok(())
}

fn with_children<R>(
    folder: &LayerHandle,
    f: impl FnOnce(&mut Vec<LayerHandle>) -> UndoResult<R>,
) -> UndoResult<R> {
    let mut folder = folder.borrow_mut();
    let children = folder
        .children_mut()
        .ok_or_else(|| UndoError::precondition("layer is an image layer, not a folder"))?;
    f(children)
}

/// `SetLayerName`: symmetric rename (§4.2).
pub fn encode_set_layer_name(
    objects: &mut ObjectsContainer,
    layer: LayerHandle,
    new_name: impl Into<String>,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let layer_id = objects.add(layer.clone());
    let previous = std::mem::replace(&mut layer.borrow_mut().name, new_name.into());

    let mut writer = ByteWriter::new();
    writer.u32(layer_id.0).text(&previous);
    Ok(UndoChunk::new(ChunkKind::SetLayerName, label, writer.into_vec()))
}

pub fn invert_set_layer_name(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let layer_id = ObjectId(reader.u32());
    let restore = reader.text();

    let layer = require_layer(objects, layer_id)?;
    let current = std::mem::replace(&mut layer.borrow_mut().name, restore);

    let mut writer = ByteWriter::new();
    writer.u32(layer_id.0).text(&current);
    Ok(UndoChunk::new(ChunkKind::SetLayerName, chunk.label(), writer.into_vec()))
}

/// `AddLayer`: attaches `layer` into `folder` immediately after `after`
/// (or at the front, if `None`).
pub fn encode_add_layer(
    objects: &mut ObjectsContainer,
    folder: LayerHandle,
    after: Option<LayerHandle>,
    layer: LayerHandle,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let folder_id = objects.add(folder.clone());
    let after_id = after.map(|a| objects.add(a)).unwrap_or(ObjectId::NONE);
    layer.borrow_mut().parent = Some(folder_id);
    layer.borrow_mut().prev_sibling = if after_id.is_none() { None } else { Some(after_id) };
    with_children(&folder, |children| {
        let index = position_after(children, after_id, objects)?;
        children.insert(index, layer.clone());
        Ok(())
    })?;

    let layer_id = objects.add(layer);
    let mut writer = ByteWriter::new();
    writer.u32(folder_id.0).u32(layer_id.0);
    Ok(UndoChunk::new(ChunkKind::AddLayer, label, writer.into_vec()))
}

pub fn invert_add_layer(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let folder_id = ObjectId(reader.u32());
    let layer_id = ObjectId(reader.u32());

    let folder = require_layer(objects, folder_id)?;
    let layer = require_layer(objects, layer_id)?;
    let after_id = layer.borrow().prev_sibling.unwrap_or(ObjectId::NONE);
    with_children(&folder, |children| remove_child(children, &layer))?;

    let blob = encode_layer_blob(objects, &layer)?;
    let mut writer = ByteWriter::new();
    writer.u32(folder_id.0).u32(after_id.0).bytes(&blob);
    Ok(UndoChunk::new(ChunkKind::RemoveLayer, chunk.label(), writer.into_vec()))
}

/// `RemoveLayer`: detaches `layer` (and its subtree) from `folder`.
pub fn encode_remove_layer(
    objects: &mut ObjectsContainer,
    folder: LayerHandle,
    layer: LayerHandle,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let folder_id = objects.add(folder.clone());
    let after_id = layer.borrow().prev_sibling.unwrap_or(ObjectId::NONE);
    with_children(&folder, |children| remove_child(children, &layer))?;

    let blob = encode_layer_blob(objects, &layer)?;
    let mut writer = ByteWriter::new();
    writer.u32(folder_id.0).u32(after_id.0).bytes(&blob);
    Ok(UndoChunk::new(ChunkKind::RemoveLayer, label, writer.into_vec()))
}

pub fn invert_remove_layer(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let folder_id = ObjectId(reader.u32());
    let after_id = ObjectId(reader.u32());
    let (layer_id, layer) = decode_layer_blob(&mut reader, objects)?;

    let folder = require_layer(objects, folder_id)?;
    layer.borrow_mut().parent = Some(folder_id);
    layer.borrow_mut().prev_sibling = if after_id.is_none() { None } else { Some(after_id) };
    with_children(&folder, |children| {
        let index = position_after(children, after_id, objects)?;
        children.insert(index, layer.clone());
        Ok(())
    })?;

    let mut writer = ByteWriter::new();
    writer.u32(folder_id.0).u32(layer_id.0);
    Ok(UndoChunk::new(ChunkKind::AddLayer, chunk.label(), writer.into_vec()))
}

/// `MoveLayer`: reparents `layer` to a new position within `folder`,
/// symmetric around the position it moved from (§4.2).
pub fn encode_move_layer(
    objects: &mut ObjectsContainer,
    folder: LayerHandle,
    layer: LayerHandle,
    after: Option<LayerHandle>,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let folder_id = objects.add(folder.clone());
    let layer_id = objects.add(layer.clone());
    let old_after_id = layer.borrow().prev_sibling.unwrap_or(ObjectId::NONE);

    with_children(&folder, |children| remove_child(children, &layer))?;
    let new_after_id = after.map(|a| objects.add(a)).unwrap_or(ObjectId::NONE);
    with_children(&folder, |children| {
        let index = position_after(children, new_after_id, objects)?;
        children.insert(index, layer.clone());
        Ok(())
    })?;
    layer.borrow_mut().prev_sibling = if new_after_id.is_none() { None } else { Some(new_after_id) };

    let mut writer = ByteWriter::new();
    writer.u32(folder_id.0).u32(layer_id.0).u32(old_after_id.0);
    Ok(UndoChunk::new(ChunkKind::MoveLayer, label, writer.into_vec()))
}

pub fn invert_move_layer(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let folder_id = ObjectId(reader.u32());
    let layer_id = ObjectId(reader.u32());
    let target_after_id = ObjectId(reader.u32());

    let folder = require_layer(objects, folder_id)?;
    let layer = require_layer(objects, layer_id)?;
    let current_after_id = layer.borrow().prev_sibling.unwrap_or(ObjectId::NONE);

    with_children(&folder, |children| remove_child(children, &layer))?;
    with_children(&folder, |children| {
        let index = position_after(children, target_after_id, objects)?;
        children.insert(index, layer.clone());
        Ok(())
    })?;
    layer.borrow_mut().prev_sibling = if target_after_id.is_none() { None } else { Some(target_after_id) };

    let mut writer = ByteWriter::new();
    writer.u32(folder_id.0).u32(layer_id.0).u32(current_after_id.0);
    Ok(UndoChunk::new(ChunkKind::MoveLayer, chunk.label(), writer.into_vec()))
}

/// `SetLayer`: symmetric change of a sprite's current layer (§4.2).
pub fn encode_set_layer(
    objects: &mut ObjectsContainer,
    sprite: SpriteHandle,
    layer: LayerHandle,
    label: impl Into<String>,
) -> UndoResult<UndoChunk> {
    let sprite_id = objects.add(sprite.clone());
    let layer_id = objects.add(layer);
    let previous = sprite.borrow().current_layer;
    sprite.borrow_mut().current_layer = layer_id;

    let mut writer = ByteWriter::new();
    writer.u32(sprite_id.0).u32(previous.0);
    Ok(UndoChunk::new(ChunkKind::SetLayer, label, writer.into_vec()))
}

pub fn invert_set_layer(chunk: &UndoChunk, objects: &mut ObjectsContainer) -> UndoResult<UndoChunk> {
    let mut reader = ByteReader::new(chunk.payload());
    let sprite_id = ObjectId(reader.u32());
    let restore = ObjectId(reader.u32());

    let sprite = objects
        .get::<Sprite>(sprite_id)
        .ok_or_else(|| UndoError::mismatch("referenced sprite no longer exists"))?;
    let current = sprite.borrow().current_layer;
    sprite.borrow_mut().current_layer = restore;

    let mut writer = ByteWriter::new();
    writer.u32(sprite_id.0).u32(current.0);
    Ok(UndoChunk::new(ChunkKind::SetLayer, chunk.label(), writer.into_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::{Image, ImgType, Stock};
    use crate::object::ImageHandle;

    /// A sprite with `image_count` images already pushed onto its stock, so
    /// cels can reference them by index during `encode_layer_blob`.
    fn sprite_with_stock(image_count: usize) -> (SpriteHandle, Vec<ImageHandle>) {
        let stock = Rc::new(RefCell::new(Stock::new()));
        let mut images = Vec::with_capacity(image_count);
        for i in 0..image_count {
            let image: ImageHandle = Rc::new(RefCell::new(Image::new(ImgType::Rgb, 1, 1, i as u32)));
            stock.borrow_mut().push(image.clone());
            images.push(image);
        }
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
        (sprite, images)
    }

    #[test]
    fn rename_round_trips() {
        let mut objects = ObjectsContainer::new();
        let layer: LayerHandle = Rc::new(RefCell::new(Layer::new_image("before", ObjectId::NONE)));

        let chunk = encode_set_layer_name(&mut objects, layer.clone(), "after", "rename").unwrap();
        assert_eq!(layer.borrow().name, "after");

        let inverse = invert_set_layer_name(&chunk, &mut objects).unwrap();
        assert_eq!(layer.borrow().name, "before");
        assert_eq!(inverse.kind(), ChunkKind::SetLayerName);
    }

    #[test]
    fn add_then_undo_removes_leaf_image_layer() {
        let mut objects = ObjectsContainer::new();
        let (sprite, _images) = sprite_with_stock(0);
        let sprite_id = objects.add(sprite.clone());
        let folder: LayerHandle = Rc::new(RefCell::new(Layer::new_folder("group", sprite_id)));
        let leaf: LayerHandle = Rc::new(RefCell::new(Layer::new_image("leaf", sprite_id)));

        let chunk = encode_add_layer(&mut objects, folder.clone(), None, leaf.clone(), "add leaf").unwrap();
        assert_eq!(folder.borrow().children().len(), 1);
        assert!(Rc::ptr_eq(&folder.borrow().children()[0], &leaf));

        let inverse = invert_add_layer(&chunk, &mut objects).unwrap();
        assert!(folder.borrow().children().is_empty());
        assert_eq!(inverse.kind(), ChunkKind::RemoveLayer);
    }

    #[test]
    fn remove_then_undo_restores_leaf_layer_with_cel() {
        let mut objects = ObjectsContainer::new();
        let (sprite, images) = sprite_with_stock(2);
        let sprite_id = objects.add(sprite.clone());
        let folder: LayerHandle = Rc::new(RefCell::new(Layer::new_folder("group", sprite_id)));
        let leaf: LayerHandle = Rc::new(RefCell::new(Layer::new_image("leaf", sprite_id)));
        leaf.borrow_mut()
            .cels_mut()
            .unwrap()
            .push(Rc::new(RefCell::new(Cel::new(0, images[1].clone(), 5, -2, 128))));
        folder.borrow_mut().children_mut().unwrap().push(leaf.clone());

        let chunk = encode_remove_layer(&mut objects, folder.clone(), leaf.clone(), "remove leaf").unwrap();
        assert!(folder.borrow().children().is_empty());

        let inverse = invert_remove_layer(&chunk, &mut objects).unwrap();
        assert_eq!(inverse.kind(), ChunkKind::AddLayer);
        assert_eq!(folder.borrow().children().len(), 1);

        let restored = folder.borrow().children()[0].clone();
        assert_eq!(restored.borrow().name, "leaf");
        let cels = restored.borrow().cels().to_vec();
        assert_eq!(cels.len(), 1);
        let cel = cels[0].borrow();
        assert_eq!(cel.frame, 0);
        assert_eq!(cel.x, 5);
        assert_eq!(cel.y, -2);
        assert_eq!(cel.opacity, 128);
        assert!(Rc::ptr_eq(&cel.image, &images[1]));
    }

    #[test]
    fn add_then_undo_removes_folder_with_children() {
        let mut objects = ObjectsContainer::new();
        let (sprite, _images) = sprite_with_stock(0);
        let sprite_id = objects.add(sprite.clone());
        let root: LayerHandle = Rc::new(RefCell::new(Layer::new_folder("root", sprite_id)));
        let group: LayerHandle = Rc::new(RefCell::new(Layer::new_folder("group", sprite_id)));
        let child: LayerHandle = Rc::new(RefCell::new(Layer::new_image("child", sprite_id)));
        group.borrow_mut().children_mut().unwrap().push(child);

        let chunk = encode_add_layer(&mut objects, root.clone(), None, group.clone(), "add group").unwrap();
        assert_eq!(root.borrow().children().len(), 1);

        let inverse = invert_add_layer(&chunk, &mut objects).unwrap();
        assert!(root.borrow().children().is_empty());
        assert_eq!(inverse.kind(), ChunkKind::RemoveLayer);

        let redo = invert_remove_layer(&inverse, &mut objects).unwrap();
        assert_eq!(root.borrow().children().len(), 1);
        let restored = root.borrow().children()[0].clone();
        assert_eq!(restored.borrow().name, "group");
        assert!(restored.borrow().is_folder());
        assert_eq!(restored.borrow().children().len(), 1);
        assert_eq!(restored.borrow().children()[0].borrow().name, "child");
        assert_eq!(redo.kind(), ChunkKind::AddLayer);
    }

    #[test]
    fn move_layer_round_trips() {
        let mut objects = ObjectsContainer::new();
        let (sprite, _images) = sprite_with_stock(0);
        let sprite_id = objects.add(sprite.clone());
        let folder: LayerHandle = Rc::new(RefCell::new(Layer::new_folder("group", sprite_id)));
        let first: LayerHandle = Rc::new(RefCell::new(Layer::new_image("first", sprite_id)));
        let second: LayerHandle = Rc::new(RefCell::new(Layer::new_image("second", sprite_id)));
        folder.borrow_mut().children_mut().unwrap().push(first.clone());
        folder.borrow_mut().children_mut().unwrap().push(second.clone());
        let first_id = objects.add(first.clone());
        second.borrow_mut().prev_sibling = Some(first_id);

        let chunk = encode_move_layer(&mut objects, folder.clone(), second.clone(), None, "reorder").unwrap();
        assert!(Rc::ptr_eq(&folder.borrow().children()[0], &second));
        assert!(Rc::ptr_eq(&folder.borrow().children()[1], &first));

        invert_move_layer(&chunk, &mut objects).unwrap();
        assert!(Rc::ptr_eq(&folder.borrow().children()[0], &first));
        assert!(Rc::ptr_eq(&folder.borrow().children()[1], &second));
    }

    #[test]
    fn set_layer_round_trips() {
        let mut objects = ObjectsContainer::new();
        let (sprite, _images) = sprite_with_stock(0);
        let previous_current = sprite.borrow().current_layer;
        let layer: LayerHandle = Rc::new(RefCell::new(Layer::new_image("layer", ObjectId::NONE)));

        let chunk = encode_set_layer(&mut objects, sprite.clone(), layer.clone(), "select layer").unwrap();
        let layer_id = objects.add(layer.clone());
        assert_eq!(sprite.borrow().current_layer, layer_id);

        invert_set_layer(&chunk, &mut objects).unwrap();
        assert_eq!(sprite.borrow().current_layer, previous_current);
    }

    /// S6: a folder holding two image layers, each with two cels, removed
    /// and undone — the whole subtree, including cel geometry and stock
    /// links, must come back byte-for-byte.
    #[test]
    fn removing_and_restoring_folder_subtree_round_trips_byte_for_byte() {
        let mut objects = ObjectsContainer::new();
        let (sprite, images) = sprite_with_stock(4);
        let sprite_id = objects.add(sprite.clone());

        let group: LayerHandle = Rc::new(RefCell::new(Layer::new_folder("group", sprite_id)));
        let layer_a: LayerHandle = Rc::new(RefCell::new(Layer::new_image("a", sprite_id)));
        let layer_b: LayerHandle = Rc::new(RefCell::new(Layer::new_image("b", sprite_id)));

        layer_a
            .borrow_mut()
            .cels_mut()
            .unwrap()
            .push(Rc::new(RefCell::new(Cel::new(0, images[0].clone(), 1, 2, 255))));
        layer_a
            .borrow_mut()
            .cels_mut()
            .unwrap()
            .push(Rc::new(RefCell::new(Cel::new(1, images[1].clone(), -3, 4, 128))));
        layer_b
            .borrow_mut()
            .cels_mut()
            .unwrap()
            .push(Rc::new(RefCell::new(Cel::new(0, images[2].clone(), 10, -10, 64))));
        layer_b
            .borrow_mut()
            .cels_mut()
            .unwrap()
            .push(Rc::new(RefCell::new(Cel::new(1, images[3].clone(), 0, 0, 32))));

        group.borrow_mut().children_mut().unwrap().push(layer_a.clone());
        group.borrow_mut().children_mut().unwrap().push(layer_b.clone());

        let root = sprite.borrow().root.clone();
        root.borrow_mut().children_mut().unwrap().push(group.clone());

        let chunk = encode_remove_layer(&mut objects, root.clone(), group.clone(), "remove group").unwrap();
        assert!(root.borrow().children().is_empty());

        let inverse = invert_remove_layer(&chunk, &mut objects).unwrap();
        assert_eq!(inverse.kind(), ChunkKind::AddLayer);
        assert_eq!(root.borrow().children().len(), 1);

        let restored_group = root.borrow().children()[0].clone();
        assert_eq!(restored_group.borrow().name, "group");
        assert!(restored_group.borrow().is_folder());
        let restored_children = restored_group.borrow().children().to_vec();
        assert_eq!(restored_children.len(), 2);

        let expectations: [(&str, Vec<(u16, i16, i16, u16, usize)>); 2] = [
            ("a", vec![(0, 1, 2, 255, 0), (1, -3, 4, 128, 1)]),
            ("b", vec![(0, 10, -10, 64, 2), (1, 0, 0, 32, 3)]),
        ];

        for (restored_layer, expected) in restored_children.iter().zip(expectations.iter()) {
            assert_eq!(restored_layer.borrow().name, expected.0);
            let cels = restored_layer.borrow().cels().to_vec();
            assert_eq!(cels.len(), expected.1.len());
            for (cel, &(frame, x, y, opacity, image_index)) in cels.iter().zip(expected.1.iter()) {
                let cel = cel.borrow();
                assert_eq!(cel.frame, frame);
                assert_eq!(cel.x, x);
                assert_eq!(cel.y, y);
                assert_eq!(cel.opacity, opacity);
                assert!(Rc::ptr_eq(&cel.image, &images[image_index]));
            }
        }
    }
}
