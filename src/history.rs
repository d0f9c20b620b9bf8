//! `UndoHistory` (§4.3, §4.4): the dual-stream controller. Records new
//! chunks onto `undo`, consumes chunks during undo/redo while recording
//! inverses onto the other stream, enforces the memory budget, and tracks
//! saved-state and group labels.

use crate::{
    chunk::{self, kinds, kinds::DirtyRow, ChunkKind, UndoChunk},
    config::UndoConfig,
    doc::{FlipAxis, ImgType, Mask},
    error::UndoResult,
    object::{
        CelHandle, DocumentHandle, ImageHandle, LayerHandle, ObjectsContainer, PaletteHandle,
        SpriteHandle, StockHandle,
    },
    stream::{count_undo_groups, is_out_of_group, UndoStream},
};
use num_format::{Locale, ToFormattedString};

/// Which stream a replay step consumes from; the other receives the
/// produced inverse (§4.3 runUndo).
#[derive(Clone, Copy)]
enum Source {
    Undo,
    Redo,
}

/// Dual-stream undo/redo controller (§4.3). Owns no document state; all
/// mutations happen through [`chunk::invert`] against a caller-supplied
/// [`ObjectsContainer`].
pub struct UndoHistory {
    undo: UndoStream,
    redo: UndoStream,
    label: String,
    enabled: bool,
    diff_count: i64,
    diff_saved: i64,
    limit_bytes: usize,
}

impl UndoHistory {
    pub fn new(limit_bytes: usize) -> Self {
        Self {
            undo: UndoStream::new(),
            redo: UndoStream::new(),
            label: String::new(),
            enabled: true,
            diff_count: 0,
            diff_saved: 0,
            limit_bytes,
        }
    }

    pub fn from_config(config: &UndoConfig) -> Self {
        Self::new(config.undo_size_limit_bytes())
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Disabling does not block the live mutation an encoder performs, only
    /// whether the resulting chunk is kept in history (§4.3).
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn set_label(&mut self, label: impl Into<String>) {
        self.label = label.into();
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn get_next_undo_label(&self) -> Option<&str> {
        self.undo.peek_head().map(UndoChunk::label)
    }

    pub fn get_next_redo_label(&self) -> Option<&str> {
        self.redo.peek_head().map(UndoChunk::label)
    }

    pub fn mark_saved_state(&mut self) {
        self.diff_saved = self.diff_count;
    }

    pub fn is_saved_state(&self) -> bool {
        self.diff_count == self.diff_saved
    }

    pub fn clear_redo(&mut self) {
        self.redo.clear();
    }

    pub fn undo_mem_size(&self) -> u64 {
        self.undo.mem_size()
    }

    pub fn redo_mem_size(&self) -> u64 {
        self.redo.mem_size()
    }

    /// Emits an `OPEN` group delimiter onto `undo` (§4.3).
    pub fn undo_open(&mut self) {
        let chunk = chunk::kinds::encode_open(self.label.clone());
        self.undo.push(chunk);
        self.update_undo();
    }

    /// Emits a `CLOSE` group delimiter onto `undo` (§4.3).
    pub fn undo_close(&mut self) {
        let chunk = chunk::kinds::encode_close(self.label.clone());
        self.undo.push(chunk);
        self.update_undo();
    }

    /// Appends an already-encoded chunk to `undo` and runs `updateUndo`
    /// (§4.3). No-op (besides the live mutation the caller already
    /// performed via its encoder) when history recording is disabled.
    fn record(&mut self, chunk: UndoResult<UndoChunk>) -> UndoResult<()> {
        let chunk = chunk?;
        if !self.enabled {
            return Ok(());
        }
        self.undo.push(chunk);
        self.update_undo();
        Ok(())
    }

    /// §4.3 updateUndo: bump `diffCount`, clear `redo`, and — only when the
    /// stream just returned to depth zero — evict tail groups until back
    /// under budget or only one group remains (§8 P4).
    fn update_undo(&mut self) {
        self.diff_count += 1;
        self.clear_redo();

        if is_out_of_group(&self.undo) {
            while count_undo_groups(&self.undo) > 1 && self.undo.mem_size() > self.limit_bytes as u64 {
                trace!(
                    "undo stream over budget ({} > {} bytes), discarding oldest group",
                    self.undo.mem_size().to_formatted_string(&Locale::en),
                    self.limit_bytes.to_formatted_string(&Locale::en)
                );
                self.discard_tail();
            }
        }
    }

    /// Frees chunks from the tail of `undo` until exiting the tail group,
    /// without invoking inverters or touching live state (§4.3
    /// discardTail).
    fn discard_tail(&mut self) {
        let mut depth: i64 = 0;
        loop {
            let chunk = match self.undo.pop_tail() {
                Some(chunk) => chunk,
                None => break,
            };
            match chunk.kind() {
                ChunkKind::Close => depth += 1,
                ChunkKind::Open => depth -= 1,
                _ => {}
            }
            if depth == 0 {
                break;
            }
        }
    }

    /// §4.3 runUndo: pops exactly one group (or one out-of-group chunk) from
    /// `source`, inverting each chunk against `objects` and recording its
    /// inverse onto the opposite stream.
    fn run(&mut self, objects: &mut ObjectsContainer, source: Source) -> UndoResult<()> {
        let mut depth: i64 = 0;
        loop {
            let popped = match source {
                Source::Undo => self.undo.pop_head(),
                Source::Redo => self.redo.pop_head(),
            };
            let chunk = match popped {
                Some(chunk) => chunk,
                None => break,
            };
            self.label = chunk.label().to_string();

            let inverse = chunk::invert(&chunk, objects)?;
            match source {
                Source::Undo => self.redo.push(inverse),
                Source::Redo => self.undo.push(inverse),
            }

            match chunk.kind() {
                ChunkKind::Open => depth += 1,
                ChunkKind::Close => depth -= 1,
                _ => {}
            }
            self.diff_count += match source {
                Source::Undo => -1,
                Source::Redo => 1,
            };

            if depth == 0 {
                break;
            }
        }
        Ok(())
    }

    /// Replays one full group off `undo` (§4.3, §8 P3).
    pub fn do_undo(&mut self, objects: &mut ObjectsContainer) -> UndoResult<()> {
        self.run(objects, Source::Undo)
    }

    /// Replays one full group off `redo` (§4.3, §8 P3).
    pub fn do_redo(&mut self, objects: &mut ObjectsContainer) -> UndoResult<()> {
        self.run(objects, Source::Redo)
    }

    pub fn record_data(
        &mut self,
        objects: &mut ObjectsContainer,
        image: ImageHandle,
        offset: u32,
        new_bytes: &[u8],
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_data(objects, image, offset, new_bytes, label))
    }

    pub fn record_image(
        &mut self,
        objects: &mut ObjectsContainer,
        image: ImageHandle,
        x: u32,
        y: u32,
        w: u32,
        h: u32,
        new_pixels: &[u8],
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_image(objects, image, x, y, w, h, new_pixels, label))
    }

    pub fn record_flip(
        &mut self,
        objects: &mut ObjectsContainer,
        image: ImageHandle,
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
        axis: FlipAxis,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_flip(objects, image, x1, y1, x2, y2, axis, label))
    }

    pub fn record_dirty(
        &mut self,
        objects: &mut ObjectsContainer,
        image: ImageHandle,
        bbox: (u16, u16, u16, u16),
        rows: Vec<DirtyRow>,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_dirty(objects, image, bbox, rows, label))
    }

    pub fn record_add_image(
        &mut self,
        objects: &mut ObjectsContainer,
        stock: StockHandle,
        index: usize,
        image: ImageHandle,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_add_image(objects, stock, index, image, label))
    }

    pub fn record_remove_image(
        &mut self,
        objects: &mut ObjectsContainer,
        stock: StockHandle,
        index: usize,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_remove_image(objects, stock, index, label))
    }

    pub fn record_replace_image(
        &mut self,
        objects: &mut ObjectsContainer,
        stock: StockHandle,
        index: usize,
        new_image: ImageHandle,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_replace_image(objects, stock, index, new_image, label))
    }

    pub fn record_add_cel(
        &mut self,
        objects: &mut ObjectsContainer,
        layer: LayerHandle,
        cel: CelHandle,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_add_cel(objects, layer, cel, label))
    }

    pub fn record_remove_cel(
        &mut self,
        objects: &mut ObjectsContainer,
        layer: LayerHandle,
        cel: CelHandle,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_remove_cel(objects, layer, cel, label))
    }

    pub fn record_set_layer_name(
        &mut self,
        objects: &mut ObjectsContainer,
        layer: LayerHandle,
        new_name: impl Into<String>,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_set_layer_name(objects, layer, new_name, label))
    }

    pub fn record_add_layer(
        &mut self,
        objects: &mut ObjectsContainer,
        folder: LayerHandle,
        after: Option<LayerHandle>,
        layer: LayerHandle,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_add_layer(objects, folder, after, layer, label))
    }

    pub fn record_remove_layer(
        &mut self,
        objects: &mut ObjectsContainer,
        folder: LayerHandle,
        layer: LayerHandle,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_remove_layer(objects, folder, layer, label))
    }

    pub fn record_move_layer(
        &mut self,
        objects: &mut ObjectsContainer,
        folder: LayerHandle,
        layer: LayerHandle,
        after: Option<LayerHandle>,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_move_layer(objects, folder, layer, after, label))
    }

    pub fn record_set_layer(
        &mut self,
        objects: &mut ObjectsContainer,
        sprite: SpriteHandle,
        layer: LayerHandle,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_set_layer(objects, sprite, layer, label))
    }

    pub fn record_add_palette(
        &mut self,
        objects: &mut ObjectsContainer,
        sprite: SpriteHandle,
        palette: PaletteHandle,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_add_palette(objects, sprite, palette, label))
    }

    pub fn record_remove_palette(
        &mut self,
        objects: &mut ObjectsContainer,
        sprite: SpriteHandle,
        frame: u16,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_remove_palette(objects, sprite, frame, label))
    }

    pub fn record_set_palette_colors(
        &mut self,
        objects: &mut ObjectsContainer,
        sprite: SpriteHandle,
        frame: u16,
        from: usize,
        colors: &[u32],
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_set_palette_colors(objects, sprite, frame, from, colors, label))
    }

    pub fn record_remap_palette(
        &mut self,
        objects: &mut ObjectsContainer,
        sprite: SpriteHandle,
        frame_from: u16,
        frame_to: u16,
        mapping: [u8; 256],
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_remap_palette(objects, sprite, frame_from, frame_to, mapping, label))
    }

    pub fn record_set_mask(
        &mut self,
        objects: &mut ObjectsContainer,
        doc: DocumentHandle,
        new_mask: Mask,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_set_mask(objects, doc, new_mask, label))
    }

    pub fn record_set_imgtype(
        &mut self,
        objects: &mut ObjectsContainer,
        sprite: SpriteHandle,
        new_imgtype: ImgType,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_set_imgtype(objects, sprite, new_imgtype, label))
    }

    pub fn record_set_size(
        &mut self,
        objects: &mut ObjectsContainer,
        sprite: SpriteHandle,
        width: u16,
        height: u16,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_set_size(objects, sprite, width, height, label))
    }

    pub fn record_set_frame(
        &mut self,
        objects: &mut ObjectsContainer,
        sprite: SpriteHandle,
        frame: u16,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_set_frame(objects, sprite, frame, label))
    }

    pub fn record_set_frames(
        &mut self,
        objects: &mut ObjectsContainer,
        sprite: SpriteHandle,
        total: u16,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_set_frames(objects, sprite, total, label))
    }

    pub fn record_set_frlen(
        &mut self,
        objects: &mut ObjectsContainer,
        sprite: SpriteHandle,
        frame: u16,
        duration: u16,
    ) -> UndoResult<()> {
        let label = self.label.clone();
        self.record(kinds::encode_set_frlen(objects, sprite, frame, duration, label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        doc::{Layer, Sprite, Stock},
        object::ObjectId,
    };
    use std::{cell::RefCell, rc::Rc};

    fn lone_sprite() -> SpriteHandle {
        Rc::new(RefCell::new(Sprite {
            current_frame: 0,
            current_layer: ObjectId::NONE,
            frame_count: 1,
            frame_durations: vec![100],
            palettes: Default::default(),
            width: 100,
            height: 100,
            imgtype: ImgType::Rgb,
            stock: Rc::new(RefCell::new(Stock::new())),
            root: Rc::new(RefCell::new(Layer::new_folder("root", ObjectId::NONE))),
        }))
    }

    // S1: record a resize, undo restores the old size, redo restores the new one.
    #[test]
    fn set_size_undo_redo_round_trips() {
        let mut objects = ObjectsContainer::new();
        let mut history = UndoHistory::new(8 << 20);
        let sprite = lone_sprite();

        history.set_label("resize");
        history.record_set_size(&mut objects, sprite.clone(), 200, 150).unwrap();
        assert_eq!(sprite.borrow().size(), (200, 150));
        assert!(!history.can_redo());

        history.do_undo(&mut objects).unwrap();
        assert_eq!(sprite.borrow().size(), (100, 100));
        assert!(history.can_redo());

        history.do_redo(&mut objects).unwrap();
        assert_eq!(sprite.borrow().size(), (200, 150));
    }

    // S2: a two-chunk group inside OPEN/CLOSE undoes atomically in one call.
    #[test]
    fn group_atomicity_undoes_both_chunks_together() {
        let mut objects = ObjectsContainer::new();
        let mut history = UndoHistory::new(8 << 20);
        let sprite = lone_sprite();

        history.set_label("resize twice");
        history.undo_open();
        history.record_set_size(&mut objects, sprite.clone(), 150, 100).unwrap();
        history.record_set_size(&mut objects, sprite.clone(), 200, 150).unwrap();
        history.undo_close();

        history.do_undo(&mut objects).unwrap();
        assert_eq!(sprite.borrow().size(), (100, 100));
        assert!(!history.can_undo());
        assert_eq!(count_undo_groups(&history.redo), 1);
    }

    // P2/S5: saved-state law.
    #[test]
    fn saved_state_restores_after_matching_undo() {
        let mut objects = ObjectsContainer::new();
        let mut history = UndoHistory::new(8 << 20);
        let sprite = lone_sprite();

        history.record_set_frame(&mut objects, sprite.clone(), 1).unwrap();
        history.record_set_frame(&mut objects, sprite.clone(), 2).unwrap();
        history.mark_saved_state();
        assert!(history.is_saved_state());

        history.record_set_frame(&mut objects, sprite.clone(), 3).unwrap();
        assert!(!history.is_saved_state());

        history.do_undo(&mut objects).unwrap();
        assert!(history.is_saved_state());
    }

    // P6: any recording clears redo.
    #[test]
    fn recording_clears_redo() {
        let mut objects = ObjectsContainer::new();
        let mut history = UndoHistory::new(8 << 20);
        let sprite = lone_sprite();

        history.record_set_frame(&mut objects, sprite.clone(), 1).unwrap();
        history.do_undo(&mut objects).unwrap();
        assert!(history.can_redo());

        history.record_set_frame(&mut objects, sprite.clone(), 2).unwrap();
        assert!(!history.can_redo());
    }

    // S4/P4: budget eviction keeps only the newest group once the limit is exceeded.
    #[test]
    fn budget_evicts_oldest_groups() {
        let mut objects = ObjectsContainer::new();
        let mut history = UndoHistory::new(64);
        let sprite = lone_sprite();

        for frame in 0..5u16 {
            history.record_set_frame(&mut objects, sprite.clone(), frame).unwrap();
        }

        assert!(count_undo_groups(&history.undo) <= 1 || history.undo_mem_size() <= 64);
    }

    #[test]
    fn disabled_history_still_mutates_but_does_not_record() {
        let mut objects = ObjectsContainer::new();
        let mut history = UndoHistory::new(8 << 20);
        let sprite = lone_sprite();

        history.set_enabled(false);
        history.record_set_frame(&mut objects, sprite.clone(), 7).unwrap();
        assert_eq!(sprite.borrow().current_frame, 7);
        assert!(!history.can_undo());
    }
}
