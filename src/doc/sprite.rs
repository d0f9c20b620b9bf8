use {
    crate::{
        doc::{ImgType, LayerKind},
        object::{LayerHandle, MaskHandle, ObjectId, PaletteHandle, StockHandle},
    },
    std::collections::HashMap,
};

/// The animation/raster document proper: frames, durations, palettes,
/// layer tree root, and the stock of images the layers' cels reference
/// (§6.1).
#[derive(Clone)]
pub struct Sprite {
    pub current_frame: u16,
    pub current_layer: ObjectId,
    pub frame_count: u16,
    pub frame_durations: Vec<u16>,
    pub palettes: HashMap<u16, PaletteHandle>,
    pub width: u16,
    pub height: u16,
    pub imgtype: ImgType,
    pub stock: StockHandle,
    pub root: LayerHandle,
}

impl Sprite {
    pub fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    pub fn set_size(&mut self, width: u16, height: u16) -> (u16, u16) {
        let previous = self.size();
        self.width = width;
        self.height = height;
        previous
    }

    pub fn frame_duration(&self, frame: u16) -> u16 {
        self.frame_durations
            .get(frame as usize)
            .copied()
            .unwrap_or(100)
    }

    pub fn set_frame_duration(&mut self, frame: u16, duration: u16) -> u16 {
        if self.frame_durations.len() <= frame as usize {
            self.frame_durations.resize(frame as usize + 1, 100);
        }
        let previous = self.frame_durations[frame as usize];
        self.frame_durations[frame as usize] = duration;
        previous
    }

    /// Remaps every indexed pixel `p` in frames `[from, to]` to
    /// `mapping[p]` and reorders every palette in that frame range to
    /// match (§4.2 REMAP_PALETTE algorithm).
    pub fn remap_images(&self, from: u16, to: u16, mapping: &[u8; 256]) {
        fn visit(layer: &LayerHandle, from: u16, to: u16, mapping: &[u8; 256]) {
            let layer = layer.borrow();
            match &layer.kind {
                LayerKind::Image { cels } => {
                    for cel in cels {
                        let cel = cel.borrow();
                        if cel.frame < from || cel.frame > to {
                            continue;
                        }
                        let mut image = cel.image.borrow_mut();
                        if image.imgtype() != ImgType::Indexed {
                            continue;
                        }
                        for pixel in image.pixels_mut().iter_mut() {
                            *pixel = mapping[*pixel as usize];
                        }
                    }
                }
                LayerKind::Folder { children } => {
                    for child in children {
                        visit(child, from, to, mapping);
                    }
                }
            }
        }

        visit(&self.root, from, to, mapping);

        for frame in from..=to {
            if let Some(palette) = self.palettes.get(&frame) {
                let mut palette = palette.borrow_mut();
                let old = palette.colors().to_vec();
                let mut remapped = old.clone();
                for (index, &color) in old.iter().enumerate() {
                    if index < mapping.len() {
                        let dest = mapping[index] as usize;
                        if dest < remapped.len() {
                            remapped[dest] = color;
                        }
                    }
                }
                palette.set_colors(remapped);
            }
        }
    }
}

/// The document, owning a sprite and (optionally) a selection mask (§6.1).
#[derive(Clone)]
pub struct Document {
    pub sprite: crate::object::SpriteHandle,
    pub mask: Option<MaskHandle>,
}
