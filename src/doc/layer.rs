use crate::object::{CelHandle, LayerHandle, ObjectId};

/// A layer is a tagged sum of an image layer (owns cels) and a folder (owns
/// child layers) — §6.1, §9 ("model as a tagged sum ... do not rely on
/// virtual dispatch").
#[derive(Clone, Debug)]
pub enum LayerKind {
    Image { cels: Vec<CelHandle> },
    Folder { children: Vec<LayerHandle> },
}

#[derive(Clone, Debug)]
pub struct Layer {
    pub name: String,
    pub flags: u8,
    pub sprite_id: ObjectId,
    pub parent: Option<ObjectId>,
    pub prev_sibling: Option<ObjectId>,
    pub kind: LayerKind,
}

impl Layer {
    pub fn new_image(name: impl Into<String>, sprite_id: ObjectId) -> Self {
        Self {
            name: name.into(),
            flags: 0,
            sprite_id,
            parent: None,
            prev_sibling: None,
            kind: LayerKind::Image { cels: Vec::new() },
        }
    }

    pub fn new_folder(name: impl Into<String>, sprite_id: ObjectId) -> Self {
        Self {
            name: name.into(),
            flags: 0,
            sprite_id,
            parent: None,
            prev_sibling: None,
            kind: LayerKind::Folder { children: Vec::new() },
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self.kind, LayerKind::Folder { .. })
    }

    pub fn cels(&self) -> &[CelHandle] {
        match &self.kind {
            LayerKind::Image { cels } => cels,
            LayerKind::Folder { .. } => &[],
        }
    }

    pub fn cels_mut(&mut self) -> Option<&mut Vec<CelHandle>> {
        match &mut self.kind {
            LayerKind::Image { cels } => Some(cels),
            LayerKind::Folder { .. } => None,
        }
    }

    pub fn children(&self) -> &[LayerHandle] {
        match &self.kind {
            LayerKind::Folder { children } => children,
            LayerKind::Image { .. } => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<LayerHandle>> {
        match &mut self.kind {
            LayerKind::Folder { children } => Some(children),
            LayerKind::Image { .. } => None,
        }
    }
}
