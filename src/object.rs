//! `ObjectId` and the `ObjectsContainer` slot map (§3, §6.1, §9).
//!
//! Chunks never hold a live reference to a document object directly; they
//! hold an [`ObjectId`] and resolve it back through an `ObjectsContainer` at
//! inversion time. This is the Rust replacement for the raw-pointer
//! round-tripping the original engine did through its own container type.

use {
    crate::doc::{Cel, Document, Image, Layer, Mask, Palette, Sprite, Stock},
    std::{
        any::{Any, TypeId},
        cell::RefCell,
        collections::HashMap,
        rc::Rc,
    },
};

/// A stable numeric handle to a live document object. Zero denotes "no
/// object"; non-zero ids are allocated by an [`ObjectsContainer`] and remain
/// stable for its lifetime (§3).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ObjectId(pub u32);

impl ObjectId {
    /// The "no object" sentinel.
    pub const NONE: ObjectId = ObjectId(0);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

pub type ImageHandle = Rc<RefCell<Image>>;
pub type StockHandle = Rc<RefCell<Stock>>;
pub type LayerHandle = Rc<RefCell<Layer>>;
pub type CelHandle = Rc<RefCell<Cel>>;
pub type PaletteHandle = Rc<RefCell<Palette>>;
pub type MaskHandle = Rc<RefCell<Mask>>;
pub type SpriteHandle = Rc<RefCell<Sprite>>;
pub type DocumentHandle = Rc<RefCell<Document>>;

/// A type-erased slot in the container. One variant per concrete document
/// type the engine's chunk kinds reference.
#[derive(Clone)]
enum Object {
    Image(ImageHandle),
    Stock(StockHandle),
    Layer(LayerHandle),
    Cel(CelHandle),
    Palette(PaletteHandle),
    Mask(MaskHandle),
    Sprite(SpriteHandle),
    Document(DocumentHandle),
}

/// Implemented for every concrete document type that can live in an
/// [`ObjectsContainer`]. Lets `add`/`get`/`insert` stay generic over `T`
/// instead of the container exposing eight near-identical method families.
pub trait Stored: Any + Sized {
    fn wrap(handle: Rc<RefCell<Self>>) -> Object;
    fn unwrap(object: &Object) -> Option<Rc<RefCell<Self>>>;
}

impl Stored for Image {
    fn wrap(handle: Rc<RefCell<Self>>) -> Object {
        Object::Image(handle)
    }

    fn unwrap(object: &Object) -> Option<Rc<RefCell<Self>>> {
        match object {
            Object::Image(handle) => Some(Rc::clone(handle)),
            _ => None,
        }
    }
}

impl Stored for Stock {
    fn wrap(handle: Rc<RefCell<Self>>) -> Object {
        Object::Stock(handle)
    }

    fn unwrap(object: &Object) -> Option<Rc<RefCell<Self>>> {
        match object {
            Object::Stock(handle) => Some(Rc::clone(handle)),
            _ => None,
        }
    }
}

impl Stored for Layer {
    fn wrap(handle: Rc<RefCell<Self>>) -> Object {
        Object::Layer(handle)
    }

    fn unwrap(object: &Object) -> Option<Rc<RefCell<Self>>> {
        match object {
            Object::Layer(handle) => Some(Rc::clone(handle)),
            _ => None,
        }
    }
}

impl Stored for Cel {
    fn wrap(handle: Rc<RefCell<Self>>) -> Object {
        Object::Cel(handle)
    }

    fn unwrap(object: &Object) -> Option<Rc<RefCell<Self>>> {
        match object {
            Object::Cel(handle) => Some(Rc::clone(handle)),
            _ => None,
        }
    }
}

impl Stored for Palette {
    fn wrap(handle: Rc<RefCell<Self>>) -> Object {
        Object::Palette(handle)
    }

    fn unwrap(object: &Object) -> Option<Rc<RefCell<Self>>> {
        match object {
            Object::Palette(handle) => Some(Rc::clone(handle)),
            _ => None,
        }
    }
}

impl Stored for Mask {
    fn wrap(handle: Rc<RefCell<Self>>) -> Object {
        Object::Mask(handle)
    }

    fn unwrap(object: &Object) -> Option<Rc<RefCell<Self>>> {
        match object {
            Object::Mask(handle) => Some(Rc::clone(handle)),
            _ => None,
        }
    }
}

impl Stored for Sprite {
    fn wrap(handle: Rc<RefCell<Self>>) -> Object {
        Object::Sprite(handle)
    }

    fn unwrap(object: &Object) -> Option<Rc<RefCell<Self>>> {
        match object {
            Object::Sprite(handle) => Some(Rc::clone(handle)),
            _ => None,
        }
    }
}

impl Stored for Document {
    fn wrap(handle: Rc<RefCell<Self>>) -> Object {
        Object::Document(handle)
    }

    fn unwrap(object: &Object) -> Option<Rc<RefCell<Self>>> {
        match object {
            Object::Document(handle) => Some(Rc::clone(handle)),
            _ => None,
        }
    }
}

/// Bidirectional map between opaque document handles and stable
/// [`ObjectId`]s (§3, §6.1).
#[derive(Default)]
pub struct ObjectsContainer {
    objects: HashMap<ObjectId, Object>,
    dedup: HashMap<(TypeId, usize), ObjectId>,
    dedup_key_of: HashMap<ObjectId, (TypeId, usize)>,
    next_id: u32,
}

impl ObjectsContainer {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc_id(&mut self) -> ObjectId {
        self.next_id += 1;
        ObjectId(self.next_id)
    }

    /// Registers `handle`, returning its existing id if it was already
    /// registered (identity, not value, equality).
    pub fn add<T: Stored>(&mut self, handle: Rc<RefCell<T>>) -> ObjectId {
        let key = (TypeId::of::<T>(), Rc::as_ptr(&handle) as *const () as usize);
        if let Some(&id) = self.dedup.get(&key) {
            return id;
        }

        let id = self.alloc_id();
        self.objects.insert(id, T::wrap(handle));
        self.dedup.insert(key, id);
        self.dedup_key_of.insert(id, key);
        id
    }

    /// Typed lookup. Returns `None` if `id` is unregistered, was removed, or
    /// does not hold a `T`.
    pub fn get<T: Stored>(&self, id: ObjectId) -> Option<Rc<RefCell<T>>> {
        if id.is_none() {
            return None;
        }
        self.objects.get(&id).and_then(T::unwrap)
    }

    /// Re-associates a previously-allocated `id` with a freshly constructed
    /// object (used when an inverter recreates a removed object and wants
    /// the id any still-pending chunks refer to it by to keep working).
    pub fn insert<T: Stored>(&mut self, id: ObjectId, handle: Rc<RefCell<T>>) {
        if self.next_id < id.0 {
            self.next_id = id.0;
        }

        if let Some(old_key) = self.dedup_key_of.remove(&id) {
            self.dedup.remove(&old_key);
        }

        let key = (TypeId::of::<T>(), Rc::as_ptr(&handle) as *const () as usize);
        self.objects.insert(id, T::wrap(handle));
        self.dedup.insert(key, id);
        self.dedup_key_of.insert(id, key);
    }

    /// Drops the association for `id`. The numeric id itself is not reused
    /// implicitly; a later [`insert`](Self::insert) may reattach it.
    pub fn remove(&mut self, id: ObjectId) {
        self.objects.remove(&id);
        if let Some(key) = self.dedup_key_of.remove(&id) {
            self.dedup.remove(&key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc::ImgType;

    #[test]
    fn add_is_idempotent_by_identity() {
        let mut objects = ObjectsContainer::new();
        let image = Rc::new(RefCell::new(Image::new(ImgType::Rgb, 4, 4, 0)));

        let a = objects.add(Rc::clone(&image));
        let b = objects.add(Rc::clone(&image));
        assert_eq!(a, b);
        assert!(!a.is_none());
    }

    #[test]
    fn different_objects_get_different_ids() {
        let mut objects = ObjectsContainer::new();
        let a = objects.add(Rc::new(RefCell::new(Image::new(ImgType::Rgb, 1, 1, 0))));
        let b = objects.add(Rc::new(RefCell::new(Image::new(ImgType::Rgb, 1, 1, 0))));
        assert_ne!(a, b);
    }

    #[test]
    fn remove_then_get_returns_none() {
        let mut objects = ObjectsContainer::new();
        let id = objects.add(Rc::new(RefCell::new(Image::new(ImgType::Rgb, 1, 1, 0))));
        objects.remove(id);
        assert!(objects.get::<Image>(id).is_none());
    }

    #[test]
    fn insert_reattaches_a_known_id() {
        let mut objects = ObjectsContainer::new();
        let id = objects.add(Rc::new(RefCell::new(Image::new(ImgType::Rgb, 1, 1, 0))));
        objects.remove(id);

        let recreated = Rc::new(RefCell::new(Image::new(ImgType::Rgb, 2, 2, 0)));
        objects.insert(id, Rc::clone(&recreated));

        let got = objects.get::<Image>(id).expect("reattached");
        assert_eq!(got.borrow().width(), 2);
    }

    #[test]
    fn wrong_type_lookup_misses() {
        let mut objects = ObjectsContainer::new();
        let id = objects.add(Rc::new(RefCell::new(Image::new(ImgType::Rgb, 1, 1, 0))));
        assert!(objects.get::<Stock>(id).is_none());
    }
}
