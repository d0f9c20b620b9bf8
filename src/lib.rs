#![deny(warnings)]
#![allow(dead_code)]

#[macro_use]
extern crate log as log_crate;

mod chunk;
pub mod config;
mod doc;
mod error;
mod history;
mod io;
mod object;
mod stream;

pub use self::{
    chunk::{kinds, ChunkKind, UndoChunk},
    config::UndoConfig,
    doc::{Cel, Document, FlipAxis, Image, ImgType, Layer, LayerKind, Mask, Palette, Sprite, Stock},
    error::{UndoError, UndoResult},
    history::UndoHistory,
    object::{
        CelHandle, DocumentHandle, ImageHandle, LayerHandle, MaskHandle, ObjectId, ObjectsContainer,
        PaletteHandle, SpriteHandle, StockHandle,
    },
    stream::{count_undo_groups, UndoStream},
};

/// Things used in almost every call site that drives the engine.
pub mod prelude {
    pub use super::{
        chunk::kinds, ChunkKind, Document, ImgType, ObjectId, ObjectsContainer, Sprite, UndoChunk,
        UndoError, UndoHistory, UndoResult, UndoStream,
    };
}

/// Test-only helpers. `pretty_env_logger` is a dev-dependency: unlike the
/// hosting editor, this crate has no production entry point that wants
/// eager logger init, so it only exists here for tests that want to see
/// `log` output.
#[cfg(test)]
pub mod test_support {
    pub fn init_logging() {
        let _ = pretty_env_logger::try_init();
    }
}
