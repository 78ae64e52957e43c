//! minipack code generator
//!
//! Renders a chunk into a self-executing runtime bundle and derives output
//! filenames from the configured `[name]` pattern. Nothing here touches the
//! file system; the driver decides where the text goes.

mod error;
mod filename;
mod runtime;

pub use error::CodegenError;
pub use filename::{asset_filename, assign_filenames, NAME_PLACEHOLDER};
pub use runtime::{render_chunk, ChunkSource, RuntimeModule, RuntimeWriter};
