//! dermassist CLI library
//!
//! The pieces of the terminal front-end that do not need a terminal: flag
//! handling, path parsing for drag-and-drop, state rendering and the
//! interruptible runtime.

pub mod drop_zone;
pub mod interrupt;
pub mod render;
pub mod settings;

pub use drop_zone::parse_dropped_path;
pub use render::{render_state, DISCLAIMER};
pub use settings::{preview_store, GlobalArgs};
