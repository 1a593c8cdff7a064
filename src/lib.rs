//! Edit engine for annotating climbing topo photos.
//!
//! Users mark up a route image with stamps (anchors, pitons, rappel and belay
//! stations), dashed and curved lines, and free text. This crate owns the
//! document of those items, every edit made to it, undo and redo, the
//! interaction modes that turn pointer and key input into edits, and the
//! rendering that paints it all onto a 2D canvas. It compiles to WebAssembly;
//! the host page only wires DOM events to [`web::TopoEditor`] and reacts to
//! the [`engine::Effect`]s it reports.
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | The [`engine::Editor`] session and its effects |
//! | [`mode`] | Tools and the interaction state machine |
//! | [`doc`] | Item store, selection, line preview and zoom |
//! | [`item`] | Stamp, line and text items and their sparse params |
//! | [`action`] | Reversible edit actions |
//! | [`history`] | Undo/redo stacks and batching |
//! | [`snapshot`] | Saved-document parsing and serialization |
//! | [`config`] | Host options and default item properties |
//! | [`camera`] | Points, pan offset and coordinate conversions |
//! | [`geom`] | Curves, tessellation and hit-test geometry |
//! | [`dash`] | Dash-pattern stroking across path segments |
//! | [`render`] | Painting onto a [`render::Surface`] and redraw planning |
//! | [`web`] | `wasm-bindgen` binding over a browser canvas |
//! | [`consts`] | Shared numeric constants |

pub mod action;
pub mod camera;
pub mod config;
pub mod consts;
pub mod dash;
pub mod doc;
pub mod engine;
pub mod geom;
pub mod history;
pub mod item;
pub mod mode;
pub mod render;
pub mod snapshot;
pub mod web;
