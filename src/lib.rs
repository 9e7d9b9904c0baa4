// THEORY:
// This file is the main entry point for the `pixel_relation` library crate. It
// exposes the `Session` state machine and the handful of data types a host needs
// (grids, colors, relations, export options) as one clean API surface.
//
// The engine recolors a selection of a pixel-art grid around a base pixel: every
// selected cell remembers its hue/saturation/lightness offset from the base, and
// picking a new base color rebuilds the whole selection with those offsets intact.
// Decoding images, pointer input and on-screen rendering stay with the host; the
// crate only needs a `PixelGrid` in and hands a `PixelGrid` or bitmap back.

pub mod core_modules;
pub mod error;
pub mod session;

pub use crate::core_modules::color::{
    Hsl, HslDelta, Rgb, apply_relation, composite_over_background, hex_to_rgb, hsl_to_rgb,
    rgb_to_hex, rgb_to_hsl, shortest_hue_delta,
};
pub use crate::core_modules::export::{ExportBackground, ExportOptions, export_bitmap, suggested_filename};
pub use crate::core_modules::grid::{GridSize, PixelGrid, Point};
pub use crate::core_modules::pixel::pixel::Pixel;
pub use crate::core_modules::relation::{ColorRelation, build_preview, constrain_to_anchor, extract_relation};
pub use crate::core_modules::utils::image_helper::image_helper::{encode_png, save as save_png};
pub use crate::error::{Error, Result};
pub use crate::session::{ExportConfig, Session, SessionConfig, SessionState};
