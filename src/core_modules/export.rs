// THEORY:
// The export compositor is the last stage of the engine. It turns a grid (the
// original or a baked preview) into a final RGBA bitmap. It does no relation math.
// It only decides, per output pixel, which source cell it shows and how that cell's
// alpha meets the background.
//
// Key architectural principles:
// 1.  **Nearest-neighbor only**: Every output pixel samples exactly one source cell.
//     With an integer scale each cell becomes a uniform `scale x scale` block, so
//     hard pixel-art edges survive the upscale.
// 2.  **Selection crops, background flattens**: With `only_selected`, unselected
//     cells are fully transparent whatever the background mode. With a flatten
//     background, every emitted cell is composited over the background and becomes
//     fully opaque. In transparent mode alpha passes through untouched.

use crate::core_modules::color::{Rgb, composite_over_background, hex_to_rgb};
use crate::core_modules::grid::{GridSize, PixelGrid};
use crate::error::{Error, Result};
use image::{Rgba, RgbaImage};

const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Largest exported edge in pixels; 8192x8192 RGBA is 256 MiB.
pub const MAX_OUTPUT_EDGE: u32 = 8192;

/// How cell alpha is treated in the exported bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportBackground {
    /// Keep every cell's alpha as-is.
    #[default]
    Transparent,
    /// Composite every emitted cell over this color and make it opaque.
    Flatten(Rgb),
}

/// Parameters for `export_bitmap`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    pub background: ExportBackground,
    pub only_selected: bool,
    /// Output edge = `round(grid edge * scale)`. Integer values give exact blocks.
    pub scale: f32,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            background: ExportBackground::Transparent,
            only_selected: false,
            scale: 1.0,
        }
    }
}

impl ExportOptions {
    pub fn transparent() -> Self {
        Self::default()
    }

    /// Flatten onto a background given as a hex color.
    pub fn flatten_on(hex: &str) -> Result<Self> {
        Ok(Self {
            background: ExportBackground::Flatten(hex_to_rgb(hex)?),
            ..Self::default()
        })
    }

    pub fn only_selected(mut self, only_selected: bool) -> Self {
        self.only_selected = only_selected;
        self
    }

    pub fn scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Output edge length in pixels for a grid of `edge` cells, at most `MAX_OUTPUT_EDGE`.
    pub fn output_edge(&self, edge: u32) -> Result<u32> {
        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(Error::InvalidScale(self.scale));
        }
        let output_edge = (edge as f64 * self.scale as f64).round().max(1.0);
        if output_edge > MAX_OUTPUT_EDGE as f64 {
            return Err(Error::InvalidScale(self.scale));
        }
        Ok(output_edge as u32)
    }
}

/// Rasterizes a grid into an RGBA bitmap.
pub fn export_bitmap(grid: &PixelGrid, options: &ExportOptions) -> Result<RgbaImage> {
    let edge = grid.edge();
    let output_edge = options.output_edge(edge)?;
    log::debug!(
        "exporting {edge}x{edge} grid to {output_edge}x{output_edge} (background: {:?}, only selected: {})",
        options.background,
        options.only_selected
    );

    // One output color per source cell; the scaling pass below only copies.
    let cells: Vec<Rgba<u8>> = grid
        .pixels()
        .iter()
        .map(|pixel| {
            if options.only_selected && !pixel.selected {
                return TRANSPARENT;
            }
            match options.background {
                ExportBackground::Transparent => Rgba([pixel.red, pixel.green, pixel.blue, pixel.alpha]),
                ExportBackground::Flatten(background) => {
                    let mixed = composite_over_background(pixel, background);
                    Rgba([mixed.red, mixed.green, mixed.blue, u8::MAX])
                }
            }
        })
        .collect();

    // Uncovered canvas is background in a full flattened export, transparent otherwise.
    let canvas = match options.background {
        ExportBackground::Flatten(bg) if !options.only_selected => Rgba([bg.red, bg.green, bg.blue, u8::MAX]),
        _ => TRANSPARENT,
    };
    let mut bitmap = RgbaImage::from_pixel(output_edge, output_edge, canvas);

    let source_of = |out: u32| ((out as u64 * edge as u64) / output_edge as u64) as u32;
    for (x, y, out) in bitmap.enumerate_pixels_mut() {
        let (cell_x, cell_y) = (source_of(x), source_of(y));
        if cell_x < edge && cell_y < edge {
            *out = cells[(cell_y * edge + cell_x) as usize];
        }
    }

    Ok(bitmap)
}

/// The default download name, e.g. `pixel-16x16.png` or `pixel-16x16-selection.png`.
pub fn suggested_filename(size: GridSize, only_selected: bool) -> String {
    let edge = size.edge();
    if only_selected {
        format!("pixel-{edge}x{edge}-selection.png")
    } else {
        format!("pixel-{edge}x{edge}.png")
    }
}
