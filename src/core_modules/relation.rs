// THEORY:
// The `relation` module is the heart of the engine. It captures how every selected
// cell's color relates to one base cell, and later rebuilds those cells around a new
// base color.
//
// Key architectural principles:
// 1.  **Snapshot, not view**: `extract_relation` reads the grid's colors and
//     selection exactly once. The resulting `ColorRelation` freezes the base's HSL
//     and the set of related cells; later edits to the grid's selection do not
//     change which cells the relation recolors. A relation is never edited. It is
//     replaced wholesale when the base or the selection changes.
// 2.  **Pure previews**: `build_preview` never mutates its input grid. It returns a
//     new grid where only cells carrying a delta get new red/green/blue values.
//     Alpha and selection flags are copied through, and unrelated cells are copied
//     verbatim. The editable grid therefore stays pristine until the caller
//     explicitly bakes a preview in.
// 3.  **Deterministic**: identical inputs always give pixel-identical output. There is
//     no hidden state and no randomness.
// 4.  **Frozen-anchor lock**: when saturation/lightness are locked, a requested base
//     color keeps only its hue; saturation and lightness always come from the same
//     anchor captured when the base pixel was chosen, so repeated edits cannot drift.

use crate::core_modules::color::{Hsl, HslDelta, Rgb, apply_relation, hsl_to_rgb, rgb_to_hsl};
use crate::core_modules::grid::PixelGrid;
use crate::core_modules::smart_pixel::smart_pixel::SmartPixel;
use crate::error::Result;

/// The HSL offsets of every selected cell from a base cell, captured at one moment.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRelation {
    base_index: usize,
    base_hsl: Hsl,
    deltas: Vec<Option<HslDelta>>,
}

impl ColorRelation {
    /// The grid cell that was the reference at extraction time.
    pub fn base_index(&self) -> usize {
        self.base_index
    }

    /// The base cell's HSL at extraction time.
    pub fn base_hsl(&self) -> Hsl {
        self.base_hsl
    }

    /// One entry per grid cell; `None` for cells that were not selected.
    pub fn deltas(&self) -> &[Option<HslDelta>] {
        &self.deltas
    }

    pub fn delta(&self, index: usize) -> Option<HslDelta> {
        self.deltas.get(index).copied().flatten()
    }

    /// Number of cells that carry a delta.
    pub fn related_count(&self) -> usize {
        self.deltas.iter().filter(|delta| delta.is_some()).count()
    }
}

/// Captures the offset of every currently selected cell from `base_index`.
///
/// The base does not have to be selected itself.
pub fn extract_relation(grid: &PixelGrid, base_index: usize) -> Result<ColorRelation> {
    let base = SmartPixel::new(*grid.pixel(base_index)?);

    let deltas = grid
        .pixels()
        .iter()
        .map(|pixel| {
            pixel
                .selected
                .then(|| SmartPixel::new(*pixel).relation_to(&base))
        })
        .collect();

    Ok(ColorRelation {
        base_index,
        base_hsl: base.hsl(),
        deltas,
    })
}

/// Rebuilds every related cell around `new_base`. Without a relation the grid is
/// returned as-is.
pub fn build_preview(grid: &PixelGrid, relation: Option<&ColorRelation>, new_base: Rgb) -> PixelGrid {
    let Some(relation) = relation else {
        return grid.clone();
    };

    let new_base_hsl = rgb_to_hsl(new_base);

    grid.map_pixels(|index, pixel| match relation.delta(index) {
        Some(delta) => pixel.recolored(hsl_to_rgb(apply_relation(new_base_hsl, delta))),
        None => *pixel,
    })
}

/// Keeps the hue of `requested` but takes saturation and lightness from `anchor`.
pub fn constrain_to_anchor(requested: Rgb, anchor: Hsl) -> Rgb {
    let requested = rgb_to_hsl(requested);
    hsl_to_rgb(Hsl::new(requested.hue, anchor.saturation, anchor.lightness))
}
