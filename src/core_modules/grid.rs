// THEORY:
// The `PixelGrid` is the single source of truth for a recoloring session: the
// original colors of every cell and which cells are selected. It is a square,
// row-major array (`index = y * size + x`) whose length is fixed at `size * size`
// for its whole life.
//
// Key architectural principles:
// 1.  **Fixed Geometry**: Only a small set of edge lengths is supported
//     (`GridSize`). The pixel vector is allocated once at construction and never
//     grows or shrinks; changing the size means building a new grid.
// 2.  **Two Kinds of Mutation**: Selection edits flip `selected` flags in place and
//     never touch a channel. Color transforms never mutate in place at all: they go
//     through `map_pixels`, which builds the complete new pixel vector first and only
//     then wraps it in a new grid, so a reader never sees a half-recolored grid.
// 3.  **Ingestion Bridge**: `from_rgba_buffer` and `from_image` turn raw RGBA bytes or
//     a decoded image into a grid with every cell unselected. Beyond that the grid
//     knows nothing about where its colors came from.

use crate::core_modules::pixel::pixel::{CHANNELS, Pixel};
use crate::error::{Error, Result};
use image::DynamicImage;
use image::imageops::{self, FilterType};
use serde::{Deserialize, Serialize};

/// Supported square grid dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum GridSize {
    #[default]
    Sixteen,
    ThirtyTwo,
}

impl GridSize {
    /// The edge length in cells.
    pub const fn edge(self) -> u32 {
        match self {
            GridSize::Sixteen => 16,
            GridSize::ThirtyTwo => 32,
        }
    }

    /// The number of cells in a grid of this size.
    pub const fn cell_count(self) -> usize {
        (self.edge() * self.edge()) as usize
    }
}

impl TryFrom<u32> for GridSize {
    type Error = Error;

    fn try_from(edge: u32) -> Result<Self> {
        match edge {
            16 => Ok(GridSize::Sixteen),
            32 => Ok(GridSize::ThirtyTwo),
            other => Err(Error::UnsupportedGridSize(other)),
        }
    }
}

impl From<GridSize> for u32 {
    fn from(size: GridSize) -> Self {
        size.edge()
    }
}

/// A cell coordinate; `x` is the column, `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// A square, row-major grid of RGBA cells with per-cell selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    size: GridSize,
    pixels: Vec<Pixel>,
}

impl PixelGrid {
    /// A grid where every cell is `fill`.
    pub fn filled(size: GridSize, fill: Pixel) -> Self {
        Self {
            size,
            pixels: vec![fill; size.cell_count()],
        }
    }

    /// Wraps an existing pixel list. The list must hold exactly `size * size` cells.
    pub fn from_pixels(size: GridSize, pixels: Vec<Pixel>) -> Result<Self> {
        if pixels.len() != size.cell_count() {
            return Err(Error::BufferLength {
                expected: size.cell_count(),
                actual: pixels.len(),
            });
        }
        Ok(Self { size, pixels })
    }

    /// Ingests a row-major RGBA byte buffer. Every cell starts unselected.
    pub fn from_rgba_buffer(size: GridSize, buffer: &[u8]) -> Result<Self> {
        let expected = size.cell_count() * CHANNELS;
        if buffer.len() != expected {
            return Err(Error::BufferLength {
                expected,
                actual: buffer.len(),
            });
        }

        let pixels = buffer
            .chunks_exact(CHANNELS)
            .map(|bytes| {
                Pixel::try_from(bytes).map_err(|actual| Error::BufferLength {
                    expected: CHANNELS,
                    actual,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { size, pixels })
    }

    /// Resamples a decoded image down (or up) to `size x size` and ingests it.
    pub fn from_image(image: &DynamicImage, size: GridSize) -> Result<Self> {
        let edge = size.edge();
        let resized = imageops::resize(&image.to_rgba8(), edge, edge, FilterType::Triangle);
        log::debug!(
            "rasterized {}x{} image into a {edge}x{edge} grid",
            image.width(),
            image.height()
        );
        Self::from_rgba_buffer(size, resized.as_raw())
    }

    /// The flat RGBA byte view of the grid, selection dropped.
    pub fn to_rgba_buffer(&self) -> Vec<u8> {
        self.pixels
            .iter()
            .flat_map(|pixel| <[u8; CHANNELS]>::from(*pixel))
            .collect()
    }

    pub fn size(&self) -> GridSize {
        self.size
    }

    /// Edge length in cells.
    pub fn edge(&self) -> u32 {
        self.size.edge()
    }

    pub fn len(&self) -> usize {
        self.pixels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixels(&self) -> &[Pixel] {
        &self.pixels
    }

    pub fn pixel(&self, index: usize) -> Result<&Pixel> {
        self.check_index(index)?;
        Ok(&self.pixels[index])
    }

    pub fn check_index(&self, index: usize) -> Result<()> {
        if index < self.pixels.len() {
            Ok(())
        } else {
            Err(Error::InvalidIndex {
                index,
                len: self.pixels.len(),
            })
        }
    }

    pub fn index_of(&self, point: Point) -> Option<usize> {
        let edge = self.edge();
        (point.x < edge && point.y < edge).then(|| (point.y * edge + point.x) as usize)
    }

    pub fn point_of(&self, index: usize) -> Option<Point> {
        let edge = self.edge() as usize;
        (index < self.pixels.len()).then(|| Point::new((index % edge) as u32, (index / edge) as u32))
    }

    /// Builds a new grid of the same size from a per-cell transform. The whole pixel
    /// vector is computed before the new grid exists.
    pub fn map_pixels<F>(&self, mut transform: F) -> PixelGrid
    where
        F: FnMut(usize, &Pixel) -> Pixel,
    {
        let pixels = self
            .pixels
            .iter()
            .enumerate()
            .map(|(index, pixel)| transform(index, pixel))
            .collect();
        PixelGrid {
            size: self.size,
            pixels,
        }
    }

    pub fn is_selected(&self, index: usize) -> Result<bool> {
        Ok(self.pixel(index)?.selected)
    }

    pub fn set_selected(&mut self, index: usize, selected: bool) -> Result<()> {
        self.check_index(index)?;
        self.pixels[index].selected = selected;
        Ok(())
    }

    /// Flips one cell and returns its new state.
    pub fn toggle(&mut self, index: usize) -> Result<bool> {
        self.check_index(index)?;
        let pixel = &mut self.pixels[index];
        pixel.selected = !pixel.selected;
        Ok(pixel.selected)
    }

    /// Drag painting: forces a cell to the stroke's target state. Returns whether the
    /// cell actually changed.
    pub fn paint(&mut self, index: usize, target: bool) -> Result<bool> {
        self.check_index(index)?;
        let pixel = &mut self.pixels[index];
        if pixel.selected == target {
            return Ok(false);
        }
        pixel.selected = target;
        Ok(true)
    }

    /// Sets every cell in the inclusive rectangle spanned by two corners. Corners may
    /// come in any order; anything outside the grid is ignored.
    pub fn select_rect(&mut self, start: Point, end: Point, target: bool) {
        let edge = self.edge();
        let min_x = start.x.min(end.x);
        let max_x = start.x.max(end.x).min(edge.saturating_sub(1));
        let min_y = start.y.min(end.y);
        let max_y = start.y.max(end.y).min(edge.saturating_sub(1));

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let index = (y * edge + x) as usize;
                self.pixels[index].selected = target;
            }
        }
    }

    pub fn select_all(&mut self) {
        self.pixels.iter_mut().for_each(|pixel| pixel.selected = true);
    }

    pub fn clear_selection(&mut self) {
        self.pixels.iter_mut().for_each(|pixel| pixel.selected = false);
    }

    pub fn selected_count(&self) -> usize {
        self.pixels.iter().filter(|pixel| pixel.selected).count()
    }

    /// The lowest selected index, the default base pixel on confirm.
    pub fn first_selected(&self) -> Option<usize> {
        self.pixels.iter().position(|pixel| pixel.selected)
    }

    pub fn selected_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.pixels
            .iter()
            .enumerate()
            .filter_map(|(index, pixel)| pixel.selected.then_some(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn gradient_grid() -> PixelGrid {
        let pixels = (0..GridSize::Sixteen.cell_count())
            .map(|i| Pixel::new(i as u8, (255 - i) as u8, 7, 255))
            .collect();
        PixelGrid::from_pixels(GridSize::Sixteen, pixels).unwrap()
    }

    #[test]
    fn grid_size_accepts_only_supported_edges() {
        assert_eq!(GridSize::try_from(16).unwrap(), GridSize::Sixteen);
        assert_eq!(GridSize::try_from(32).unwrap(), GridSize::ThirtyTwo);
        assert!(matches!(GridSize::try_from(24), Err(Error::UnsupportedGridSize(24))));
        assert_eq!(GridSize::ThirtyTwo.cell_count(), 1024);
    }

    #[test]
    fn from_pixels_enforces_length() {
        let result = PixelGrid::from_pixels(GridSize::Sixteen, vec![Pixel::default(); 10]);
        assert!(matches!(
            result,
            Err(Error::BufferLength {
                expected: 256,
                actual: 10
            })
        ));
    }

    #[test]
    fn rgba_buffer_round_trips_and_starts_unselected() {
        let grid = gradient_grid();
        let bytes = grid.to_rgba_buffer();
        assert_eq!(bytes.len(), 256 * 4);

        let rebuilt = PixelGrid::from_rgba_buffer(GridSize::Sixteen, &bytes).unwrap();
        assert_eq!(rebuilt, grid);
        assert_eq!(rebuilt.selected_count(), 0);

        assert!(PixelGrid::from_rgba_buffer(GridSize::Sixteen, &bytes[..12]).is_err());
    }

    #[test]
    fn rgba_buffer_keeps_channel_order() {
        let mut bytes = vec![0u8; 256 * 4];
        bytes[..8].copy_from_slice(&[10, 20, 30, 40, 50, 60, 70, 80]);
        let grid = PixelGrid::from_rgba_buffer(GridSize::Sixteen, &bytes).unwrap();
        assert_eq!(grid.pixels()[0], Pixel::new(10, 20, 30, 40));
        assert_eq!(grid.pixels()[1], Pixel::new(50, 60, 70, 80));
        assert!(matches!(
            PixelGrid::from_rgba_buffer(GridSize::Sixteen, &bytes[..1023]),
            Err(Error::BufferLength { expected: 1024, actual: 1023 })
        ));
    }

    #[test]
    fn from_image_resamples_to_grid_size() {
        let source = image::RgbaImage::from_pixel(64, 48, image::Rgba([10, 20, 30, 255]));
        let grid = PixelGrid::from_image(&DynamicImage::ImageRgba8(source), GridSize::ThirtyTwo).unwrap();
        assert_eq!(grid.len(), 1024);
        let near = |a: u8, b: u8| a.abs_diff(b) <= 1;
        assert!(grid.pixels().iter().all(|p| {
            near(p.red, 10) && near(p.green, 20) && near(p.blue, 30) && near(p.alpha, 255) && !p.selected
        }));
    }

    #[test]
    fn index_and_point_are_row_major() {
        let grid = gradient_grid();
        assert_eq!(grid.index_of(Point::new(3, 2)), Some(35));
        assert_eq!(grid.point_of(35), Some(Point::new(3, 2)));
        assert_eq!(grid.index_of(Point::new(16, 0)), None);
        assert_eq!(grid.point_of(256), None);
    }

    #[test]
    fn selection_edits_never_touch_colors() {
        let mut grid = gradient_grid();
        let colors: Vec<_> = grid.pixels().iter().map(|p| (p.rgb(), p.alpha)).collect();

        assert!(grid.toggle(5).unwrap());
        assert!(grid.paint(6, true).unwrap());
        assert!(!grid.paint(6, true).unwrap());
        grid.select_rect(Point::new(10, 10), Point::new(8, 9), true);
        grid.set_selected(0, true).unwrap();

        let after: Vec<_> = grid.pixels().iter().map(|p| (p.rgb(), p.alpha)).collect();
        assert_eq!(after, colors);
        assert_eq!(grid.selected_count(), 2 + 6 + 1);
        assert_eq!(grid.first_selected(), Some(0));
    }

    #[test]
    fn rect_selection_is_inclusive_and_clipped() {
        let mut grid = gradient_grid();
        grid.select_rect(Point::new(14, 14), Point::new(40, 40), true);
        let selected: Vec<_> = grid.selected_indices().collect();
        assert_eq!(selected, vec![14 * 16 + 14, 14 * 16 + 15, 15 * 16 + 14, 15 * 16 + 15]);

        grid.select_rect(Point::new(15, 15), Point::new(15, 15), false);
        assert_eq!(grid.selected_count(), 3);
    }

    #[test]
    fn select_all_and_clear() {
        let mut grid = gradient_grid();
        grid.select_all();
        assert_eq!(grid.selected_count(), 256);
        grid.clear_selection();
        assert_eq!(grid.first_selected(), None);
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        let mut grid = gradient_grid();
        assert!(matches!(
            grid.toggle(256),
            Err(Error::InvalidIndex { index: 256, len: 256 })
        ));
        assert!(grid.set_selected(999, true).is_err());
        assert!(grid.pixel(1000).is_err());
    }

    #[test]
    fn map_pixels_returns_a_new_grid() {
        let grid = gradient_grid();
        let inverted = grid.map_pixels(|_, p| Pixel::new(255 - p.red, p.green, p.blue, p.alpha));
        assert_eq!(grid.pixels()[0].red, 0);
        assert_eq!(inverted.pixels()[0].red, 255);
        assert_eq!(inverted.size(), grid.size());
    }
}
