// THEORY:
// The `session` module is the top-level API of the engine. It owns the editable grid
// and drives it through an explicit two-state machine instead of recomputing
// everything whenever some input changes.
//
//   Editing   --confirm-->  Confirmed   (selection frozen, relation + base captured)
//   Confirmed --setBase-->  Confirmed   (relation re-extracted around another cell)
//   Confirmed --modify-->   Editing     (relation and base discarded)
//   Confirmed --apply-->    Editing     (preview baked into the grid, then discarded)
//
// Every transition checks its precondition first and either succeeds completely or
// returns an error with the session untouched. Selection edits are only accepted
// while `Editing`; base-color edits only while `Confirmed`.

use crate::core_modules::color::{Hsl, Rgb, hex_to_rgb, rgb_to_hex};
use crate::core_modules::export::{ExportOptions, export_bitmap};
use crate::core_modules::grid::{GridSize, PixelGrid};
use crate::core_modules::relation::{ColorRelation, build_preview, constrain_to_anchor, extract_relation};
use crate::error::{Error, Result};
use image::RgbaImage;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_BACKGROUND: &str = "#020617";

/// Export defaults carried by a `SessionConfig`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub scale: f32,
    pub only_selected: bool,
    /// Flatten onto the session background instead of keeping transparency.
    pub flatten: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            scale: 1.0,
            only_selected: false,
            flatten: false,
        }
    }
}

/// Tunable defaults for an editing session, loadable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub grid_size: GridSize,
    /// Background hex used when flattening exports.
    pub background: String,
    /// Initial state of the saturation/lightness lock.
    pub keep_lightness: bool,
    pub export: ExportConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            grid_size: GridSize::Sixteen,
            background: DEFAULT_BACKGROUND.to_string(),
            keep_lightness: false,
            export: ExportConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        // Reject a bad background up front rather than at export time.
        hex_to_rgb(&config.background)?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// The export options these defaults describe.
    pub fn export_options(&self) -> Result<ExportOptions> {
        let options = if self.export.flatten {
            ExportOptions::flatten_on(&self.background)?
        } else {
            ExportOptions::transparent()
        };
        Ok(options
            .only_selected(self.export.only_selected)
            .scale(self.export.scale))
    }
}

/// Everything that only exists while a selection is confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct Confirmation {
    relation: ColorRelation,
    /// The working base color the preview is built around.
    base_color: Rgb,
    /// The base pixel's HSL when it was chosen; the lock always reads from here.
    anchor: Hsl,
}

impl Confirmation {
    fn around(grid: &PixelGrid, base_index: usize) -> Result<Self> {
        let relation = extract_relation(grid, base_index)?;
        Ok(Self {
            base_color: grid.pixel(base_index)?.rgb(),
            anchor: relation.base_hsl(),
            relation,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    /// The selection is mutable and no relation exists.
    Editing,
    /// The selection is frozen and a relation has been extracted.
    Confirmed(Confirmation),
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Editing => "editing",
            SessionState::Confirmed(_) => "confirmed",
        }
    }
}

/// One user's recoloring session over a single grid.
#[derive(Debug, Clone)]
pub struct Session {
    grid: PixelGrid,
    state: SessionState,
    keep_lightness: bool,
}

impl Session {
    pub fn new(grid: PixelGrid) -> Self {
        Self {
            grid,
            state: SessionState::Editing,
            keep_lightness: false,
        }
    }

    pub fn with_config(grid: PixelGrid, config: &SessionConfig) -> Self {
        Self {
            keep_lightness: config.keep_lightness,
            ..Self::new(grid)
        }
    }

    pub fn grid(&self) -> &PixelGrid {
        &self.grid
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self.state, SessionState::Confirmed(_))
    }

    pub fn relation(&self) -> Option<&ColorRelation> {
        self.confirmation().map(|confirmation| &confirmation.relation)
    }

    pub fn base_index(&self) -> Option<usize> {
        self.relation().map(ColorRelation::base_index)
    }

    pub fn base_color(&self) -> Option<Rgb> {
        self.confirmation().map(|confirmation| confirmation.base_color)
    }

    pub fn base_color_hex(&self) -> Option<String> {
        self.base_color().map(rgb_to_hex)
    }

    pub fn keep_lightness(&self) -> bool {
        self.keep_lightness
    }

    fn confirmation(&self) -> Option<&Confirmation> {
        match &self.state {
            SessionState::Confirmed(confirmation) => Some(confirmation),
            SessionState::Editing => None,
        }
    }

    fn confirmation_mut(&mut self, operation: &'static str) -> Result<&mut Confirmation> {
        match &mut self.state {
            SessionState::Confirmed(confirmation) => Ok(confirmation),
            SessionState::Editing => Err(rejected(operation, "editing")),
        }
    }

    /// Mutable access to the grid's selection, only while editing.
    pub fn edit_selection<T>(&mut self, edit: impl FnOnce(&mut PixelGrid) -> T) -> Result<T> {
        if self.is_confirmed() {
            return Err(rejected("edit selection", self.state.name()));
        }
        Ok(edit(&mut self.grid))
    }

    /// Replaces the grid wholesale (new image or grid size) and starts editing again.
    pub fn load_grid(&mut self, grid: PixelGrid) {
        debug!("loaded a {}x{} grid", grid.edge(), grid.edge());
        self.grid = grid;
        self.state = SessionState::Editing;
    }

    /// Freezes the selection and extracts a relation around `base`, or around the
    /// first selected cell when no base is nominated.
    pub fn confirm(&mut self, base: Option<usize>) -> Result<()> {
        if self.is_confirmed() {
            return Err(rejected("confirm", self.state.name()));
        }
        if self.grid.selected_count() == 0 {
            warn!("confirm rejected: nothing is selected");
            return Err(Error::EmptySelection);
        }
        let base_index = match base {
            Some(index) => {
                self.grid
                    .check_index(index)
                    .inspect_err(|_| warn!("confirm rejected: base {index} out of range"))?;
                index
            }
            None => self.grid.first_selected().ok_or(Error::EmptySelection)?,
        };

        let confirmation = Confirmation::around(&self.grid, base_index)?;
        debug!(
            "confirmed {} cells around base {base_index} ({})",
            confirmation.relation.related_count(),
            rgb_to_hex(confirmation.base_color)
        );
        self.state = SessionState::Confirmed(confirmation);
        Ok(())
    }

    /// Moves the base to another selected cell, re-extracting the relation from the
    /// grid's current colors and resetting the working base color to that cell.
    pub fn set_base(&mut self, index: usize) -> Result<()> {
        if !self.is_confirmed() {
            return Err(rejected("set base", self.state.name()));
        }
        if !self.grid.is_selected(index)? {
            warn!("set base rejected: cell {index} is not selected");
            return Err(Error::BaseNotSelected(index));
        }

        let confirmation = Confirmation::around(&self.grid, index)?;
        debug!("base moved to {index} ({})", rgb_to_hex(confirmation.base_color));
        self.state = SessionState::Confirmed(confirmation);
        Ok(())
    }

    /// Discards the relation and returns to editing with the selection intact.
    pub fn modify(&mut self) -> Result<()> {
        self.confirmation_mut("modify")?;
        debug!("selection reopened for editing");
        self.state = SessionState::Editing;
        Ok(())
    }

    /// Bakes the current preview into the grid and returns to editing.
    pub fn apply(&mut self) -> Result<()> {
        self.confirmation_mut("apply")?;
        let baked = self.preview();
        debug!("baked preview into the grid");
        self.grid = baked;
        self.state = SessionState::Editing;
        Ok(())
    }

    /// Sets the working base color from a hex string. With the lock on, only the hue
    /// of the requested color is kept. An invalid hex leaves the previous color.
    pub fn set_base_color(&mut self, hex: &str) -> Result<Rgb> {
        let keep_lightness = self.keep_lightness;
        let confirmation = self.confirmation_mut("set base color")?;
        let requested = hex_to_rgb(hex).inspect_err(|_| warn!("ignored invalid base color {hex:?}"))?;

        confirmation.base_color = if keep_lightness {
            constrain_to_anchor(requested, confirmation.anchor)
        } else {
            requested
        };
        debug!("base color set to {}", rgb_to_hex(confirmation.base_color));
        Ok(confirmation.base_color)
    }

    /// Toggles the saturation/lightness lock. Turning it on re-corrects the current
    /// base color from the anchor captured when the base was chosen.
    pub fn set_keep_lightness(&mut self, keep_lightness: bool) {
        self.keep_lightness = keep_lightness;
        if keep_lightness {
            if let SessionState::Confirmed(confirmation) = &mut self.state {
                confirmation.base_color = constrain_to_anchor(confirmation.base_color, confirmation.anchor);
            }
        }
        debug!("lightness lock {}", if keep_lightness { "on" } else { "off" });
    }

    /// The grid with the relation applied around the working base color. While
    /// editing this is the grid itself.
    pub fn preview(&self) -> PixelGrid {
        match self.confirmation() {
            Some(confirmation) => build_preview(&self.grid, Some(&confirmation.relation), confirmation.base_color),
            None => self.grid.clone(),
        }
    }

    /// Exports whatever `preview` currently shows.
    pub fn export(&self, options: &ExportOptions) -> Result<RgbaImage> {
        export_bitmap(&self.preview(), options)
    }
}

fn rejected(operation: &'static str, state: &'static str) -> Error {
    warn!("`{operation}` rejected while {state}");
    Error::InvalidTransition { operation, state }
}
