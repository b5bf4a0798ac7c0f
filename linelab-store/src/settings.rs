use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const KEY_PIXELS_PER_INCH: &str = "pixelsPerInch";
pub const KEY_CARD_WIDTH_PX: &str = "cardWidthInPixels";

pub const DEFAULT_PIXELS_PER_INCH: f64 = 96.0;
pub const DEFAULT_CARD_WIDTH_PX: f64 = 550.0;

/// Standard credit card width, 85.6 mm.
pub const CARD_WIDTH_IN: f64 = 3.370;
/// Credit card height/width ratio, 53.98 mm / 85.6 mm.
pub const CARD_ASPECT: f64 = 53.98 / 85.6;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings io: {0}")]
    Io(#[from] io::Error),
    #[error("settings parse: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Scoped key-value store for numeric constants that must survive across
/// sessions, with explicit load and save. The backing file is JSON.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    values: BTreeMap<String, f64>,
}

impl SettingsStore {
    /// Opens the store at `path`. A missing file yields an empty store; an
    /// unreadable or malformed one is an error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(err) if err.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(err) => return Err(err.into()),
        };
        Ok(Self { path, values })
    }

    pub fn save(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                fs::create_dir_all(dir)?;
            }
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.values)?)?;
        Ok(())
    }

    pub fn get_or(&self, key: &str, default: f64) -> f64 {
        self.values.get(key).copied().unwrap_or(default)
    }

    pub fn set(&mut self, key: &str, value: f64) {
        self.values.insert(key.to_string(), value);
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Display calibration constants. The participant matches an on-screen box
/// to a physical credit card; pixels-per-inch follows from the matched
/// width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    pub pixels_per_inch: f64,
    pub card_width_px: f64,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            pixels_per_inch: DEFAULT_PIXELS_PER_INCH,
            card_width_px: DEFAULT_CARD_WIDTH_PX,
        }
    }
}

impl Calibration {
    pub fn from_store(store: &SettingsStore) -> Self {
        Self {
            pixels_per_inch: store.get_or(KEY_PIXELS_PER_INCH, DEFAULT_PIXELS_PER_INCH),
            card_width_px: store.get_or(KEY_CARD_WIDTH_PX, DEFAULT_CARD_WIDTH_PX),
        }
    }

    /// Adjusts the matched card width and re-derives pixels-per-inch.
    pub fn set_card_width(&mut self, px: f64) {
        self.card_width_px = px;
        self.pixels_per_inch = px / CARD_WIDTH_IN;
    }

    pub fn write_to(&self, store: &mut SettingsStore) {
        store.set(KEY_PIXELS_PER_INCH, self.pixels_per_inch);
        store.set(KEY_CARD_WIDTH_PX, self.card_width_px);
    }
}
