pub mod settings;

pub use settings::{
    CARD_ASPECT, CARD_WIDTH_IN, Calibration, DEFAULT_CARD_WIDTH_PX, DEFAULT_PIXELS_PER_INCH,
    KEY_CARD_WIDTH_PX, KEY_PIXELS_PER_INCH, SettingsStore, StoreError,
};
