use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{LazyLock, RwLock};

use crate::document::RenderFlags;
use crate::view::cache::DEFAULT_CAPACITY;
use crate::view::{
    Alignment, LayoutMode, LayoutParams, SizingPolicy, Thickness, ViewState, Zoom,
};

pub const CURRENT_VERSION: u32 = 1;
const SETTINGS_FILENAME: &str = "config.yaml";
const APP_NAME: &str = "pageview";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub mode: LayoutMode,

    #[serde(default)]
    pub sizing: SizingPolicy,

    #[serde(default = "default_zoom")]
    pub zoom: f32,

    #[serde(default = "default_page_margin")]
    pub page_margin: Thickness,

    #[serde(default)]
    pub padding: Thickness,

    #[serde(default)]
    pub alignment: Alignment,

    #[serde(default = "default_tile_count")]
    pub tile_count: usize,

    /// Page count above which off-screen pages are not measured
    #[serde(default = "default_culling_threshold")]
    pub culling_threshold: usize,

    #[serde(default = "default_true")]
    pub progressive: bool,

    #[serde(default)]
    pub render_flags: RenderFlags,

    #[serde(default)]
    pub smooth_selection: bool,

    #[serde(default = "default_pixels_per_unit")]
    pub pixels_per_unit: f32,

    /// Pages kept loaded in the engine outside the visible range
    #[serde(default = "default_page_cache")]
    pub page_cache: usize,
}

fn default_true() -> bool {
    true
}

fn default_version() -> u32 {
    CURRENT_VERSION
}

fn default_zoom() -> f32 {
    1.0
}

fn default_page_margin() -> Thickness {
    LayoutParams::default().page_margin
}

fn default_tile_count() -> usize {
    LayoutParams::default().tile_count
}

fn default_culling_threshold() -> usize {
    LayoutParams::default().culling_threshold
}

fn default_pixels_per_unit() -> f32 {
    1.0
}

fn default_page_cache() -> usize {
    DEFAULT_CAPACITY
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            mode: LayoutMode::default(),
            sizing: SizingPolicy::default(),
            zoom: default_zoom(),
            page_margin: default_page_margin(),
            padding: Thickness::default(),
            alignment: Alignment::default(),
            tile_count: default_tile_count(),
            culling_threshold: default_culling_threshold(),
            progressive: true,
            render_flags: RenderFlags::default(),
            smooth_selection: false,
            pixels_per_unit: default_pixels_per_unit(),
            page_cache: default_page_cache(),
        }
    }
}

impl Settings {
    /// Read settings from `path`; any failure is logged and yields defaults
    pub fn load_from(path: &Path) -> Settings {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                error!("Failed to read settings file {path:?}: {e}");
                return Settings::default();
            }
        };
        match serde_yaml::from_str::<Settings>(&content) {
            Ok(mut settings) => {
                debug!("Loaded settings from {path:?}");
                if settings.version < CURRENT_VERSION {
                    migrate_settings(&mut settings);
                    save_settings_to_file(&settings, path);
                }
                settings.sanitize();
                settings
            }
            Err(e) => {
                error!("Failed to parse settings file {path:?}: {e}");
                Settings::default()
            }
        }
    }

    fn sanitize(&mut self) {
        let zoom = Zoom::clamp_factor(self.zoom);
        if zoom != self.zoom {
            warn!("zoom {} out of range, using {zoom}", self.zoom);
            self.zoom = zoom;
        }
        self.page_margin = self.page_margin.clamped();
        self.padding = self.padding.clamped();
        self.tile_count = self.tile_count.max(1);
        if !(self.pixels_per_unit.is_finite() && self.pixels_per_unit > 0.0) {
            warn!("invalid pixels_per_unit {}, using 1", self.pixels_per_unit);
            self.pixels_per_unit = default_pixels_per_unit();
        }
        self.page_cache = self.page_cache.max(1);
    }

    #[must_use]
    pub fn layout_params(&self) -> LayoutParams {
        LayoutParams {
            mode: self.mode,
            sizing: self.sizing,
            zoom: self.zoom,
            page_margin: self.page_margin,
            padding: self.padding,
            alignment: self.alignment,
            tile_count: self.tile_count,
            culling_threshold: self.culling_threshold,
        }
    }

    #[must_use]
    pub fn view_state(&self) -> ViewState {
        let mut state = ViewState::new(self.layout_params());
        state.progressive = self.progressive;
        state.render_flags = self.render_flags;
        state.smooth_selection = self.smooth_selection;
        state.pixels_per_unit = self.pixels_per_unit;
        state
    }
}

static SETTINGS: LazyLock<RwLock<Settings>> = LazyLock::new(|| RwLock::new(Settings::default()));

pub fn preferred_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|config| config.join(APP_NAME).join(SETTINGS_FILENAME))
}

pub fn load_settings() {
    let Some(path) = preferred_config_path() else {
        warn!("Could not determine config directory, using default settings");
        return;
    };
    if path.exists() {
        load_settings_from_path(&path);
    } else {
        info!("Settings file not found, creating with defaults at {path:?}");
        if let Ok(settings) = SETTINGS.read() {
            save_settings_to_file(&settings, &path);
        }
    }
}

pub fn load_settings_from_path(path: &Path) {
    let settings = Settings::load_from(path);
    if let Ok(mut global) = SETTINGS.write() {
        *global = settings;
    }
}

fn migrate_settings(settings: &mut Settings) {
    info!(
        "Migrating settings from v{} to v{}",
        settings.version, CURRENT_VERSION
    );

    // Future migrations go here:
    // if settings.version < 2 {
    //     migrate_v1_to_v2(settings);
    // }

    settings.version = CURRENT_VERSION;
}

pub fn save_settings_to_file(settings: &Settings, path: &Path) {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            if let Err(e) = fs::create_dir_all(parent) {
                error!("Failed to create config directory {parent:?}: {e}");
                return;
            }
        }
    }

    let body = match serde_yaml::to_string(settings) {
        Ok(body) => body,
        Err(e) => {
            error!("Failed to serialize settings: {e}");
            return;
        }
    };
    let content = format!("{SETTINGS_HEADER}{body}");

    match fs::write(path, content) {
        Ok(()) => debug!("Saved settings to {path:?}"),
        Err(e) => error!("Failed to save settings to {path:?}: {e}"),
    }
}

const SETTINGS_HEADER: &str = r#"# ============================================================================
# pageview settings
# ============================================================================
# mode:    single_page | vertical | horizontal | tiles_vertical |
#          tiles_horizontal | tiles_line
# sizing:  fit_width | fit_height | fit_both | fixed_zoom
# alignment.horizontal: left | center | right
# alignment.vertical:   top | center | bottom
# render_flags: annotations, grayscale and lcd_text, each true | false

"#;

// Public API for accessing settings

pub fn get_settings() -> Settings {
    SETTINGS.read().map(|s| s.clone()).unwrap_or_default()
}
