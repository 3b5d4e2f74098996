use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use geo::Point;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::map::CameraPolicy;
use crate::model::{AdminLevel, Role, Viewer};

const CONFIG_FILE_NAME: &str = "pucmap.toml";
/// OpenStreetMap serves tiles for zoom 0..=19
const TILE_ZOOM_RANGE: (f64, f64) = (0.0, 19.0);

pub const DEFAULT_SUGGESTIONS: [&str; 5] =
    ["Bưởi Da Xanh", "Sầu riêng Ri6", "Xoài Cát Hòa Lộc", "Lúa ST25", "Vú sữa Lò Rèn"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    Farmer,
    #[default]
    Buyer,
    Admin,
}

impl RoleKind {
    pub const NAMES: [&str; 3] = ["farmer", "buyer", "admin"];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "farmer" => Some(RoleKind::Farmer),
            "buyer" => Some(RoleKind::Buyer),
            "admin" => Some(RoleKind::Admin),
            _ => None,
        }
    }
}

pub const LEVEL_NAMES: [&str; 4] = ["commune", "district", "province", "central"];

pub fn parse_level(s: &str) -> Option<AdminLevel> {
    match s.trim().to_lowercase().as_str() {
        "commune" => Some(AdminLevel::Commune),
        "district" => Some(AdminLevel::District),
        "province" => Some(AdminLevel::Province),
        "central" => Some(AdminLevel::Central),
        _ => None,
    }
}

// --- Viewer ---
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct ViewerConfig {
    pub role: RoleKind,
    pub name: String,
    pub farmer_id: String,
    pub admin_id: String,
    pub level: AdminLevel,
    pub assigned_area: String,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            role: RoleKind::Buyer,
            name: "Khách tham quan".to_string(),
            farmer_id: "f1".to_string(),
            admin_id: "GOV-889".to_string(),
            level: AdminLevel::Central,
            assigned_area: "Toàn quốc".to_string(),
        }
    }
}

/// Command-line replacements for parts of `[viewer]`
#[derive(Debug, Clone, Default)]
pub struct ViewerOverrides {
    pub role: Option<RoleKind>,
    pub level: Option<AdminLevel>,
    pub area: Option<String>,
}

impl ViewerConfig {
    pub fn with_overrides(mut self, overrides: &ViewerOverrides) -> Self {
        if let Some(role) = overrides.role {
            self.role = role;
        }
        if let Some(level) = overrides.level {
            self.level = level;
        }
        if let Some(area) = &overrides.area {
            self.assigned_area = area.clone();
        }
        self
    }

    pub fn to_viewer(&self) -> Viewer {
        let role = match self.role {
            RoleKind::Farmer => Role::Farmer { farmer_id: self.farmer_id.clone() },
            RoleKind::Buyer => Role::Buyer,
            RoleKind::Admin => Role::Admin {
                admin_id: self.admin_id.clone(),
                level: self.level,
                assigned_area: self.assigned_area.clone(),
            },
        };
        Viewer { name: self.name.clone(), role }
    }
}

// --- Map ---
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct MapConfig {
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub camera: CameraPolicy,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center_lat: 10.2435,
            center_lng: 106.3756,
            zoom: 10.0,
            min_zoom: 3.0,
            max_zoom: 19.0,
            camera: CameraPolicy::default(),
        }
    }
}

impl MapConfig {
    pub fn initial_center(&self) -> Point<f64> {
        Point::new(self.center_lng, self.center_lat)
    }

    /// Zoom bounds ordered and clamped to what the tile server provides;
    /// the initial zoom is clamped into them.
    fn sanitized(self) -> Self {
        let (lo, hi) = TILE_ZOOM_RANGE;
        let (mut min_zoom, mut max_zoom) = (self.min_zoom, self.max_zoom);
        if min_zoom > max_zoom {
            warn!("min_zoom {} is above max_zoom {}, swapping", min_zoom, max_zoom);
            std::mem::swap(&mut min_zoom, &mut max_zoom);
        }
        if min_zoom < lo || max_zoom > hi {
            warn!("Zoom range {}..{} outside tile range {}..{}, clamping", min_zoom, max_zoom, lo, hi);
        }
        let min_zoom = min_zoom.clamp(lo, hi);
        let max_zoom = max_zoom.clamp(lo, hi);
        Self { min_zoom, max_zoom, zoom: self.zoom.clamp(min_zoom, max_zoom), ..self }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    pub suggestions: Vec<String>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { suggestions: DEFAULT_SUGGESTIONS.iter().map(|s| s.to_string()).collect() }
    }
}

/// Stand-in for the device position on desktop.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct HomeConfig {
    #[serde(default)]
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

// --- GUI Config ---
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GuiConfig {
    pub font_ui: Option<String>,
    pub font_scale: Option<f32>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub panel_width: Option<f32>,
}

impl Default for GuiConfig {
    fn default() -> Self {
        Self {
            font_ui: None,
            font_scale: Some(1.0),
            width: Some(1280),
            height: Some(800),
            panel_width: Some(380.0),
        }
    }
}

#[derive(Serialize, Deserialize, Default, Debug)]
struct Config {
    #[serde(default)]
    viewer: ViewerConfig,
    #[serde(default)]
    map: MapConfig,
    #[serde(default)]
    search: SearchConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    home: Option<HomeConfig>,
    #[serde(default)]
    gui: GuiConfig,
}

pub struct AppContext {
    pub config_path: PathBuf,
    pub viewer_config: ViewerConfig,
    pub map_config: MapConfig,
    pub search_config: SearchConfig,
    pub home: Option<HomeConfig>,
    pub gui_config: GuiConfig,
}

impl AppContext {
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir().context("No config dir found")?;
        fs::create_dir_all(&config_dir)
            .with_context(|| format!("Cannot create {}", config_dir.display()))?;
        Self::load_from(&config_dir.join(CONFIG_FILE_NAME))
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config = if config_path.exists() {
            debug!("Loading config from {}", config_path.display());
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Cannot read {}", config_path.display()))?;
            let cfg: Config = toml::from_str(&content).with_context(|| {
                format!("Failed to parse {}. Format might have changed.", config_path.display())
            })?;

            // Write back defaults if sections are missing
            let raw: toml::Table = toml::from_str(&content).unwrap_or_default();
            let missing: Vec<&str> = ["viewer", "map", "search", "gui"]
                .into_iter()
                .filter(|section| !raw.contains_key(*section))
                .collect();
            if !missing.is_empty() {
                debug!("Writing back defaults for {:?}", missing);
                fs::write(config_path, toml::to_string_pretty(&cfg)?)?;
            }
            cfg
        } else {
            debug!("Config file does not exist, creating {}", config_path.display());
            let cfg = Config::default();
            fs::write(config_path, toml::to_string_pretty(&cfg)?)
                .with_context(|| format!("Cannot write {}", config_path.display()))?;
            cfg
        };

        Ok(Self {
            config_path: config_path.to_path_buf(),
            viewer_config: config.viewer,
            map_config: config.map.sanitized(),
            search_config: config.search,
            home: config.home,
            gui_config: config.gui,
        })
    }

    /// Configured viewer with command-line overrides applied
    pub fn viewer(&self, overrides: &ViewerOverrides) -> Viewer {
        self.viewer_config.clone().with_overrides(overrides).to_viewer()
    }

    pub fn home_point(&self) -> Option<Point<f64>> {
        self.home.as_ref().map(|h| Point::new(h.lng, h.lat))
    }

    pub fn save_gui_config(&self, gui_config: &GuiConfig) -> Result<()> {
        debug!(
            "Saving gui config: width={:?}, height={:?}, panel_width={:?}",
            gui_config.width, gui_config.height, gui_config.panel_width
        );
        if !self.config_path.exists() {
            warn!("Config file does not exist at {}", self.config_path.display());
            return Ok(());
        }
        let content = fs::read_to_string(&self.config_path)?;
        let mut cfg: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", self.config_path.display()))?;
        cfg.gui = gui_config.clone();
        fs::write(&self.config_path, toml::to_string_pretty(&cfg)?)?;
        Ok(())
    }
}
