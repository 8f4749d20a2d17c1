use serde::{Deserialize, Serialize};
use std::path::Path;

/// Geometry constants for application layout and canvas packing. All
/// distances are in abstract scene units; the renderer decides what a unit
/// maps to on screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub compact_size: f32,
    pub node_width: f32,
    pub node_height: f32,
    pub pod_size: f32,
    pub pod_gap: f32,
    pub pods_per_row: usize,
    pub badge_size: f32,
    pub badge_gap: f32,
    pub badges_per_row: usize,
    pub controller_header: f32,
    pub controller_padding: f32,
    pub node_gap: f32,
    pub lane_gap: f32,
    pub app_padding: f32,
    pub title_bar: f32,
    pub app_gap: f32,
    pub max_row_width: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            compact_size: 56.0,
            node_width: 120.0,
            node_height: 64.0,
            pod_size: 44.0,
            pod_gap: 8.0,
            pods_per_row: 4,
            badge_size: 20.0,
            badge_gap: 6.0,
            badges_per_row: 5,
            controller_header: 28.0,
            controller_padding: 12.0,
            node_gap: 24.0,
            lane_gap: 56.0,
            app_padding: 24.0,
            title_bar: 32.0,
            app_gap: 40.0,
            max_row_width: 1600.0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    compact_size: Option<f32>,
    node_width: Option<f32>,
    node_height: Option<f32>,
    pod_size: Option<f32>,
    pod_gap: Option<f32>,
    pods_per_row: Option<usize>,
    badge_size: Option<f32>,
    badge_gap: Option<f32>,
    badges_per_row: Option<usize>,
    controller_header: Option<f32>,
    controller_padding: Option<f32>,
    node_gap: Option<f32>,
    lane_gap: Option<f32>,
    app_padding: Option<f32>,
    title_bar: Option<f32>,
    app_gap: Option<f32>,
    max_row_width: Option<f32>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<LayoutConfig> {
    let mut config = LayoutConfig::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = match serde_json::from_str(&contents) {
        Ok(parsed) => parsed,
        // Hand-written config files tend to carry comments and trailing
        // commas; fall back to the lenient parser.
        Err(_) => json5::from_str(&contents)?,
    };

    if let Some(v) = parsed.compact_size {
        config.compact_size = v;
    }
    if let Some(v) = parsed.node_width {
        config.node_width = v;
    }
    if let Some(v) = parsed.node_height {
        config.node_height = v;
    }
    if let Some(v) = parsed.pod_size {
        config.pod_size = v;
    }
    if let Some(v) = parsed.pod_gap {
        config.pod_gap = v;
    }
    if let Some(v) = parsed.pods_per_row {
        config.pods_per_row = v.max(1);
    }
    if let Some(v) = parsed.badge_size {
        config.badge_size = v;
    }
    if let Some(v) = parsed.badge_gap {
        config.badge_gap = v;
    }
    if let Some(v) = parsed.badges_per_row {
        config.badges_per_row = v.max(1);
    }
    if let Some(v) = parsed.controller_header {
        config.controller_header = v;
    }
    if let Some(v) = parsed.controller_padding {
        config.controller_padding = v;
    }
    if let Some(v) = parsed.node_gap {
        config.node_gap = v;
    }
    if let Some(v) = parsed.lane_gap {
        config.lane_gap = v;
    }
    if let Some(v) = parsed.app_padding {
        config.app_padding = v;
    }
    if let Some(v) = parsed.title_bar {
        config.title_bar = v;
    }
    if let Some(v) = parsed.app_gap {
        config.app_gap = v;
    }
    if let Some(v) = parsed.max_row_width {
        config.max_row_width = v;
    }

    Ok(config)
}
