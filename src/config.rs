use crate::arrange::{
    DEFAULT_BUFFER, DEFAULT_MAX_UNTANGLE_ITERATIONS, DEFAULT_POINT_TOLERANCE, DockOptions,
};
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DockConfig {
    /// Gap between a group side and the line its dock points sit on.
    pub buffer: f32,
    /// Cap on untangle iterations per port. Higher values buy fewer
    /// residual crossings at the cost of layout latency.
    pub max_untangle_iterations: usize,
    /// Dock points closer than this to their previous position are kept.
    pub point_tolerance: f32,
    pub default_stroke_width: f32,
    /// Fixed padding added to the stroke-derived connector spacing.
    pub spacing_padding: f32,
    /// Half-distance between the two lanes of a bidirectional connector.
    pub lane_offset: f32,
    /// Passes that re-aim each end at the far end's actual dock point.
    pub refinement_passes: usize,
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            buffer: DEFAULT_BUFFER,
            max_untangle_iterations: DEFAULT_MAX_UNTANGLE_ITERATIONS,
            point_tolerance: DEFAULT_POINT_TOLERANCE,
            default_stroke_width: 1.0,
            spacing_padding: 10.0,
            lane_offset: 4.0,
            refinement_passes: 1,
        }
    }
}

impl DockConfig {
    pub fn options(&self) -> DockOptions {
        DockOptions {
            buffer: self.buffer,
            max_untangle_iterations: self.max_untangle_iterations,
            point_tolerance: self.point_tolerance,
        }
    }

    /// Spacing a connector needs along a port: its stroke on both sides plus
    /// padding, doubled up for a bidirectional pair of arrows.
    pub fn required_spacing(&self, stroke_width: f32, bidirectional: bool) -> f32 {
        let single = stroke_width * 2.0;
        if bidirectional {
            single * 2.0 + self.spacing_padding
        } else {
            single + self.spacing_padding
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
    pub padding: f32,
    pub background: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
            padding: 40.0,
            background: "#FFFFFF".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub dock: DockConfig,
    pub render: RenderConfig,
    pub theme: Theme,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DockConfigFile {
    buffer: Option<f32>,
    max_untangle_iterations: Option<usize>,
    point_tolerance: Option<f32>,
    default_stroke_width: Option<f32>,
    spacing_padding: Option<f32>,
    lane_offset: Option<f32>,
    refinement_passes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ThemeVariables {
    font_family: Option<String>,
    font_size: Option<f32>,
    group_fill: Option<String>,
    group_border: Option<String>,
    group_text_color: Option<String>,
    line_color: Option<String>,
    dock_color: Option<String>,
    background: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
    padding: Option<f32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    theme: Option<String>,
    theme_variables: Option<ThemeVariables>,
    dock: Option<DockConfigFile>,
    render: Option<RenderConfigFile>,
}

fn parse_config_file(contents: &str) -> anyhow::Result<ConfigFile> {
    match serde_json::from_str(contents) {
        Ok(parsed) => Ok(parsed),
        Err(json_err) => json5::from_str(contents)
            .map_err(|_| anyhow::anyhow!("invalid config file: {json_err}")),
    }
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    let contents = std::fs::read_to_string(path)?;
    let parsed = parse_config_file(&contents)?;
    Ok(apply_config_file(Config::default(), parsed))
}

fn apply_config_file(mut config: Config, parsed: ConfigFile) -> Config {
    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "classic" || theme_name == "default" {
            config.theme = Theme::classic();
        } else if theme_name == "modern" {
            config.theme = Theme::modern();
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
        if let Some(v) = vars.font_size {
            config.theme.font_size = v;
        }
        if let Some(v) = vars.group_fill {
            config.theme.group_fill = v;
        }
        if let Some(v) = vars.group_border {
            config.theme.group_border = v;
        }
        if let Some(v) = vars.group_text_color {
            config.theme.group_text_color = v;
        }
        if let Some(v) = vars.line_color {
            config.theme.line_color = v;
        }
        if let Some(v) = vars.dock_color {
            config.theme.dock_color = v;
        }
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
    }

    if let Some(dock) = parsed.dock {
        if let Some(v) = dock.buffer {
            config.dock.buffer = v;
        }
        if let Some(v) = dock.max_untangle_iterations {
            config.dock.max_untangle_iterations = v;
        }
        if let Some(v) = dock.point_tolerance {
            config.dock.point_tolerance = v;
        }
        if let Some(v) = dock.default_stroke_width {
            config.dock.default_stroke_width = v;
        }
        if let Some(v) = dock.spacing_padding {
            config.dock.spacing_padding = v;
        }
        if let Some(v) = dock.lane_offset {
            config.dock.lane_offset = v;
        }
        if let Some(v) = dock.refinement_passes {
            config.dock.refinement_passes = v;
        }
    }

    if let Some(render) = parsed.render {
        if let Some(v) = render.width {
            config.render.width = v;
        }
        if let Some(v) = render.height {
            config.render.height = v;
        }
        if let Some(v) = render.padding {
            config.render.padding = v;
        }
    }

    config.render.background = config.theme.background.clone();
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spacing_follows_stroke_width() {
        let dock = DockConfig::default();
        assert_eq!(dock.required_spacing(1.0, false), 12.0);
        assert_eq!(dock.required_spacing(1.0, true), 14.0);
        assert_eq!(dock.required_spacing(3.0, false), 16.0);
    }

    #[test]
    fn overrides_apply_over_defaults() {
        let parsed = parse_config_file(
            r##"{
                "theme": "classic",
                "themeVariables": { "lineColor": "#ff0000", "background": "#101010" },
                "dock": { "buffer": 4, "maxUntangleIterations": 25, "pointTolerance": 0 },
                "render": { "padding": 12 }
            }"##,
        )
        .unwrap();
        let config = apply_config_file(Config::default(), parsed);
        assert_eq!(config.dock.buffer, 4.0);
        assert_eq!(config.dock.max_untangle_iterations, 25);
        assert_eq!(config.dock.point_tolerance, 0.0);
        assert_eq!(config.dock.lane_offset, DockConfig::default().lane_offset);
        assert_eq!(config.theme.line_color, "#ff0000");
        assert_eq!(config.theme.group_fill, Theme::classic().group_fill);
        assert_eq!(config.render.padding, 12.0);
        assert_eq!(config.render.background, "#101010");
    }

    #[test]
    fn accepts_json5_config() {
        let parsed = parse_config_file("{ dock: { refinementPasses: 3, }, // trailing\n }").unwrap();
        let config = apply_config_file(Config::default(), parsed);
        assert_eq!(config.dock.refinement_passes, 3);
    }

    #[test]
    fn missing_path_gives_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.dock.max_untangle_iterations, 1000);
        assert_eq!(config.dock.buffer, 10.0);
    }
}
