use groupdock::dump::LayoutDump;
use groupdock::{Config, Theme, layout_scene, parse_scene, render_scene_svg};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DockRenderOptions {
    theme: Option<String>,
    font_family: Option<String>,
    font_size: Option<f32>,
    buffer: Option<f32>,
    max_untangle_iterations: Option<usize>,
}

fn build_config(options: DockRenderOptions) -> Config {
    let mut config = Config::default();
    if options.theme.as_deref() == Some("classic") {
        config.theme = Theme::classic();
    }
    if let Some(font_family) = options.font_family {
        config.theme.font_family = font_family;
    }
    if let Some(font_size) = options.font_size {
        config.theme.font_size = font_size;
    }
    if let Some(buffer) = options.buffer {
        config.dock.buffer = buffer;
    }
    if let Some(cap) = options.max_untangle_iterations {
        config.dock.max_untangle_iterations = cap;
    }
    config
}

fn parse_options(options_json: Option<String>) -> Result<DockRenderOptions, JsValue> {
    match options_json {
        Some(raw) => serde_json::from_str::<DockRenderOptions>(&raw)
            .map_err(|error| JsValue::from_str(&error.to_string())),
        None => Ok(DockRenderOptions::default()),
    }
}

#[wasm_bindgen]
pub fn render_scene(scene_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let config = build_config(parse_options(options_json)?);
    render_scene_svg(scene_json, &config).map_err(|error| JsValue::from_str(&error.to_string()))
}

#[wasm_bindgen]
pub fn layout_scene_json(scene_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let config = build_config(parse_options(options_json)?);
    let scene = parse_scene(scene_json).map_err(|error| JsValue::from_str(&error.to_string()))?;
    let layout =
        layout_scene(&scene, &config.dock).map_err(|error| JsValue::from_str(&error.to_string()))?;
    serde_json::to_string(&LayoutDump::from_layout(&layout))
        .map_err(|error| JsValue::from_str(&error.to_string()))
}

#[cfg(test)]
mod tests {
    use groupdock::render_scene_svg;

    use crate::{DockRenderOptions, build_config};

    #[test]
    fn renders_a_two_group_scene() {
        let scene = r#"{
            "groups": [
                { "id": "input", "x": 0, "y": 0, "width": 160, "height": 40 },
                { "id": "output", "x": 300, "y": 0, "width": 160, "height": 40 }
            ],
            "connectors": [{ "id": "w", "source": "input", "target": "output" }]
        }"#;

        let svg = render_scene_svg(scene, &build_config(DockRenderOptions::default()))
            .expect("two group scene should render");

        assert!(svg.contains("<svg"));
        assert!(svg.contains("input"));
        assert!(svg.contains("output"));
    }

    #[test]
    fn options_override_config() {
        let config = build_config(DockRenderOptions {
            theme: Some("classic".to_string()),
            buffer: Some(3.0),
            ..DockRenderOptions::default()
        });
        assert_eq!(config.dock.buffer, 3.0);
        assert_eq!(config.theme.font_size, 14.0);
    }
}
