pub mod arrange;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod dump;
pub mod error;
pub mod geometry;
pub mod port;
pub mod registry;
pub mod render;
pub mod scene;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;

pub use arrange::{
    Arrangement, Connector, DockOptions, DockPair, UntangleReport, arrange, count_crossings,
    generate_dock, propose_mapping, untangle,
};
pub use config::{Config, DockConfig, RenderConfig, load_config};
pub use error::DockError;
pub use geometry::{Point, Rect};
pub use port::{Port, facing_ports};
pub use registry::{ConnectorId, DockChange, DockUpdate, GroupDocks};
pub use render::render_svg;
pub use scene::{Scene, SceneLayout, layout_scene, parse_scene};
pub use theme::Theme;

/// Parse a scene, lay it out and render the SVG preview in one call.
pub fn render_scene_svg(input: &str, config: &Config) -> Result<String, DockError> {
    let scene = parse_scene(input)?;
    let layout = layout_scene(&scene, &config.dock)?;
    Ok(render_svg(&layout, &config.theme, &config.render))
}
