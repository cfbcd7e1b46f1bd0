use crate::config::RenderConfig;
use crate::geometry::Point;
use crate::scene::{ConnectorLayout, SceneLayout};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

/// Radius of the dot drawn on each dock point.
const DOCK_DOT_RADIUS: f32 = 2.5;

pub fn render_svg(layout: &SceneLayout, theme: &Theme, config: &RenderConfig) -> String {
    let mut svg = String::new();
    let pad = config.padding.max(0.0);
    let min_x = layout.bounds.x - pad;
    let min_y = layout.bounds.y - pad;
    let width = (layout.bounds.width + pad * 2.0).max(200.0);
    let height = (layout.bounds.height + pad * 2.0).max(200.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.2}\" height=\"{height:.2}\" viewBox=\"{min_x:.2} {min_y:.2} {width:.2} {height:.2}\">",
    ));

    svg.push_str(&format!(
        "<rect x=\"{min_x:.2}\" y=\"{min_y:.2}\" width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        theme.background
    ));

    svg.push_str("<defs>");
    svg.push_str(&format!(
        "<marker id=\"arrow\" viewBox=\"0 0 10 10\" refX=\"10\" refY=\"5\" markerWidth=\"6\" markerHeight=\"6\" orient=\"auto-start-reverse\"><path d=\"M 0 0 L 10 5 L 0 10 z\" fill=\"{}\"/></marker>",
        theme.line_color
    ));
    svg.push_str("</defs>");

    for group in &layout.groups {
        let b = group.bounds;
        svg.push_str(&format!(
            "<rect x=\"{:.2}\" y=\"{:.2}\" width=\"{:.2}\" height=\"{:.2}\" rx=\"8\" ry=\"8\" fill=\"{}\" stroke=\"{}\" stroke-width=\"1.4\"/>",
            b.x, b.y, b.width, b.height, theme.group_fill, theme.group_border
        ));
        let center = b.center();
        let text_y = center.y + theme.font_size / 3.0;
        svg.push_str(&format!(
            "<text x=\"{:.2}\" y=\"{text_y:.2}\" text-anchor=\"middle\" font-family=\"{}\" font-size=\"{}\" fill=\"{}\">{}</text>",
            center.x,
            theme.font_family,
            theme.font_size,
            theme.group_text_color,
            escape_xml(&group.id)
        ));
    }

    for conn in &layout.connectors {
        svg.push_str(&connector_svg(conn, theme));
    }

    svg.push_str("</svg>");
    svg
}

fn connector_svg(conn: &ConnectorLayout, theme: &Theme) -> String {
    let mut out = String::new();
    let segments: Vec<(Point, Point)> = if conn.lanes.is_empty() {
        vec![(conn.start, conn.end)]
    } else {
        conn.lanes.clone()
    };
    for (from, to) in segments {
        out.push_str(&format!(
            "<path d=\"M {:.2} {:.2} L {:.2} {:.2}\" fill=\"none\" stroke=\"{}\" stroke-width=\"1.4\" marker-end=\"url(#arrow)\"><title>{}</title></path>",
            from.x,
            from.y,
            to.x,
            to.y,
            theme.line_color,
            escape_xml(&conn.id)
        ));
    }
    for dock in [conn.start, conn.end] {
        out.push_str(&format!(
            "<circle cx=\"{:.2}\" cy=\"{:.2}\" r=\"{DOCK_DOT_RADIUS}\" fill=\"{}\"/>",
            dock.x, dock.y, theme.dock_color
        ));
    }
    out
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = "Inter".to_string();
    opt.fontdb_mut().load_system_fonts();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow::anyhow!("Invalid default render size"))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
