use crate::arrange::UntangleReport;
use crate::scene::SceneLayout;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub width: f32,
    pub height: f32,
    pub origin: [f32; 2],
    pub groups: Vec<GroupDump>,
    pub connectors: Vec<ConnectorDump>,
}

#[derive(Debug, Serialize)]
pub struct GroupDump {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub ports: Vec<PortDump>,
}

#[derive(Debug, Serialize)]
pub struct PortDump {
    pub port: String,
    pub connectors: Vec<String>,
    pub crunched: bool,
    pub untangle: UntangleReport,
}

#[derive(Debug, Serialize)]
pub struct ConnectorDump {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_port: String,
    pub target_port: String,
    pub spacing: f32,
    pub start: [f32; 2],
    pub end: [f32; 2],
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lanes: Vec<[[f32; 2]; 2]>,
}

impl LayoutDump {
    pub fn from_layout(layout: &SceneLayout) -> Self {
        let groups = layout
            .groups
            .iter()
            .map(|group| GroupDump {
                id: group.id.clone(),
                x: group.bounds.x,
                y: group.bounds.y,
                width: group.bounds.width,
                height: group.bounds.height,
                ports: group
                    .ports
                    .iter()
                    .map(|port| PortDump {
                        port: port.port.name().to_string(),
                        connectors: port.connectors.clone(),
                        crunched: port.crunched,
                        untangle: port.untangle,
                    })
                    .collect(),
            })
            .collect();

        let connectors = layout
            .connectors
            .iter()
            .map(|conn| ConnectorDump {
                id: conn.id.clone(),
                source: conn.source.clone(),
                target: conn.target.clone(),
                source_port: conn.source_port.name().to_string(),
                target_port: conn.target_port.name().to_string(),
                spacing: conn.spacing,
                start: [conn.start.x, conn.start.y],
                end: [conn.end.x, conn.end.y],
                lanes: conn
                    .lanes
                    .iter()
                    .map(|(a, b)| [[a.x, a.y], [b.x, b.y]])
                    .collect(),
            })
            .collect();

        LayoutDump {
            width: layout.bounds.width,
            height: layout.bounds.height,
            origin: [layout.bounds.x, layout.bounds.y],
            groups,
            connectors,
        }
    }
}

/// Write the dump as pretty JSON to `path`, or stdout when `None`.
pub fn write_layout_dump(dump: &LayoutDump, path: Option<&Path>) -> anyhow::Result<()> {
    if let Some(path) = path {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, dump)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        return Ok(());
    }
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    serde_json::to_writer_pretty(&mut handle, dump)?;
    handle.write_all(b"\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DockConfig;
    use crate::scene::{layout_scene, parse_scene};

    #[test]
    fn dump_uses_plain_arrays_and_port_names() {
        let scene = parse_scene(
            r#"{
                "groups": [
                    { "id": "a", "x": 0, "y": 0, "width": 100, "height": 50 },
                    { "id": "b", "x": 400, "y": 0, "width": 100, "height": 50 }
                ],
                "connectors": [{ "id": "ab", "source": "a", "target": "b" }]
            }"#,
        )
        .unwrap();
        let layout = layout_scene(&scene, &DockConfig::default()).unwrap();
        let value = serde_json::to_value(LayoutDump::from_layout(&layout)).unwrap();
        let conn = &value["connectors"][0];
        assert_eq!(conn["source_port"], "east");
        assert_eq!(conn["target_port"], "west");
        assert_eq!(conn["start"], serde_json::json!([110.0, 25.0]));
        assert_eq!(conn["end"], serde_json::json!([390.0, 25.0]));
        assert!(conn.get("lanes").is_none());
        assert_eq!(value["groups"][0]["ports"][0]["port"], "east");
        assert_eq!(value["groups"][0]["ports"][0]["untangle"]["crossings_after"], 0);
    }
}
