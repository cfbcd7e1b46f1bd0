use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::arrange::UntangleReport;
use crate::config::DockConfig;
use crate::error::{DockError, Result};
use crate::geometry::{Point, Rect};
use crate::port::{Port, facing_ports};
use crate::registry::{ConnectorId, GroupDocks};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupSpec {
    pub id: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl GroupSpec {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorSpec {
    pub id: String,
    pub source: String,
    pub target: String,
    /// Explicit spacing; derived from the stroke width when omitted.
    #[serde(default)]
    pub spacing: Option<f32>,
    #[serde(default)]
    pub stroke_width: Option<f32>,
    #[serde(default)]
    pub bidirectional: bool,
    #[serde(default)]
    pub source_port: Option<Port>,
    #[serde(default)]
    pub target_port: Option<Port>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
    #[serde(default)]
    pub connectors: Vec<ConnectorSpec>,
}

#[derive(Debug, Clone)]
pub struct ConnectorLayout {
    pub id: String,
    pub source: String,
    pub target: String,
    pub source_port: Port,
    pub target_port: Port,
    pub spacing: f32,
    pub start: Point,
    pub end: Point,
    pub bidirectional: bool,
    /// Forward and backward lanes of a bidirectional connector.
    pub lanes: Vec<(Point, Point)>,
}

#[derive(Debug, Clone)]
pub struct PortLayout {
    pub port: Port,
    pub connectors: Vec<String>,
    pub crunched: bool,
    pub untangle: UntangleReport,
}

#[derive(Debug, Clone)]
pub struct GroupLayout {
    pub id: String,
    pub bounds: Rect,
    pub ports: Vec<PortLayout>,
}

#[derive(Debug, Clone)]
pub struct SceneLayout {
    pub groups: Vec<GroupLayout>,
    pub connectors: Vec<ConnectorLayout>,
    /// Extent of all groups and dock points.
    pub bounds: Rect,
}

/// Parse a scene from JSON, falling back to JSON5 for hand-written files.
pub fn parse_scene(input: &str) -> Result<Scene> {
    match serde_json::from_str::<Scene>(input) {
        Ok(scene) => Ok(scene),
        Err(json_err) => match json5::from_str::<Scene>(input) {
            Ok(scene) => Ok(scene),
            Err(_) => Err(DockError::Parse(json_err.to_string())),
        },
    }
}

struct EndHandles {
    source_group: usize,
    source_id: ConnectorId,
    target_group: usize,
    target_id: ConnectorId,
    source_port: Port,
    target_port: Port,
    spacing: f32,
}

fn index_groups(scene: &Scene) -> Result<HashMap<&str, usize>> {
    let mut index = HashMap::with_capacity(scene.groups.len());
    for (idx, group) in scene.groups.iter().enumerate() {
        if !group.bounds().is_valid() {
            return Err(DockError::InvalidBounds(group.id.clone()));
        }
        if index.insert(group.id.as_str(), idx).is_some() {
            return Err(DockError::DuplicateGroup(group.id.clone()));
        }
    }
    Ok(index)
}

fn resolve_ports(spec: &ConnectorSpec, source: &Rect, target: &Rect) -> (Port, Port) {
    let (facing_src, facing_tgt) = facing_ports(source, target);
    (
        spec.source_port.unwrap_or(facing_src),
        spec.target_port.unwrap_or(facing_tgt),
    )
}

/// Dock every connector of `scene` on its groups and return the result.
pub fn layout_scene(scene: &Scene, config: &DockConfig) -> Result<SceneLayout> {
    let index = index_groups(scene)?;
    let options = config.options();
    let mut registries: Vec<GroupDocks> = scene
        .groups
        .iter()
        .map(|g| GroupDocks::new(g.bounds(), options))
        .collect();
    // (group, handle) -> connector index
    let mut owners: Vec<HashMap<ConnectorId, usize>> = vec![HashMap::new(); scene.groups.len()];
    let mut seen = HashSet::with_capacity(scene.connectors.len());
    let mut handles = Vec::with_capacity(scene.connectors.len());

    for (conn_idx, spec) in scene.connectors.iter().enumerate() {
        if !seen.insert(spec.id.as_str()) {
            return Err(DockError::DuplicateConnector(spec.id.clone()));
        }
        let lookup = |group: &str| {
            index.get(group).copied().ok_or_else(|| DockError::UnknownGroup {
                connector: spec.id.clone(),
                group: group.to_string(),
            })
        };
        let source_group = lookup(&spec.source)?;
        let target_group = lookup(&spec.target)?;
        if source_group == target_group {
            return Err(DockError::SelfConnection(spec.id.clone()));
        }

        let stroke = spec.stroke_width.unwrap_or(config.default_stroke_width);
        let spacing = spec
            .spacing
            .unwrap_or_else(|| config.required_spacing(stroke, spec.bidirectional));
        let source_rect = registries[source_group].bounds();
        let target_rect = registries[target_group].bounds();
        let (source_port, target_port) = resolve_ports(spec, &source_rect, &target_rect);

        // Until the far end is docked, aim at the middle of its side.
        let source_id =
            registries[source_group].insert(spacing, target_port.side_center(&target_rect))?;
        registries[source_group].assign(source_id, source_port)?;
        let target_id =
            registries[target_group].insert(spacing, source_port.side_center(&source_rect))?;
        registries[target_group].assign(target_id, target_port)?;

        owners[source_group].insert(source_id, conn_idx);
        owners[target_group].insert(target_id, conn_idx);
        handles.push(EndHandles {
            source_group,
            source_id,
            target_group,
            target_id,
            source_port,
            target_port,
            spacing,
        });
    }

    for registry in &mut registries {
        registry.arrange_all();
    }

    for _ in 0..config.refinement_passes {
        let mut retargets = Vec::with_capacity(handles.len() * 2);
        for end in &handles {
            if let (Some(start), Some(stop)) = (
                registries[end.source_group].dock_point(end.source_id),
                registries[end.target_group].dock_point(end.target_id),
            ) {
                retargets.push((end.source_group, end.source_id, stop));
                retargets.push((end.target_group, end.target_id, start));
            }
        }
        for (group, id, terminus) in retargets {
            registries[group].retarget(id, terminus)?;
        }
        for registry in &mut registries {
            registry.arrange_all();
        }
    }

    let mut bounds = registries
        .iter()
        .map(GroupDocks::bounds)
        .reduce(|acc, rect| acc.union(&rect))
        .unwrap_or_default();

    let mut connectors = Vec::with_capacity(handles.len());
    for (spec, end) in scene.connectors.iter().zip(&handles) {
        let start = registries[end.source_group]
            .dock_point(end.source_id)
            .ok_or(DockError::UnknownConnector(end.source_id))?;
        let stop = registries[end.target_group]
            .dock_point(end.target_id)
            .ok_or(DockError::UnknownConnector(end.target_id))?;
        bounds = bounds.include(start).include(stop);
        let lanes = if spec.bidirectional {
            bidirectional_lanes(start, end.source_port, stop, end.target_port, config.lane_offset)
        } else {
            Vec::new()
        };
        connectors.push(ConnectorLayout {
            id: spec.id.clone(),
            source: spec.source.clone(),
            target: spec.target.clone(),
            source_port: end.source_port,
            target_port: end.target_port,
            spacing: end.spacing,
            start,
            end: stop,
            bidirectional: spec.bidirectional,
            lanes,
        });
    }

    let groups: Vec<GroupLayout> = scene
        .groups
        .iter()
        .zip(&registries)
        .zip(&owners)
        .map(|((group, registry), owner)| GroupLayout {
            id: group.id.clone(),
            bounds: registry.bounds(),
            ports: Port::ALL
                .into_iter()
                .filter_map(|port| {
                    let ids = registry.connectors_on(port);
                    if ids.is_empty() {
                        return None;
                    }
                    Some(PortLayout {
                        port,
                        connectors: ids
                            .iter()
                            .filter_map(|id| owner.get(id))
                            .map(|&idx| scene.connectors[idx].id.clone())
                            .collect(),
                        crunched: registry.is_crunched(port),
                        untangle: registry.last_report(port),
                    })
                })
                .collect(),
        })
        .collect();

    let residual: usize = groups
        .iter()
        .flat_map(|g| &g.ports)
        .map(|p| p.untangle.crossings_after)
        .sum();
    info!(
        groups = groups.len(),
        connectors = connectors.len(),
        residual_crossings = residual,
        "scene laid out"
    );

    Ok(SceneLayout {
        groups,
        connectors,
        bounds,
    })
}

/// Two parallel lanes for a bidirectional connector, one per direction.
fn bidirectional_lanes(
    start: Point,
    source_port: Port,
    end: Point,
    target_port: Port,
    offset: f32,
) -> Vec<(Point, Point)> {
    let (sx, sy) = source_port.lane_offset(offset);
    let (tx, ty) = target_port.lane_offset(offset);
    vec![
        (start.offset(sx, sy), end.offset(-tx, -ty)),
        (end.offset(tx, ty), start.offset(-sx, -sy)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_groups() -> &'static str {
        r#"{
            "groups": [
                { "id": "input", "x": 0, "y": 0, "width": 200, "height": 60 },
                { "id": "hidden", "x": 0, "y": 300, "width": 200, "height": 60 }
            ],
            "connectors": [
                { "id": "w1", "source": "input", "target": "hidden" }
            ]
        }"#
    }

    #[test]
    fn parses_json_and_json5() {
        let scene = parse_scene(two_groups()).unwrap();
        assert_eq!(scene.groups.len(), 2);
        assert_eq!(scene.connectors[0].source_port, None);

        let scene = parse_scene(
            "{ groups: [{ id: 'a', x: 0, y: 0, width: 10, height: 10 }], connectors: [], }",
        )
        .unwrap();
        assert_eq!(scene.groups[0].id, "a");

        assert!(matches!(parse_scene("{ groups: ["), Err(DockError::Parse(_))));
    }

    #[test]
    fn vertical_neighbours_dock_south_to_north() {
        let scene = parse_scene(two_groups()).unwrap();
        let layout = layout_scene(&scene, &DockConfig::default()).unwrap();
        let conn = &layout.connectors[0];
        assert_eq!(conn.source_port, Port::South);
        assert_eq!(conn.target_port, Port::North);
        assert_eq!(conn.start, Point::new(100.0, 70.0));
        assert_eq!(conn.end, Point::new(100.0, 290.0));
        assert_eq!(conn.spacing, 12.0);
        assert!(conn.lanes.is_empty());
        assert_eq!(layout.groups[0].ports.len(), 1);
        assert_eq!(layout.groups[0].ports[0].connectors, vec!["w1".to_string()]);
    }

    #[test]
    fn explicit_ports_win() {
        let mut scene = parse_scene(two_groups()).unwrap();
        scene.connectors[0].source_port = Some(Port::East);
        let layout = layout_scene(&scene, &DockConfig::default()).unwrap();
        let conn = &layout.connectors[0];
        assert_eq!(conn.source_port, Port::East);
        assert_eq!(conn.target_port, Port::North);
        assert_eq!(conn.start, Point::new(210.0, 30.0));
    }

    #[test]
    fn bidirectional_connectors_get_parallel_lanes() {
        let mut scene = parse_scene(two_groups()).unwrap();
        scene.connectors[0].bidirectional = true;
        let layout = layout_scene(&scene, &DockConfig::default()).unwrap();
        let conn = &layout.connectors[0];
        assert_eq!(conn.spacing, 14.0);
        assert_eq!(conn.lanes.len(), 2);
        let (a0, a1) = conn.lanes[0];
        let (b0, b1) = conn.lanes[1];
        // forward lane sits on one side, backward lane on the other
        assert_eq!(a0.x, a1.x);
        assert_eq!(b0.x, b1.x);
        assert_eq!((a0.x - b0.x).abs(), 8.0);
        assert_eq!(a0.y, 70.0);
        assert_eq!(b0.y, 290.0);
    }

    #[test]
    fn fan_in_connectors_do_not_cross() {
        let scene = parse_scene(
            r#"{
                "groups": [
                    { "id": "left", "x": 0, "y": 0, "width": 80, "height": 40 },
                    { "id": "mid", "x": 200, "y": 0, "width": 80, "height": 40 },
                    { "id": "right", "x": 400, "y": 0, "width": 80, "height": 40 },
                    { "id": "out", "x": 150, "y": 400, "width": 180, "height": 40 }
                ],
                "connectors": [
                    { "id": "r", "source": "right", "target": "out", "targetPort": "north" },
                    { "id": "l", "source": "left", "target": "out", "targetPort": "top" },
                    { "id": "m", "source": "mid", "target": "out", "targetPort": "north" }
                ]
            }"#,
        )
        .unwrap();
        let layout = layout_scene(&scene, &DockConfig::default()).unwrap();
        let out = layout.groups.iter().find(|g| g.id == "out").unwrap();
        assert_eq!(out.ports.len(), 1);
        assert_eq!(out.ports[0].untangle.crossings_after, 0);
        let x_of = |id: &str| layout.connectors.iter().find(|c| c.id == id).unwrap().end.x;
        assert!(x_of("l") < x_of("m"));
        assert!(x_of("m") < x_of("r"));
    }

    #[test]
    fn rejects_bad_scenes() {
        let config = DockConfig::default();
        let mut scene = parse_scene(two_groups()).unwrap();
        scene.connectors[0].target = "missing".to_string();
        assert!(matches!(
            layout_scene(&scene, &config),
            Err(DockError::UnknownGroup { .. })
        ));

        let mut scene = parse_scene(two_groups()).unwrap();
        scene.connectors[0].target = "input".to_string();
        assert!(matches!(layout_scene(&scene, &config), Err(DockError::SelfConnection(_))));

        let mut scene = parse_scene(two_groups()).unwrap();
        scene.groups[1].id = "input".to_string();
        assert!(matches!(layout_scene(&scene, &config), Err(DockError::DuplicateGroup(_))));

        let mut scene = parse_scene(two_groups()).unwrap();
        let dup = scene.connectors[0].clone();
        scene.connectors.push(dup);
        assert!(matches!(
            layout_scene(&scene, &config),
            Err(DockError::DuplicateConnector(_))
        ));

        let mut scene = parse_scene(two_groups()).unwrap();
        scene.connectors[0].spacing = Some(-1.0);
        assert!(matches!(layout_scene(&scene, &config), Err(DockError::InvalidSpacing(_))));

        let mut scene = parse_scene(two_groups()).unwrap();
        scene.groups[0].width = 0.0;
        assert!(matches!(layout_scene(&scene, &config), Err(DockError::InvalidBounds(_))));
    }

    #[test]
    fn empty_scene_lays_out_to_nothing() {
        let layout = layout_scene(&Scene::default(), &DockConfig::default()).unwrap();
        assert!(layout.groups.is_empty());
        assert!(layout.connectors.is_empty());
        assert_eq!(layout.bounds, Rect::default());
    }
}
