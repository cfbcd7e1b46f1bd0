// Per-group registry of docked connector ends.
//
// Connector ends live in an arena addressed by `ConnectorId`. Each record
// stores its port and current dock point inline. Any change that affects a
// port re-runs the arrangement for that port. Only points that actually
// moved are reported back.

use std::fmt;

use serde::Serialize;
use tracing::debug;

use crate::arrange::{Connector, DockOptions, UntangleReport, arrange};
use crate::error::{DockError, Result};
use crate::geometry::{Point, Rect};
use crate::port::Port;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ConnectorId(pub usize);

impl fmt::Display for ConnectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct ConnectorRecord {
    spacing: f32,
    terminus: Point,
    port: Option<Port>,
    dock: Option<Point>,
}

/// A dock point that moved during an arrangement pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DockChange {
    pub id: ConnectorId,
    pub port: Port,
    pub point: Point,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DockUpdate {
    pub point: Point,
    pub changes: Vec<DockChange>,
}

#[derive(Debug, Clone)]
pub struct GroupDocks {
    bounds: Rect,
    options: DockOptions,
    records: Vec<Option<ConnectorRecord>>,
    reports: [UntangleReport; 4],
    crunched: [bool; 4],
}

fn validate_spacing(spacing: f32) -> Result<()> {
    if spacing.is_finite() && spacing > 0.0 {
        Ok(())
    } else {
        Err(DockError::InvalidSpacing(spacing))
    }
}

impl GroupDocks {
    pub fn new(bounds: Rect, options: DockOptions) -> Self {
        Self {
            bounds,
            options,
            records: Vec::new(),
            reports: [UntangleReport::default(); 4],
            crunched: [false; 4],
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Register a connector end. It is not docked until `assign` or `dock`.
    pub fn insert(&mut self, spacing: f32, terminus: Point) -> Result<ConnectorId> {
        validate_spacing(spacing)?;
        let record = ConnectorRecord {
            spacing,
            terminus,
            port: None,
            dock: None,
        };
        if let Some(slot) = self.records.iter().position(Option::is_none) {
            self.records[slot] = Some(record);
            return Ok(ConnectorId(slot));
        }
        self.records.push(Some(record));
        Ok(ConnectorId(self.records.len() - 1))
    }

    fn record(&self, id: ConnectorId) -> Result<&ConnectorRecord> {
        self.records
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(DockError::UnknownConnector(id))
    }

    fn record_mut(&mut self, id: ConnectorId) -> Result<&mut ConnectorRecord> {
        self.records
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(DockError::UnknownConnector(id))
    }

    /// Move a connector to `port` without re-arranging. Returns the port it
    /// left, if any.
    pub fn assign(&mut self, id: ConnectorId, port: Port) -> Result<Option<Port>> {
        let record = self.record_mut(id)?;
        let previous = record.port.replace(port);
        if previous != Some(port) {
            record.dock = None;
        }
        Ok(previous.filter(|p| *p != port))
    }

    /// Dock a connector on `port` and return its dock point.
    ///
    /// A connector already docked on another port is taken off that port
    /// first, and the remaining connectors there are re-arranged. The target
    /// port is always re-arranged.
    pub fn dock(&mut self, id: ConnectorId, port: Port) -> Result<DockUpdate> {
        let left = self.assign(id, port)?;
        let mut changes = Vec::new();
        if let Some(previous) = left {
            changes.extend(self.arrange(previous));
        }
        changes.extend(self.arrange(port));
        let point = self
            .record(id)?
            .dock
            .ok_or(DockError::UnknownConnector(id))?;
        Ok(DockUpdate { point, changes })
    }

    pub fn set_terminus(&mut self, id: ConnectorId, terminus: Point) -> Result<Vec<DockChange>> {
        let record = self.record_mut(id)?;
        record.terminus = terminus;
        let port = record.port;
        Ok(port.map(|port| self.arrange(port)).unwrap_or_default())
    }

    pub fn set_spacing(&mut self, id: ConnectorId, spacing: f32) -> Result<Vec<DockChange>> {
        validate_spacing(spacing)?;
        let record = self.record_mut(id)?;
        record.spacing = spacing;
        let port = record.port;
        Ok(port.map(|port| self.arrange(port)).unwrap_or_default())
    }

    /// Store a new terminus without re-arranging. Follow with `arrange` or
    /// `arrange_all` once every end of a batch has been updated.
    pub fn retarget(&mut self, id: ConnectorId, terminus: Point) -> Result<()> {
        self.record_mut(id)?.terminus = terminus;
        Ok(())
    }

    /// Free a handle and re-arrange the port it was docked on.
    pub fn remove(&mut self, id: ConnectorId) -> Result<Vec<DockChange>> {
        let record = self
            .records
            .get_mut(id.0)
            .and_then(Option::take)
            .ok_or(DockError::UnknownConnector(id))?;
        Ok(record.port.map(|port| self.arrange(port)).unwrap_or_default())
    }

    pub fn set_bounds(&mut self, bounds: Rect) -> Result<Vec<DockChange>> {
        if !bounds.is_valid() {
            return Err(DockError::InvalidBounds(format!("{bounds:?}")));
        }
        self.bounds = bounds;
        Ok(self.arrange_all())
    }

    pub fn arrange_all(&mut self) -> Vec<DockChange> {
        Port::ALL.into_iter().flat_map(|port| self.arrange(port)).collect()
    }

    /// Recompute dock points on `port`. Records whose point moved beyond the
    /// configured tolerance are updated and reported.
    pub fn arrange(&mut self, port: Port) -> Vec<DockChange> {
        let ids = self.connectors_on(port);
        if ids.is_empty() {
            self.reports[port.slot()] = UntangleReport::default();
            self.crunched[port.slot()] = false;
            return Vec::new();
        }
        let connectors: Vec<Connector> = ids
            .iter()
            .filter_map(|id| self.records[id.0].as_ref())
            .map(|r| Connector::new(r.spacing, r.terminus))
            .collect();
        let arrangement = arrange(&self.bounds, port, &connectors, &self.options);
        self.reports[port.slot()] = arrangement.report;
        self.crunched[port.slot()] = arrangement.crunched;

        let tolerance = self.options.point_tolerance;
        let mut changes = Vec::new();
        for (id, point) in ids.into_iter().zip(arrangement.points) {
            let Some(record) = self.records[id.0].as_mut() else {
                continue;
            };
            let unchanged = record
                .dock
                .is_some_and(|current| current.approx_eq(point, tolerance));
            if unchanged {
                continue;
            }
            record.dock = Some(point);
            changes.push(DockChange { id, port, point });
        }
        debug!(port = %port, moved = changes.len(), "dock points updated");
        changes
    }

    pub fn dock_point(&self, id: ConnectorId) -> Option<Point> {
        self.record(id).ok().and_then(|r| r.dock)
    }

    pub fn port_of(&self, id: ConnectorId) -> Option<Port> {
        self.record(id).ok().and_then(|r| r.port)
    }

    pub fn terminus(&self, id: ConnectorId) -> Option<Point> {
        self.record(id).ok().map(|r| r.terminus)
    }

    /// Live connectors on `port`, in handle order.
    pub fn connectors_on(&self, port: Port) -> Vec<ConnectorId> {
        self.records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.as_ref().is_some_and(|r| r.port == Some(port)))
            .map(|(idx, _)| ConnectorId(idx))
            .collect()
    }

    pub fn last_report(&self, port: Port) -> UntangleReport {
        self.reports[port.slot()]
    }

    pub fn is_crunched(&self, port: Port) -> bool {
        self.crunched[port.slot()]
    }

    pub fn len(&self) -> usize {
        self.records.iter().filter(|r| r.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn docks() -> GroupDocks {
        GroupDocks::new(Rect::new(0.0, 0.0, 200.0, 100.0), DockOptions::default())
    }

    #[test]
    fn single_connector_docks_at_side_centre() {
        let mut group = docks();
        let id = group.insert(20.0, Point::new(100.0, -300.0)).unwrap();
        let update = group.dock(id, Port::North).unwrap();
        assert_eq!(update.point, Point::new(100.0, -10.0));
        assert_eq!(update.changes.len(), 1);
        assert_eq!(group.port_of(id), Some(Port::North));
    }

    #[test]
    fn redocking_same_port_reports_no_changes() {
        let mut group = docks();
        let id = group.insert(20.0, Point::new(100.0, -300.0)).unwrap();
        group.dock(id, Port::North).unwrap();
        let update = group.dock(id, Port::North).unwrap();
        assert!(update.changes.is_empty());
        assert_eq!(update.point, Point::new(100.0, -10.0));
    }

    #[test]
    fn sub_tolerance_moves_are_not_reported() {
        let terminus = Point::new(100.0, -300.0);
        let nudged = Rect::new(0.004, 0.0, 200.0, 100.0);

        let mut group = docks();
        let id = group.insert(20.0, terminus).unwrap();
        group.dock(id, Port::North).unwrap();
        let changes = group.set_bounds(nudged).unwrap();
        assert!(changes.is_empty());
        assert_eq!(group.dock_point(id), Some(Point::new(100.0, -10.0)));

        let exact = DockOptions {
            point_tolerance: 0.0,
            ..DockOptions::default()
        };
        let mut group = GroupDocks::new(Rect::new(0.0, 0.0, 200.0, 100.0), exact);
        let id = group.insert(20.0, terminus).unwrap();
        group.dock(id, Port::North).unwrap();
        let changes = group.set_bounds(nudged).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].id, id);
        assert_ne!(group.dock_point(id), Some(Point::new(100.0, -10.0)));
    }

    #[test]
    fn moving_ports_rearranges_the_old_port() {
        let mut group = docks();
        let a = group.insert(20.0, Point::new(50.0, -300.0)).unwrap();
        let b = group.insert(20.0, Point::new(150.0, -300.0)).unwrap();
        group.dock(a, Port::North).unwrap();
        group.dock(b, Port::North).unwrap();
        assert_eq!(group.dock_point(a), Some(Point::new(90.0, -10.0)));
        assert_eq!(group.dock_point(b), Some(Point::new(110.0, -10.0)));

        let update = group.dock(b, Port::East).unwrap();
        assert_eq!(update.point, Point::new(210.0, 50.0));
        assert!(update.changes.iter().any(|c| c.id == a && c.point == Point::new(100.0, -10.0)));
        assert_eq!(group.connectors_on(Port::North), vec![a]);
        assert_eq!(group.connectors_on(Port::East), vec![b]);
    }

    #[test]
    fn removal_frees_the_handle_and_recentres() {
        let mut group = docks();
        let a = group.insert(20.0, Point::new(50.0, -300.0)).unwrap();
        let b = group.insert(20.0, Point::new(150.0, -300.0)).unwrap();
        group.dock(a, Port::North).unwrap();
        group.dock(b, Port::North).unwrap();
        let changes = group.remove(a).unwrap();
        assert_eq!(changes, vec![DockChange {
            id: b,
            port: Port::North,
            point: Point::new(100.0, -10.0)
        }]);
        assert!(matches!(group.remove(a), Err(DockError::UnknownConnector(_))));
        assert_eq!(group.len(), 1);
        let c = group.insert(10.0, Point::new(0.0, 0.0)).unwrap();
        assert_eq!(c, a);
    }

    #[test]
    fn resizing_moves_every_docked_point() {
        let mut group = docks();
        let a = group.insert(20.0, Point::new(100.0, 400.0)).unwrap();
        group.dock(a, Port::South).unwrap();
        assert_eq!(group.dock_point(a), Some(Point::new(100.0, 110.0)));
        let changes = group.set_bounds(Rect::new(0.0, 0.0, 400.0, 50.0)).unwrap();
        assert_eq!(changes.len(), 1);
        assert_eq!(group.dock_point(a), Some(Point::new(200.0, 60.0)));
        assert!(group.set_bounds(Rect::new(0.0, 0.0, -1.0, 50.0)).is_err());
    }

    #[test]
    fn terminus_changes_can_swap_assignments() {
        let mut group = docks();
        let a = group.insert(50.0, Point::new(-200.0, -100.0)).unwrap();
        let b = group.insert(50.0, Point::new(400.0, -100.0)).unwrap();
        group.dock(a, Port::North).unwrap();
        group.dock(b, Port::North).unwrap();
        assert_eq!(group.dock_point(a), Some(Point::new(75.0, -10.0)));
        assert_eq!(group.dock_point(b), Some(Point::new(125.0, -10.0)));

        let changes = group.set_terminus(a, Point::new(600.0, -100.0)).unwrap();
        assert_eq!(changes.len(), 2);
        assert_eq!(group.dock_point(a), Some(Point::new(125.0, -10.0)));
        assert_eq!(group.dock_point(b), Some(Point::new(75.0, -10.0)));

        // b already sits on the west-facing point
        let changes = group.set_terminus(b, Point::new(-400.0, -100.0)).unwrap();
        assert!(changes.is_empty());
    }

    #[test]
    fn invalid_spacing_is_rejected() {
        let mut group = docks();
        assert!(matches!(
            group.insert(0.0, Point::default()),
            Err(DockError::InvalidSpacing(_))
        ));
        assert!(group.insert(f32::NAN, Point::default()).is_err());
        let id = group.insert(5.0, Point::default()).unwrap();
        assert!(group.set_spacing(id, -3.0).is_err());
        assert!(matches!(
            group.dock(ConnectorId(42), Port::West),
            Err(DockError::UnknownConnector(ConnectorId(42)))
        ));
    }

    #[test]
    fn crunch_state_is_tracked_per_port() {
        let mut group = docks();
        for _ in 0..3 {
            let id = group.insert(50.0, Point::new(250.0, 50.0)).unwrap();
            group.dock(id, Port::East).unwrap();
        }
        assert!(group.is_crunched(Port::East));
        assert!(!group.is_crunched(Port::North));
        let ys: Vec<f32> = group
            .connectors_on(Port::East)
            .into_iter()
            .filter_map(|id| group.dock_point(id))
            .map(|p| p.y)
            .collect();
        assert_eq!(ys.len(), 3);
        for y in ys {
            assert!(y > 0.0 && y < 100.0);
        }
    }
}
