// Dock point arrangement along one port of a group.
//
// The pass runs in three steps. `generate_dock` spaces candidate points along
// the side. `propose_mapping` greedily matches each connector's terminus to
// the closest free point. `untangle` then swaps termini between crossing
// segments while that lowers the crossing count.

use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::geometry::{Point, Rect, intersect_params, lerp, segments_cross};
use crate::port::Port;

/// Default distance between a group side and its dock line.
pub const DEFAULT_BUFFER: f32 = 10.0;
/// Default cap on untangle iterations. Trades residual crossings for
/// bounded layout latency.
pub const DEFAULT_MAX_UNTANGLE_ITERATIONS: usize = 1000;
/// Default tolerance for treating a recomputed dock point as unchanged.
pub const DEFAULT_POINT_TOLERANCE: f32 = 0.01;

/// One connector end that must dock on a port.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connector {
    /// Linear space the connector needs along the side.
    pub spacing: f32,
    /// Far end of the connector, used to order and match dock points.
    pub terminus: Point,
}

impl Connector {
    pub fn new(spacing: f32, terminus: Point) -> Self {
        Self { spacing, terminus }
    }
}

/// A dock point matched with the connector (index into the input slice)
/// whose terminus it serves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DockPair {
    pub dock: Point,
    pub connector: usize,
    pub terminus: Point,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DockOptions {
    pub buffer: f32,
    pub max_untangle_iterations: usize,
    pub point_tolerance: f32,
}

impl Default for DockOptions {
    fn default() -> Self {
        Self {
            buffer: DEFAULT_BUFFER,
            max_untangle_iterations: DEFAULT_MAX_UNTANGLE_ITERATIONS,
            point_tolerance: DEFAULT_POINT_TOLERANCE,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UntangleReport {
    pub iterations: usize,
    pub swaps: usize,
    pub crossings_before: usize,
    pub crossings_after: usize,
    /// The iteration cap stopped the pass while crossings remained.
    pub capped: bool,
}

/// Result of a full arrangement pass over one port.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrangement {
    /// Dock point per connector, in input order.
    pub points: Vec<Point>,
    pub crunched: bool,
    pub report: UntangleReport,
}

pub fn required_space(connectors: &[Connector]) -> f32 {
    connectors.iter().map(|c| c.spacing).sum()
}

/// True when the connectors ask for more room than the side offers.
pub fn is_crunched(bounds: &Rect, port: Port, connectors: &[Connector]) -> bool {
    let (lo, hi) = port.side_extent(bounds);
    required_space(connectors) > hi - lo
}

/// Candidate dock points along `port`, ordered by increasing coordinate.
///
/// When the requested spacing fits, the run of points is centred on the
/// side and each point sits in the middle of its own spacing. Otherwise the
/// side is split evenly ("crunch") starting from its minimum coordinate.
pub fn generate_dock(bounds: &Rect, port: Port, connectors: &[Connector], buffer: f32) -> Vec<Point> {
    let count = connectors.len();
    if count == 0 {
        return Vec::new();
    }
    let (lo, hi) = port.side_extent(bounds);
    let line = port.dock_line(bounds, buffer);
    let required = required_space(connectors);
    let mut points = Vec::with_capacity(count);

    if required > hi - lo {
        let slot = (hi - lo) / count as f32;
        for idx in 0..count {
            points.push(port.point_at(lo + slot * (idx as f32 + 0.5), line));
        }
    } else {
        let mut cursor = (lo + hi) / 2.0 - required / 2.0;
        for connector in connectors {
            cursor += connector.spacing / 2.0;
            points.push(port.point_at(cursor, line));
            cursor += connector.spacing / 2.0;
        }
    }
    points
}

/// Area of the rectangle spanned between `terminus` and the group side.
///
/// The height is the terminus' distance from the side. A terminus beyond
/// either end of the side widens the box to reach it from the far end.
pub fn occupied_area(bounds: &Rect, port: Port, terminus: Point) -> f32 {
    let side = port.dock_line(bounds, 0.0);
    let height = (port.across(terminus) - side).abs();
    let (lo, hi) = port.side_extent(bounds);
    let along = port.along(terminus);
    let width = if along > hi {
        along - lo
    } else if along < lo {
        hi - along
    } else {
        hi - lo
    };
    height * width
}

/// Greedy closest-point matching of termini to dock points.
///
/// Connectors with the largest occupied area pick first; ties keep input
/// order. Each dock point is used at most once and there is no backtracking.
pub fn propose_mapping(
    bounds: &Rect,
    port: Port,
    dock_points: &[Point],
    connectors: &[Connector],
) -> Vec<DockPair> {
    let mut order: Vec<(usize, f32)> = connectors
        .iter()
        .enumerate()
        .map(|(idx, c)| (idx, occupied_area(bounds, port, c.terminus)))
        .collect();
    order.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut pool: Vec<Point> = dock_points.to_vec();
    let mut pairs = Vec::with_capacity(connectors.len());
    for (idx, _) in order {
        let terminus = connectors[idx].terminus;
        let mut best: Option<(usize, f32)> = None;
        for (slot, point) in pool.iter().enumerate() {
            let dist = terminus.distance_sq(*point);
            if best.is_none_or(|(_, min)| dist < min) {
                best = Some((slot, dist));
            }
        }
        let Some((slot, _)) = best else {
            break;
        };
        let dock = pool.remove(slot);
        pairs.push(DockPair {
            dock,
            connector: idx,
            terminus,
        });
    }
    pairs
}

// Segments sharing a dock point or a terminus only touch at that end.
fn shares_endpoint(a: &DockPair, b: &DockPair) -> bool {
    a.dock.approx_eq(b.dock, 0.0) || a.terminus.approx_eq(b.terminus, 0.0)
}

fn pair_crossing(a: &DockPair, b: &DockPair) -> Option<Point> {
    if shares_endpoint(a, b) {
        return None;
    }
    let (t, s) = intersect_params(a.dock, a.terminus, b.dock, b.terminus)?;
    if !(0.0..=1.0).contains(&t) || !(0.0..=1.0).contains(&s) {
        return None;
    }
    Some(lerp(a.dock, a.terminus, t))
}

fn pair_crosses(a: &DockPair, b: &DockPair) -> bool {
    !shares_endpoint(a, b) && segments_cross(a.dock, a.terminus, b.dock, b.terminus)
}

/// Number of unordered pairs of dock segments that cross within bounds.
pub fn count_crossings(pairs: &[DockPair]) -> usize {
    let mut crossings = 0usize;
    for i in 0..pairs.len() {
        for j in (i + 1)..pairs.len() {
            if pair_crosses(&pairs[i], &pairs[j]) {
                crossings += 1;
            }
        }
    }
    crossings
}

/// Crossings that involve segment `i` or segment `j`, each counted once.
fn crossings_involving(pairs: &[DockPair], i: usize, j: usize) -> usize {
    let mut crossings = usize::from(pair_crosses(&pairs[i], &pairs[j]));
    for (k, other) in pairs.iter().enumerate() {
        if k == i || k == j {
            continue;
        }
        crossings += usize::from(pair_crosses(&pairs[i], other));
        crossings += usize::from(pair_crosses(&pairs[j], other));
    }
    crossings
}

fn swap_termini(pairs: &mut [DockPair], i: usize, j: usize) {
    let (ti, ci) = (pairs[i].terminus, pairs[i].connector);
    pairs[i].terminus = pairs[j].terminus;
    pairs[i].connector = pairs[j].connector;
    pairs[j].terminus = ti;
    pairs[j].connector = ci;
}

/// Swap termini between crossing segments until no swap lowers the crossing
/// count or `max_iterations` is reached.
///
/// Each iteration picks, among crossing pairs whose swap strictly reduces
/// the total crossing count, the one whose crossing lies closest to the
/// dock line. The crossing count never increases.
pub fn untangle(pairs: &mut [DockPair], port: Port, max_iterations: usize) -> UntangleReport {
    let before = count_crossings(pairs);
    let mut report = UntangleReport {
        crossings_before: before,
        crossings_after: before,
        ..UntangleReport::default()
    };
    let mut current = before;

    while current > 0 {
        if report.iterations >= max_iterations {
            report.capped = true;
            break;
        }
        report.iterations += 1;

        let mut best: Option<(usize, usize, f32, usize)> = None;
        for i in 0..pairs.len() {
            for j in (i + 1)..pairs.len() {
                let Some(crossing) = pair_crossing(&pairs[i], &pairs[j]) else {
                    continue;
                };
                let metric = (port.across(crossing) - port.across(pairs[i].dock)).abs();
                if best.is_some_and(|(_, _, min, _)| metric >= min) {
                    continue;
                }
                let involved = crossings_involving(pairs, i, j);
                swap_termini(pairs, i, j);
                let after = current - involved + crossings_involving(pairs, i, j);
                swap_termini(pairs, i, j);
                if after < current {
                    best = Some((i, j, metric, after));
                }
            }
        }

        let Some((i, j, metric, after)) = best else {
            break;
        };
        swap_termini(pairs, i, j);
        trace!(
            port = %port,
            a = pairs[i].connector,
            b = pairs[j].connector,
            metric,
            crossings = after,
            "untangle swap"
        );
        current = after;
        report.swaps += 1;
    }

    report.crossings_after = current;
    if report.capped {
        warn!(
            port = %port,
            iterations = report.iterations,
            crossings = current,
            "untangle stopped at iteration cap"
        );
    }
    report
}

/// Run the full generate → propose → untangle pass for one port.
pub fn arrange(bounds: &Rect, port: Port, connectors: &[Connector], options: &DockOptions) -> Arrangement {
    let crunched = is_crunched(bounds, port, connectors);
    let dock_points = generate_dock(bounds, port, connectors, options.buffer);
    let mut pairs = propose_mapping(bounds, port, &dock_points, connectors);
    let report = untangle(&mut pairs, port, options.max_untangle_iterations);

    let mut points = vec![Point::default(); connectors.len()];
    for pair in &pairs {
        points[pair.connector] = pair.dock;
    }
    debug!(
        port = %port,
        connectors = connectors.len(),
        crunched,
        swaps = report.swaps,
        crossings = report.crossings_after,
        "arranged port"
    );
    Arrangement {
        points,
        crunched,
        report,
    }
}
