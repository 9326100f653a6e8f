//! Chart geometry and interaction
//!
//! Projects a chronologically sorted value series onto a bounded rendering
//! surface, builds the layered path geometry (smooth curve, filled area,
//! point markers), models the reveal animation as sample-able data, and
//! answers nearest-point queries for the tooltip.
//!
//! Everything here is pure: the presentation layer calls [`update`] on each
//! data or size change and renders the returned model. Nothing is recomputed
//! behind the caller's back.

use crate::format;
use crate::record::ActivityRecord;
use serde::Serialize;

/// Horizontal distance within which a tooltip query snaps to a point
pub const DEFAULT_HIT_TOLERANCE: f64 = 20.0;

/// Fraction of the raw value range added as headroom above and below
pub const RANGE_PAD_RATIO: f64 = 0.2;

/// Substitute range when every value is identical, so points center
/// vertically instead of dividing by zero
const NOMINAL_RANGE: f64 = 1.0;

/// Radius of the circular point markers
pub const MARKER_RADIUS: f64 = 4.0;

/// Number of y-axis tick labels
pub const Y_AXIS_STEPS: usize = 5;

// ============================================================================
// Geometry types
// ============================================================================

/// Rendering surface size
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

/// Inset between the surface edge and the plotted points
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Padding {
    pub horizontal: f64,
    pub vertical: f64,
}

impl Default for Padding {
    fn default() -> Self {
        Self {
            horizontal: 20.0,
            vertical: 20.0,
        }
    }
}

/// One projected point in surface coordinates
///
/// Point `i` pairs with record `i` of the sorted series it was built from;
/// the two sequences stay index-aligned by construction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChartPoint {
    pub x: f64,
    pub y: f64,
}

/// One drawing instruction; a path is a command sequence
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PathCommand {
    MoveTo(ChartPoint),
    LineTo(ChartPoint),
    /// Cubic segment with two control points
    CurveTo {
        control1: ChartPoint,
        control2: ChartPoint,
        to: ChartPoint,
    },
    Circle {
        center: ChartPoint,
        radius: f64,
    },
    Close,
}

// ============================================================================
// Projection
// ============================================================================

/// Padded value domain of a series, `None` when empty
///
/// A zero raw range is replaced by a nominal one centered on the shared
/// value, so downstream division is always safe.
pub fn value_domain(records: &[ActivityRecord]) -> Option<(f64, f64)> {
    let mut values = records.iter().map(|r| r.value);
    let first = values.next()?;
    let (min, max) = values.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let pad = (max - min) * RANGE_PAD_RATIO;
    let (lo, hi) = (min - pad, max + pad);
    if hi - lo > f64::EPSILON {
        Some((lo, hi))
    } else {
        Some((min - NOMINAL_RANGE / 2.0, min + NOMINAL_RANGE / 2.0))
    }
}

/// Project records onto the surface, one point per record in input order
///
/// Fewer than two records yield an empty vec: a curve needs two points, and
/// callers suppress the chart for the degenerate case rather than special-
/// casing geometry.
pub fn project(records: &[ActivityRecord], bounds: Bounds, padding: Padding) -> Vec<ChartPoint> {
    if records.len() < 2 {
        return Vec::new();
    }
    let (min, max) = match value_domain(records) {
        Some(domain) => domain,
        None => return Vec::new(),
    };
    let range = max - min;

    let n = records.len();
    let inner_width = bounds.width - 2.0 * padding.horizontal;
    let inner_height = bounds.height - 2.0 * padding.vertical;

    records
        .iter()
        .enumerate()
        .map(|(i, rec)| {
            let x = padding.horizontal + inner_width * i as f64 / (n - 1) as f64;
            let normalized = (rec.value - min) / range;
            let y = bounds.height - padding.vertical - inner_height * normalized;
            ChartPoint { x, y }
        })
        .collect()
}

// ============================================================================
// Path construction
// ============================================================================

/// Midpoint control pair for the cubic segment from `prev` to `next`
fn control_points(prev: ChartPoint, next: ChartPoint) -> (ChartPoint, ChartPoint) {
    let mid_x = prev.x + (next.x - prev.x) / 2.0;
    (
        ChartPoint { x: mid_x, y: prev.y },
        ChartPoint { x: mid_x, y: next.y },
    )
}

/// Smooth open curve through the points
pub fn line_path(points: &[ChartPoint]) -> Vec<PathCommand> {
    let mut commands = Vec::with_capacity(points.len());
    for (i, point) in points.iter().enumerate() {
        if i == 0 {
            commands.push(PathCommand::MoveTo(*point));
        } else {
            let (control1, control2) = control_points(points[i - 1], *point);
            commands.push(PathCommand::CurveTo {
                control1,
                control2,
                to: *point,
            });
        }
    }
    commands
}

/// Same curve closed down to the baseline, for the gradient fill
pub fn fill_path(points: &[ChartPoint], bounds: Bounds) -> Vec<PathCommand> {
    let (first, last) = match (points.first(), points.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Vec::new(),
    };

    let mut commands = Vec::with_capacity(points.len() + 3);
    commands.push(PathCommand::MoveTo(ChartPoint {
        x: first.x,
        y: bounds.height,
    }));
    commands.push(PathCommand::LineTo(*first));
    for (i, point) in points.iter().enumerate().skip(1) {
        let (control1, control2) = control_points(points[i - 1], *point);
        commands.push(PathCommand::CurveTo {
            control1,
            control2,
            to: *point,
        });
    }
    commands.push(PathCommand::LineTo(ChartPoint {
        x: last.x,
        y: bounds.height,
    }));
    commands.push(PathCommand::Close);
    commands
}

/// One circular marker per point
pub fn marker_path(points: &[ChartPoint]) -> Vec<PathCommand> {
    points
        .iter()
        .map(|p| PathCommand::Circle {
            center: *p,
            radius: MARKER_RADIUS,
        })
        .collect()
}

// ============================================================================
// Reveal animation
// ============================================================================

/// One linearly interpolated property transition
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Transition {
    pub from: f64,
    pub to: f64,
    /// Seconds after the timeline starts before this transition begins
    pub delay: f64,
    pub duration: f64,
}

impl Transition {
    /// Sample the transition `elapsed` seconds into the timeline
    pub fn value_at(&self, elapsed: f64) -> f64 {
        if elapsed <= self.delay {
            return self.from;
        }
        let t = ((elapsed - self.delay) / self.duration).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }

    pub fn is_complete(&self, elapsed: f64) -> bool {
        elapsed >= self.delay + self.duration
    }
}

/// The chart's three independently timed reveal transitions
///
/// Stroke and fill reveal together over the first second; the markers fade
/// in on a delay so they finish after the line has fully drawn.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RevealTimeline {
    pub stroke: Transition,
    pub fill: Transition,
    pub markers: Transition,
}

/// Snapshot of the three animated properties at one instant
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RevealSample {
    pub stroke_end: f64,
    pub fill_opacity: f64,
    pub marker_opacity: f64,
}

impl Default for RevealTimeline {
    fn default() -> Self {
        Self {
            stroke: Transition { from: 0.0, to: 1.0, delay: 0.0, duration: 1.0 },
            fill: Transition { from: 0.0, to: 1.0, delay: 0.0, duration: 1.0 },
            markers: Transition { from: 0.0, to: 1.0, delay: 0.5, duration: 1.0 },
        }
    }
}

impl RevealTimeline {
    pub fn sample(&self, elapsed: f64) -> RevealSample {
        RevealSample {
            stroke_end: self.stroke.value_at(elapsed),
            fill_opacity: self.fill.value_at(elapsed),
            marker_opacity: self.markers.value_at(elapsed),
        }
    }

    pub fn is_complete(&self, elapsed: f64) -> bool {
        self.stroke.is_complete(elapsed)
            && self.fill.is_complete(elapsed)
            && self.markers.is_complete(elapsed)
    }
}

// ============================================================================
// Axis labels
// ============================================================================

/// One tick label at a relative position along its axis (0.0–1.0)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AxisLabel {
    pub text: String,
    pub position: f64,
}

/// Y-axis labels from the padded domain, bottom (position 0.0) to top
pub fn y_axis_labels(domain: (f64, f64), unit: &str) -> Vec<AxisLabel> {
    let (min, max) = domain;
    let step = (max - min) / (Y_AXIS_STEPS - 1) as f64;
    (0..Y_AXIS_STEPS)
        .map(|i| AxisLabel {
            text: format::axis_value_label(min + step * i as f64, unit),
            position: i as f64 / (Y_AXIS_STEPS - 1) as f64,
        })
        .collect()
}

/// X-axis labels, one short date per point
pub fn x_axis_labels(records: &[ActivityRecord]) -> Vec<AxisLabel> {
    let n = records.len();
    if n < 2 {
        return Vec::new();
    }
    records
        .iter()
        .enumerate()
        .map(|(i, rec)| AxisLabel {
            text: format::short_date(&rec.timestamp),
            position: i as f64 / (n - 1) as f64,
        })
        .collect()
}

// ============================================================================
// Render model
// ============================================================================

/// Everything the presentation layer needs to draw one chart
///
/// Rebuilt wholesale by [`update`] on every data or size change; never
/// mutated in place.
#[derive(Debug, Clone, Serialize)]
pub struct RenderModel {
    pub points: Vec<ChartPoint>,
    pub line: Vec<PathCommand>,
    pub fill: Vec<PathCommand>,
    pub markers: Vec<PathCommand>,
    pub y_axis: Vec<AxisLabel>,
    pub x_axis: Vec<AxisLabel>,
    pub timeline: RevealTimeline,
}

impl RenderModel {
    /// True when there is nothing to draw and the chart should be hidden
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Build the full render model for a sorted series
///
/// Degenerate inputs (0 or 1 records) produce empty geometry, not errors.
pub fn update(
    records: &[ActivityRecord],
    bounds: Bounds,
    padding: Padding,
    unit: &str,
) -> RenderModel {
    let points = project(records, bounds, padding);
    if points.is_empty() {
        return RenderModel {
            points,
            line: Vec::new(),
            fill: Vec::new(),
            markers: Vec::new(),
            y_axis: Vec::new(),
            x_axis: Vec::new(),
            timeline: RevealTimeline::default(),
        };
    }

    // value_domain is Some whenever projection produced points
    let domain = value_domain(records).unwrap_or((0.0, 1.0));

    RenderModel {
        line: line_path(&points),
        fill: fill_path(&points, bounds),
        markers: marker_path(&points),
        y_axis: y_axis_labels(domain, unit),
        x_axis: x_axis_labels(records),
        timeline: RevealTimeline::default(),
        points,
    }
}

// ============================================================================
// Nearest-point locator
// ============================================================================

/// A tooltip hit: the matched point and its index-aligned source record
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit<'a> {
    pub index: usize,
    pub point: &'a ChartPoint,
    pub record: &'a ActivityRecord,
}

/// Find the point nearest to a horizontal query position
///
/// Linear scan over horizontal distance; a hit requires the minimum to be
/// within `tolerance`. Ties go to the later (more recent) point. `records`
/// must be the sorted series `points` was projected from. Invoked on every
/// drag movement, so it allocates nothing and mutates nothing.
pub fn locate<'a>(
    query_x: f64,
    points: &'a [ChartPoint],
    records: &'a [ActivityRecord],
    tolerance: f64,
) -> Option<Hit<'a>> {
    debug_assert_eq!(points.len(), records.len());

    let mut nearest: Option<(usize, f64)> = None;
    for (index, point) in points.iter().enumerate() {
        let distance = (point.x - query_x).abs();
        match nearest {
            Some((_, best)) if distance > best => {}
            _ => nearest = Some((index, distance)),
        }
    }

    let (index, distance) = nearest?;
    if distance <= tolerance {
        Some(Hit {
            index,
            point: &points[index],
            record: records.get(index)?,
        })
    } else {
        None
    }
}
