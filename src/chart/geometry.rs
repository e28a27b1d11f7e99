//! Pyramid chart geometry.
//!
//! [`pyramid`] turns an optional "top X%" value into a complete, renderer
//! independent description of the chart: the downward triangle, the nine
//! grade bands clipped analytically to the triangle, gridlines, boundary
//! lines with labels and the position marker.

use serde::Serialize;

use crate::analyzers::grade::{GradeLevel9, band_spec, nine_level_from_percentile};

pub const WIDTH: f64 = 320.0;
pub const HEIGHT: f64 = 260.0;
pub const MARGIN_Y: f64 = 20.0;
pub const MARGIN_X: f64 = 30.0;

const LABEL_GAP: f64 = 6.0;
const MARKER_BOX_WIDTH: f64 = 150.0;
const MARKER_BOX_HEIGHT: f64 = 26.0;
const MARKER_BOX_GAP: f64 = 8.0;
const MARKER_TEXT_BASELINE: f64 = 17.0;

pub const NO_DATA_STATUS: &str = "전교 상위 퍼센트 표시를 위해 등수를 입력하세요.";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// Logical drawing area. Renderers may rescale it freely.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Canvas {
    pub width: f64,
    pub height: f64,
    pub top: f64,
    pub bottom: f64,
    pub left: f64,
    pub right: f64,
}

impl Canvas {
    pub fn standard() -> Self {
        Self {
            width: WIDTH,
            height: HEIGHT,
            top: MARGIN_Y,
            bottom: HEIGHT - MARGIN_Y,
            left: MARGIN_X,
            right: WIDTH - MARGIN_X,
        }
    }

    pub fn center_x(&self) -> f64 {
        self.width / 2.0
    }

    pub fn usable_height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Maps a percentage onto the vertical span: 0% at the top, 100% at the
    /// bottom.
    pub fn y_from_pct(&self, pct: f64) -> f64 {
        self.top + (pct / 100.0) * self.usable_height()
    }

    /// Half the triangle's width at height `y`. Zero at the apex, half the
    /// usable width at the base.
    pub fn half_width_at(&self, y: f64) -> f64 {
        let t = ((y - self.top) / self.usable_height()).clamp(0.0, 1.0);
        t * (self.right - self.left) / 2.0
    }

    /// Full-width horizontal line at `y`.
    fn horizontal(&self, y: f64) -> Segment {
        Segment {
            start: Point::new(self.left, y),
            end: Point::new(self.right, y),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub text: String,
    pub at: Point,
    pub anchor: TextAnchor,
}

/// The two alternating band fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Light,
    Lighter,
}

/// One grade band clipped to the triangle interior.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandFill {
    pub grade: u8,
    pub from: u8,
    pub to: u8,
    pub tone: Tone,
    /// Vertices in drawing order. A triangle for the band touching the apex,
    /// a trapezoid otherwise.
    pub polygon: Vec<Point>,
}

/// A 10% gridline labelled on the right edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gridline {
    pub percent: u8,
    pub line: Segment,
    pub label: Label,
}

/// Line at a band's upper bound, labelled on the left edge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoundaryLine {
    pub grade: u8,
    pub upper: u8,
    pub line: Segment,
    pub label: Label,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub label: Label,
}

/// Where the student sits on the pyramid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    /// Percentile after clamping to `[0, 100]`.
    pub percentile: f64,
    pub grade: GradeLevel9,
    /// Drawn dashed.
    pub line: Segment,
    pub point: Point,
    pub label_box: LabelBox,
}

/// Full chart description plus the status line shown beside it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PyramidChart {
    pub canvas: Canvas,
    /// Apex, bottom-left, bottom-right.
    pub outline: [Point; 3],
    pub bands: Vec<BandFill>,
    pub gridlines: Vec<Gridline>,
    pub boundaries: Vec<BoundaryLine>,
    pub marker: Option<Marker>,
    pub status: String,
}

impl PyramidChart {
    pub fn has_marker(&self) -> bool {
        self.marker.is_some()
    }
}

fn band_polygon(canvas: &Canvas, y1: f64, y2: f64) -> Vec<Point> {
    let cx = canvas.center_x();
    let top_half = canvas.half_width_at(y1);
    let bottom_half = canvas.half_width_at(y2);

    let mut polygon = Vec::with_capacity(4);
    if top_half > 0.0 {
        polygon.push(Point::new(cx - top_half, y1));
        polygon.push(Point::new(cx + top_half, y1));
    } else {
        polygon.push(Point::new(cx, y1));
    }
    polygon.push(Point::new(cx + bottom_half, y2));
    polygon.push(Point::new(cx - bottom_half, y2));
    polygon
}

fn marker(canvas: &Canvas, percentile: f64) -> Option<Marker> {
    let grade = nine_level_from_percentile(percentile)?;
    let y = canvas.y_from_pct(percentile);
    let cx = canvas.center_x();

    // Sit just above the line, but never above the top margin.
    let box_y = (y - MARKER_BOX_HEIGHT - MARKER_BOX_GAP).max(canvas.top);

    Some(Marker {
        percentile,
        grade,
        line: canvas.horizontal(y),
        point: Point::new(cx, y),
        label_box: LabelBox {
            x: cx - MARKER_BOX_WIDTH / 2.0,
            y: box_y,
            width: MARKER_BOX_WIDTH,
            height: MARKER_BOX_HEIGHT,
            label: Label {
                text: format!("상위 {percentile:.2}% · {grade}"),
                at: Point::new(cx, box_y + MARKER_TEXT_BASELINE),
                anchor: TextAnchor::Middle,
            },
        },
    })
}

/// Builds the chart for an optional percentile.
///
/// Non-finite input is treated as absent. A present value is clamped to
/// `[0, 100]` before it is placed. Without a value the chart has no marker
/// and the status line asks for ranks.
pub fn pyramid(percentile: Option<f64>) -> PyramidChart {
    let canvas = Canvas::standard();
    let cx = canvas.center_x();

    let bands = band_spec()
        .into_iter()
        .enumerate()
        .map(|(idx, band)| {
            let y1 = canvas.y_from_pct(f64::from(band.from));
            let y2 = canvas.y_from_pct(f64::from(band.to)).max(y1);
            BandFill {
                grade: band.grade,
                from: band.from,
                to: band.to,
                tone: if idx % 2 == 0 { Tone::Light } else { Tone::Lighter },
                polygon: band_polygon(&canvas, y1, y2),
            }
        })
        .collect();

    let gridlines = (0..=10u8)
        .map(|i| {
            let percent = i * 10;
            let y = canvas.y_from_pct(f64::from(percent));
            Gridline {
                percent,
                line: canvas.horizontal(y),
                label: Label {
                    text: format!("{percent}%"),
                    at: Point::new(canvas.right + LABEL_GAP, y + 3.0),
                    anchor: TextAnchor::Start,
                },
            }
        })
        .collect();

    let boundaries = band_spec()
        .into_iter()
        .map(|band| {
            let y = canvas.y_from_pct(f64::from(band.to));
            BoundaryLine {
                grade: band.grade,
                upper: band.to,
                line: canvas.horizontal(y),
                label: Label {
                    text: format!("{}등급 {}%", band.grade, band.to),
                    at: Point::new(canvas.left - LABEL_GAP, y - 2.0),
                    anchor: TextAnchor::End,
                },
            }
        })
        .collect();

    let clamped = percentile
        .filter(|p| p.is_finite())
        .map(|p| p.clamp(0.0, 100.0));

    let status = match clamped {
        Some(p) => format!("전교 상위 {p:.2}%"),
        None => NO_DATA_STATUS.to_string(),
    };

    PyramidChart {
        outline: [
            Point::new(cx, canvas.top),
            Point::new(canvas.left, canvas.bottom),
            Point::new(canvas.right, canvas.bottom),
        ],
        bands,
        gridlines,
        boundaries,
        marker: clamped.and_then(|p| marker(&canvas, p)),
        status,
        canvas,
    }
}
