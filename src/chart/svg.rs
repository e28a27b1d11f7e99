use std::fmt::Write;

use crate::chart::geometry::{Label, Point, PyramidChart, TextAnchor, Tone};

const BAND_LIGHT: &str = "#f4f8ff";
const BAND_LIGHTER: &str = "#eef4ff";
const GRIDLINE: &str = "#eef2ff";
const GRIDLINE_TEXT: &str = "#90a0bf";
const BOUNDARY: &str = "#d8e4ff";
const BOUNDARY_TEXT: &str = "#5b6b8b";
const MARKER: &str = "#ff6b6b";
const MARKER_BOX: &str = "#111827";

fn points(polygon: &[Point]) -> String {
    polygon
        .iter()
        .map(|p| format!("{:.2},{:.2}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(" ")
}

fn anchor(anchor: TextAnchor) -> &'static str {
    match anchor {
        TextAnchor::Start => "start",
        TextAnchor::Middle => "middle",
        TextAnchor::End => "end",
    }
}

fn text(out: &mut String, label: &Label, attrs: &str) {
    let _ = writeln!(
        out,
        r#"  <text x="{:.2}" y="{:.2}" text-anchor="{}" {attrs}>{}</text>"#,
        label.at.x,
        label.at.y,
        anchor(label.anchor),
        escape(&label.text),
    );
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Renders a [`PyramidChart`] as a standalone SVG document.
///
/// Bands are drawn from their analytic polygons, so no clip path is needed.
pub fn render_svg(chart: &PyramidChart) -> String {
    let canvas = &chart.canvas;
    let mut out = String::new();

    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" role="img" aria-label="피라미드 그래프">"#,
        canvas.width, canvas.height
    );
    out.push_str(concat!(
        "  <defs>\n",
        r#"    <linearGradient id="pyrEdge" x1="0" x2="0" y1="0" y2="1">"#,
        "\n",
        r##"      <stop offset="0%" stop-color="#cfe0ff"/>"##,
        "\n",
        r##"      <stop offset="100%" stop-color="#eaf1ff"/>"##,
        "\n    </linearGradient>\n  </defs>\n",
    ));

    for band in &chart.bands {
        let fill = match band.tone {
            Tone::Light => BAND_LIGHT,
            Tone::Lighter => BAND_LIGHTER,
        };
        let _ = writeln!(
            out,
            r#"  <polygon points="{}" fill="{fill}" opacity="0.85"/>"#,
            points(&band.polygon)
        );
    }

    let _ = writeln!(
        out,
        r#"  <polygon points="{}" fill="none" stroke="url(#pyrEdge)" stroke-width="2"/>"#,
        points(&chart.outline)
    );

    for grid in &chart.gridlines {
        let _ = writeln!(
            out,
            r#"  <line x1="{:.2}" x2="{:.2}" y1="{:.2}" y2="{:.2}" stroke="{GRIDLINE}" stroke-width="0.8"/>"#,
            grid.line.start.x, grid.line.end.x, grid.line.start.y, grid.line.end.y
        );
        text(
            &mut out,
            &grid.label,
            &format!(r#"font-size="10" fill="{GRIDLINE_TEXT}""#),
        );
    }

    for boundary in &chart.boundaries {
        let _ = writeln!(
            out,
            r#"  <line x1="{:.2}" x2="{:.2}" y1="{:.2}" y2="{:.2}" stroke="{BOUNDARY}" stroke-width="1"/>"#,
            boundary.line.start.x, boundary.line.end.x, boundary.line.start.y, boundary.line.end.y
        );
        text(
            &mut out,
            &boundary.label,
            &format!(r#"font-size="10" fill="{BOUNDARY_TEXT}""#),
        );
    }

    if let Some(marker) = &chart.marker {
        let _ = writeln!(
            out,
            r#"  <line x1="{:.2}" x2="{:.2}" y1="{:.2}" y2="{:.2}" stroke="{MARKER}" stroke-width="1.6" stroke-dasharray="3,3"/>"#,
            marker.line.start.x, marker.line.end.x, marker.line.start.y, marker.line.end.y
        );
        let _ = writeln!(
            out,
            r#"  <circle cx="{:.2}" cy="{:.2}" r="3" fill="{MARKER}"/>"#,
            marker.point.x, marker.point.y
        );
        let b = &marker.label_box;
        let _ = writeln!(
            out,
            r#"  <rect x="{:.2}" y="{:.2}" rx="12" ry="12" width="{}" height="{}" fill="{MARKER_BOX}" opacity="0.9"/>"#,
            b.x, b.y, b.width, b.height
        );
        text(
            &mut out,
            &b.label,
            r##"font-size="12" fill="#ffffff" font-weight="700""##,
        );
    }

    out.push_str("</svg>\n");
    out
}
