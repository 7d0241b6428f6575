//! SVG availability chart rendering

use crate::errors::{GraphError, Result};
use crate::series::SeriesPoint;

pub const WIDTH: f64 = 360.0;
pub const HEIGHT: f64 = 140.0;
pub const PADDING: f64 = 24.0;
pub const CHART_WIDTH: f64 = WIDTH - PADDING * 2.0;
pub const CHART_HEIGHT: f64 = HEIGHT - PADDING * 2.0;

const FONT_FAMILY: &str = "'Segoe UI',sans-serif";
const LINE_COLOR: &str = "#6ea8ff";

/// (offset, color, opacity) from the top of the chart to the bottom
const GRADIENT_STOPS: [(f64, &str, f64); 2] = [(0.0, "#24ddb6", 0.35), (1.0, "#4f63ff", 0.05)];

/// Output file name for a service's chart.
pub fn artifact_file_name(prefix: &str, slug: &str) -> String {
    format!("{}-{}.svg", prefix, slug)
}

/// Id of the area gradient; derived from the slug so inlined charts never clash.
pub fn gradient_id(slug: &str) -> String {
    format!("gradient-{}", slug)
}

/// Headline text for the most recent point.
pub fn headline_label(point: &SeriesPoint) -> String {
    format!("{}% avg availability", fixed2(point.uptime_ratio * 100.0))
}

/// Two-decimal fixed notation with exact ties rounded away from zero.
///
/// `{:.2}` rounds ties to even, which would print 38.625 as `38.62`.
pub fn fixed2(value: f64) -> String {
    if !value.is_finite() {
        return format!("{}", value);
    }

    // Every finite f64 in chart range has an exact decimal expansion well
    // within 64 fractional digits.
    let exact = format!("{:.64}", value.abs());
    let Some((whole, frac)) = exact.split_once('.') else {
        return format!("{:.2}", value);
    };
    let Ok(mut cents) = format!("{}{}", whole, &frac[..2]).parse::<u128>() else {
        return format!("{:.2}", value);
    };
    if frac.as_bytes()[2] >= b'5' {
        cents += 1;
    }

    let sign = if value < 0.0 && cents > 0 { "-" } else { "" };
    format!("{}{}.{:02}", sign, cents / 100, cents % 100)
}

fn point_x(index: usize, len: usize) -> f64 {
    if len < 2 {
        return PADDING;
    }
    PADDING + (CHART_WIDTH * index as f64) / (len - 1) as f64
}

fn point_y(uptime_ratio: f64) -> f64 {
    PADDING + (1.0 - uptime_ratio) * CHART_HEIGHT
}

pub fn xml_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Render a service's series as a self-contained SVG document.
///
/// The output depends only on the arguments, so regenerating from the same
/// snapshot yields byte-identical files.
pub fn render_chart(name: &str, slug: &str, series: &[SeriesPoint]) -> Result<String> {
    let last_point = series.last().ok_or(GraphError::EmptySeries)?;
    let len = series.len();

    let gradient = xml_escape(&gradient_id(slug));
    let stops: String = GRADIENT_STOPS
        .iter()
        .map(|(offset, color, opacity)| {
            format!(
                r#"<stop offset="{}%" stop-color="{}" stop-opacity="{}" />"#,
                offset * 100.0,
                color,
                opacity
            )
        })
        .collect();

    let mut svg = String::new();
    svg.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    svg.push_str(&format!(
        "<svg width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\" fill=\"none\" xmlns=\"http://www.w3.org/2000/svg\">\n",
        w = WIDTH,
        h = HEIGHT
    ));
    svg.push_str("  <defs>\n");
    svg.push_str(&format!(
        "    <linearGradient id=\"{}\" x1=\"0%\" y1=\"0%\" x2=\"0%\" y2=\"100%\">\n",
        gradient
    ));
    svg.push_str(&format!("      {}\n", stops));
    svg.push_str("    </linearGradient>\n");
    svg.push_str("  </defs>\n");
    svg.push_str(&format!(
        "  <rect width=\"{}\" height=\"{}\" rx=\"18\" fill=\"#0a0f1c\" stroke=\"#1f2a44\" stroke-width=\"2\" />\n",
        WIDTH, HEIGHT
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"32\" fill=\"#9fd1ff\" font-family=\"{}\" font-size=\"14\" font-weight=\"500\">{}</text>\n",
        PADDING,
        FONT_FAMILY,
        xml_escape(name)
    ));
    svg.push_str(&format!(
        "  <text x=\"{}\" y=\"52\" fill=\"#ffffff\" font-family=\"{}\" font-size=\"20\" font-weight=\"600\">{}</text>\n",
        PADDING,
        FONT_FAMILY,
        headline_label(last_point)
    ));

    // A single point has no horizontal extent: marker only.
    if len > 1 {
        let points = series
            .iter()
            .enumerate()
            .map(|(index, point)| {
                format!(
                    "{},{}",
                    fixed2(point_x(index, len)),
                    fixed2(point_y(point.uptime_ratio))
                )
            })
            .collect::<Vec<_>>()
            .join(" ");

        let baseline = HEIGHT - PADDING;
        let area_path = format!(
            "M {} L {},{} L {},{} Z",
            points,
            PADDING + CHART_WIDTH,
            baseline,
            PADDING,
            baseline
        );

        svg.push_str(&format!(
            "  <polyline points=\"{}\" fill=\"none\" stroke=\"{}\" stroke-width=\"3\" stroke-linecap=\"round\" stroke-linejoin=\"round\" />\n",
            points, LINE_COLOR
        ));
        svg.push_str(&format!(
            "  <path d=\"{}\" fill=\"url(#{})\" stroke=\"none\" />\n",
            area_path, gradient
        ));
    }

    svg.push_str(&format!(
        "  <circle cx=\"{}\" cy=\"{}\" r=\"5\" fill=\"#ffffff\" stroke=\"{}\" stroke-width=\"3\" />\n",
        fixed2(point_x(len - 1, len)),
        fixed2(point_y(last_point.uptime_ratio)),
        LINE_COLOR
    ));
    svg.push_str("</svg>");

    Ok(svg)
}
