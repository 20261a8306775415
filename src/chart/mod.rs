//! Pressure-over-time chart rendering.
//!
//! Waypoints come in as parallel, possibly gappy series. Pairs with a
//! missing member are dropped, the rest are drawn in the order given onto
//! an in-memory bitmap that is PNG-encoded once the drawing area has been
//! released.

mod glyphs;

use std::io::Cursor;
use std::ops::Range;

use base64::{engine::general_purpose::STANDARD, Engine};
use image::{ImageFormat, RgbImage};
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::{FontDesc, FontFamily, FontStyle};
use plotters_backend::DrawingBackend;
use thiserror::Error;

use glyphs::{text_extent, GlyphBackend};

/// Output size in pixels.
pub const CHART_SIZE: (u32, u32) = (600, 600);
/// The time axis always reaches at least this many minutes.
pub const MIN_TIME_AXIS: f64 = 40.0;

const DARK_GREEN: RGBColor = RGBColor(0, 100, 0);
const TITLE_SIZE: f64 = 24.0;
const AXIS_DESC_SIZE: f64 = 15.0;
const ANNOTATION_SIZE: f64 = 18.0;

/// Chart rendering errors.
#[derive(Debug, Error)]
pub enum ChartError {
    #[error("No valid data to plot.")]
    NoPlottableData,
    #[error("Chart axis range is not finite.")]
    UnboundedAxis,
    #[error("chart rendering failed: {0}")]
    Render(String),
    #[error("chart encoding failed: {0}")]
    Encode(String),
}

/// Plottable points with the axis window they are shown in.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartData {
    /// (minutes, psi) in caller order
    pub points: Vec<(f64, f64)>,
    pub x_range: Range<f64>,
    pub y_range: Range<f64>,
}

impl ChartData {
    /// Pair up `times` and `pressures`, skipping pairs with an absent or
    /// non-finite member, and work out the axis bounds.
    pub fn from_series(
        times: &[Option<f64>],
        pressures: &[Option<f64>],
    ) -> Result<Self, ChartError> {
        let points: Vec<(f64, f64)> = times
            .iter()
            .zip(pressures)
            .filter_map(|(t, p)| Some(((*t)?, (*p)?)))
            .filter(|(t, p)| t.is_finite() && p.is_finite())
            .collect();

        if points.is_empty() {
            return Err(ChartError::NoPlottableData);
        }

        let (min_t, max_t) = extremes(points.iter().map(|p| p.0));
        let (min_p, max_p) = extremes(points.iter().map(|p| p.1));

        let x_range = axis_range(min_t, max_t, 0.05, 0.05, MIN_TIME_AXIS);
        let y_range = axis_range(min_p, max_p, 0.05, 0.10, f64::NEG_INFINITY);

        // Padding near f64::MAX overflows, and plotters never finishes a
        // mesh over an infinite range.
        let bounds = [x_range.start, x_range.end, y_range.start, y_range.end];
        if !bounds.iter().all(|b| b.is_finite()) {
            return Err(ChartError::UnboundedAxis);
        }

        Ok(ChartData {
            points,
            x_range,
            y_range,
        })
    }
}

fn extremes(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// Axis window: anchored at zero for non-negative data, otherwise padded
/// below by `lower_pad` of the span; padded above by `upper_pad` of the
/// span and never ending before `min_upper`.
fn axis_range(min: f64, max: f64, lower_pad: f64, upper_pad: f64, min_upper: f64) -> Range<f64> {
    let span = max - min;
    let lower = if min >= 0.0 { 0.0 } else { min - span * lower_pad };
    let mut upper = (max + span * upper_pad).max(min_upper);
    if upper <= lower {
        upper = lower + 1.0;
    }
    lower..upper
}

/// Render the chart as PNG bytes.
pub fn render_png(data: &ChartData) -> Result<Vec<u8>, ChartError> {
    let (width, height) = CHART_SIZE;
    let mut pixels = vec![0u8; width as usize * height as usize * 3];

    // The drawing area borrows `pixels` and is dropped at the end of this
    // block, whether or not drawing succeeded.
    {
        let root = GlyphBackend::new(BitMapBackend::with_buffer(&mut pixels, CHART_SIZE))
            .into_drawing_area();
        draw_chart(&root, data).map_err(|e| ChartError::Render(format!("{e:#}")))?;
    }

    let image = RgbImage::from_raw(width, height, pixels)
        .ok_or_else(|| ChartError::Encode("pixel buffer does not match chart size".to_string()))?;
    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|e| ChartError::Encode(e.to_string()))?;

    Ok(png.into_inner())
}

/// Filter the series, render it, and return the PNG as standard base64.
pub fn render_base64_png(
    times: &[Option<f64>],
    pressures: &[Option<f64>],
) -> Result<String, ChartError> {
    let data = ChartData::from_series(times, pressures)?;
    let png = render_png(&data)?;
    tracing::debug!(
        points = data.points.len(),
        bytes = png.len(),
        "Rendered pressure chart"
    );
    Ok(STANDARD.encode(png))
}

fn draw_chart<DB>(root: &DrawingArea<DB, Shift>, data: &ChartData) -> anyhow::Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(root)
        .caption(
            "Pressure Over Time",
            FontDesc::new(FontFamily::SansSerif, TITLE_SIZE, FontStyle::Normal),
        )
        .margin(20)
        .x_label_area_size(45)
        .y_label_area_size(70)
        .build_cartesian_2d(data.x_range.clone(), data.y_range.clone())?;

    chart
        .configure_mesh()
        .x_desc("Time (minutes)")
        .y_desc("Pressure (PSI)")
        .axis_desc_style(FontDesc::new(
            FontFamily::SansSerif,
            AXIS_DESC_SIZE,
            FontStyle::Normal,
        ))
        .x_label_formatter(&|v| format!("{:.0}", v))
        .y_label_formatter(&|v| format!("{:.0}", v))
        .draw()?;

    chart
        .draw_series(LineSeries::new(data.points.iter().copied(), &BLUE))?
        .label("Pressure vs Time")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));

    let label_font = FontDesc::new(FontFamily::SansSerif, ANNOTATION_SIZE, FontStyle::Bold);
    chart.draw_series(data.points.iter().map(|&(t, p)| {
        let label = format!("{:.0} PSI", p);
        let (w, h) = text_extent(&label, ANNOTATION_SIZE);
        // Zero sits on the time axis, so its label is lifted further.
        let lift = if p == 0.0 { 15 } else { 10 };
        let top = -lift - h;

        EmptyElement::at((t, p))
            + Circle::new((0, 0), 4, RED.filled())
            + Rectangle::new([(7, top - 3), (13 + w, -lift + 3)], YELLOW.mix(0.7).filled())
            + Rectangle::new([(7, top - 3), (13 + w, -lift + 3)], DARK_GREEN.stroke_width(1))
            + Text::new(label, (10, top), label_font.color(&DARK_GREEN))
    }))?;

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .position(SeriesLabelPosition::UpperRight)
        .draw()?;

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_pairs_are_dropped() {
        let data = ChartData::from_series(
            &[Some(0.0), Some(10.0), Some(20.0)],
            &[Some(3000.0), None, Some(1500.0)],
        )
        .unwrap();

        assert_eq!(data.points, vec![(0.0, 3000.0), (20.0, 1500.0)]);
        assert!(data.x_range.end >= MIN_TIME_AXIS);
    }

    #[test]
    fn test_absent_time_drops_pair() {
        let data = ChartData::from_series(
            &[Some(0.0), None, Some(20.0)],
            &[Some(3000.0), Some(2000.0), Some(1500.0)],
        )
        .unwrap();
        assert_eq!(data.points.len(), 2);
    }

    #[test]
    fn test_order_is_preserved() {
        let data = ChartData::from_series(
            &[Some(30.0), Some(5.0), Some(50.0)],
            &[Some(1000.0), Some(3000.0), Some(500.0)],
        )
        .unwrap();
        assert_eq!(data.points, vec![(30.0, 1000.0), (5.0, 3000.0), (50.0, 500.0)]);
    }

    #[test]
    fn test_no_plottable_data() {
        let result = ChartData::from_series(&[Some(0.0), None], &[None, Some(3000.0)]);
        assert!(matches!(result, Err(ChartError::NoPlottableData)));

        let result = ChartData::from_series(&[], &[]);
        assert!(matches!(result, Err(ChartError::NoPlottableData)));

        let result = render_base64_png(&[Some(f64::NAN)], &[Some(100.0)]);
        assert!(matches!(result, Err(ChartError::NoPlottableData)));
    }

    #[test]
    fn test_overflowing_axis_is_rejected() {
        let result =
            ChartData::from_series(&[Some(0.0), Some(10.0)], &[Some(1.7e308), Some(500.0)]);
        assert!(matches!(result, Err(ChartError::UnboundedAxis)));

        let result = render_base64_png(&[Some(-1.7e308), Some(1.7e308)], &[Some(1.0), Some(2.0)]);
        assert!(matches!(result, Err(ChartError::UnboundedAxis)));
    }

    #[test]
    fn test_long_dive_pads_time_axis() {
        let data = ChartData::from_series(
            &[Some(0.0), Some(100.0)],
            &[Some(3000.0), Some(500.0)],
        )
        .unwrap();

        assert_eq!(data.x_range.start, 0.0);
        assert_eq!(data.x_range.end, 105.0);
        assert_eq!(data.y_range.start, 0.0);
        assert_eq!(data.y_range.end, 3250.0);
    }

    #[test]
    fn test_negative_values_pad_below() {
        let data = ChartData::from_series(
            &[Some(-10.0), Some(90.0)],
            &[Some(-100.0), Some(900.0)],
        )
        .unwrap();

        assert_eq!(data.x_range.start, -15.0);
        assert_eq!(data.x_range.end, 95.0);
        assert_eq!(data.y_range.start, -150.0);
        assert_eq!(data.y_range.end, 1000.0);
    }

    #[test]
    fn test_single_zero_point_has_usable_range() {
        let data = ChartData::from_series(&[Some(0.0)], &[Some(0.0)]).unwrap();
        assert_eq!(data.x_range, 0.0..MIN_TIME_AXIS);
        assert_eq!(data.y_range, 0.0..1.0);
    }

    #[test]
    fn test_render_png() {
        let data = ChartData::from_series(
            &[Some(0.0), Some(3.0), Some(82.0), Some(89.0), Some(165.0)],
            &[Some(3400.0), None, Some(1950.0), None, Some(500.0)],
        )
        .unwrap();

        let png = render_png(&data).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");

        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        assert_eq!(decoded.dimensions(), CHART_SIZE);
        assert!(decoded.pixels().any(|px| px.0 == [255, 0, 0]));
    }

    #[test]
    fn test_zero_pressure_renders() {
        let png = render_base64_png(&[Some(0.0), Some(20.0)], &[Some(200.0), Some(0.0)]).unwrap();
        assert!(!png.is_empty());
        assert!(STANDARD.decode(png).unwrap().starts_with(b"\x89PNG"));
    }
}
