// =============================================================================
// Chart Renderer — price, EMAs and crossover markers as an embeddable PNG
// =============================================================================
//
// Everything is drawn into an in-memory RGB buffer (no temp files), encoded
// as PNG and then base64 so the result can go straight into an <img> tag as
// a data URI. The buffer lives only for the duration of one call.
// =============================================================================

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{Duration, NaiveDate};
use image::{codecs::png::PngEncoder, ColorType, ImageEncoder};
use plotters::prelude::*;
use tracing::debug;

use crate::signals::{SignalFrame, SignalRow};
use crate::types::Ticker;

const ORANGE: RGBColor = RGBColor(255, 165, 0);
const MARKER_SIZE: i32 = 7;

/// Pixel dimensions of the rendered chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChartStyle {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartStyle {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
        }
    }
}

/// A rendered chart: PNG bytes encoded as standard base64.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartImage {
    base64_png: String,
}

impl ChartImage {
    pub fn as_base64(&self) -> &str {
        &self.base64_png
    }

    /// `data:` URI suitable for an `<img src=...>` attribute.
    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.base64_png)
    }
}

/// Chart title for `ticker`.
pub fn chart_title(ticker: &Ticker) -> String {
    format!("{ticker} Stock Price Prediction with EMA Strategy")
}

/// Render the close / EMA-100 / EMA-200 lines and buy/sell markers for
/// `frame` into a base64-encoded PNG.
pub fn render_chart(frame: &SignalFrame, ticker: &Ticker, style: &ChartStyle) -> Result<ChartImage> {
    let rows = frame.rows();
    let (first, last) = match (rows.first(), rows.last()) {
        (Some(f), Some(l)) => (f.date, l.date),
        _ => anyhow::bail!("cannot render an empty series for {ticker}"),
    };
    if style.width == 0 || style.height == 0 {
        anyhow::bail!("invalid chart size {}x{}", style.width, style.height);
    }

    let (x_range, y_range) = axis_ranges(frame, first, last);
    let mut buffer = vec![0u8; style.width as usize * style.height as usize * 3];

    {
        let root = BitMapBackend::with_buffer(&mut buffer, (style.width, style.height))
            .into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| anyhow::anyhow!("failed to fill canvas: {e}"))?;

        let mut chart = ChartBuilder::on(&root)
            .caption(chart_title(ticker), ("sans-serif", 28).into_font())
            .margin(15)
            .x_label_area_size(45)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range, y_range)
            .map_err(|e| anyhow::anyhow!("failed to build chart: {e}"))?;

        chart
            .configure_mesh()
            .x_desc("Date")
            .y_desc("Price")
            .x_labels(8)
            .x_label_formatter(&|d: &NaiveDate| d.format("%Y-%m").to_string())
            .draw()
            .map_err(|e| anyhow::anyhow!("failed to draw mesh: {e}"))?;

        let lines: [(&str, RGBColor, fn(&SignalRow) -> f64); 3] = [
            ("Actual Price", BLUE, |r: &SignalRow| r.close),
            ("100 EMA", ORANGE, |r: &SignalRow| r.ema_100),
            ("200 EMA", RED, |r: &SignalRow| r.ema_200),
        ];
        for (label, color, value) in lines {
            chart
                .draw_series(LineSeries::new(
                    rows.iter().map(|r| (r.date, value(r))),
                    color.stroke_width(2),
                ))
                .map_err(|e| anyhow::anyhow!("failed to draw {label} line: {e}"))?
                .label(label)
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
        }

        chart
            .draw_series(
                frame
                    .buy_points()
                    .map(|r| TriangleMarker::new((r.date, r.close), MARKER_SIZE, GREEN.filled())),
            )
            .map_err(|e| anyhow::anyhow!("failed to draw buy markers: {e}"))?
            .label("Buy Signal")
            .legend(|(x, y)| TriangleMarker::new((x + 10, y), MARKER_SIZE, GREEN.filled()));

        chart
            .draw_series(frame.sell_points().map(|r| {
                EmptyElement::at((r.date, r.close))
                    + Polygon::new(down_triangle((0, 0), MARKER_SIZE), RED.filled())
            }))
            .map_err(|e| anyhow::anyhow!("failed to draw sell markers: {e}"))?
            .label("Sell Signal")
            .legend(|(x, y)| Polygon::new(down_triangle((x + 10, y), MARKER_SIZE), RED.filled()));

        chart
            .configure_series_labels()
            .position(SeriesLabelPosition::UpperLeft)
            .background_style(WHITE.mix(0.85))
            .border_style(BLACK)
            .draw()
            .map_err(|e| anyhow::anyhow!("failed to draw legend: {e}"))?;

        root.present()
            .map_err(|e| anyhow::anyhow!("failed to render chart: {e}"))?;
    }

    let png = encode_png(&buffer, style.width, style.height)?;
    drop(buffer);

    debug!(
        ticker = %ticker,
        rows = rows.len(),
        png_bytes = png.len(),
        "chart rendered"
    );

    Ok(ChartImage {
        base64_png: BASE64.encode(png),
    })
}

/// Vertices of a downward-pointing triangle centred on `center`.
fn down_triangle(center: (i32, i32), size: i32) -> Vec<(i32, i32)> {
    let (x, y) = center;
    vec![(x - size, y - size), (x + size, y - size), (x, y + size)]
}

/// Date and price axis ranges with padding.
///
/// A single-day series gets one extra day so the date axis is not empty; a
/// flat series gets a price band around its value.
fn axis_ranges(
    frame: &SignalFrame,
    first: NaiveDate,
    last: NaiveDate,
) -> (std::ops::Range<NaiveDate>, std::ops::Range<f64>) {
    let x_end = if last > first { last } else { first + Duration::days(1) };

    let (lo, hi) = frame
        .rows()
        .iter()
        .flat_map(|r| [r.close, r.ema_100, r.ema_200])
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let span = hi - lo;
    let pad = if span > f64::EPSILON * hi.abs().max(1.0) {
        span * 0.05
    } else {
        (hi.abs() * 0.05).max(1.0)
    };

    (first..x_end, (lo - pad).max(0.0)..hi + pad)
}

fn encode_png(rgb: &[u8], width: u32, height: u32) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    PngEncoder::new(&mut png)
        .write_image(rgb, width, height, ColorType::Rgb8)
        .context("failed to encode chart as PNG")?;
    Ok(png)
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::{PriceBar, PriceSeries};
    use crate::signals::calculate_signals;

    const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn frame(closes: &[f64]) -> SignalFrame {
        let start = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
        let bars = closes
            .iter()
            .enumerate()
            .map(|(i, &c)| PriceBar::close_only(start + Duration::days(i as i64), c))
            .collect();
        calculate_signals(&PriceSeries::new("TEST", bars).unwrap())
    }

    fn small() -> ChartStyle {
        ChartStyle {
            width: 400,
            height: 240,
        }
    }

    #[test]
    fn title_contains_ticker() {
        assert_eq!(
            chart_title(&Ticker::normalize("msft")),
            "MSFT Stock Price Prediction with EMA Strategy"
        );
    }

    #[test]
    fn renders_png_with_markers() {
        let frame = rally_then_decline();
        assert!(frame.buy_points().count() > 0 && frame.sell_points().count() > 0);

        let image = render_chart(&frame, &Ticker::normalize("aapl"), &small()).unwrap();
        let png = BASE64.decode(image.as_base64()).unwrap();
        assert_eq!(&png[..8], &PNG_SIGNATURE);
        assert!(image.data_uri().starts_with("data:image/png;base64,iVBOR"));
    }

    /// Count pixels of exactly `rgb` in a base64 PNG.
    fn count_pixels(chart: &ChartImage, rgb: [u8; 3]) -> usize {
        let png = BASE64.decode(chart.as_base64()).unwrap();
        let decoded = image::load_from_memory(&png).unwrap().to_rgb8();
        decoded.pixels().filter(|p| p.0 == rgb).count()
    }

    const PURE_GREEN: [u8; 3] = [0, 255, 0];
    const PURE_RED: [u8; 3] = [255, 0, 0];

    fn rally_then_decline() -> SignalFrame {
        let mut closes: Vec<f64> = (0..200).map(|i| 100.0 + i as f64).collect();
        closes.extend((0..140).map(|i| 300.0 - 2.0 * i as f64));
        frame(&closes)
    }

    #[test]
    fn buy_and_sell_markers_are_drawn() {
        let marked = rally_then_decline();
        assert_eq!(marked.buy_points().count(), 1);
        assert_eq!(marked.sell_points().count(), 1);
        let unmarked = marked.without_markers();

        let style = ChartStyle::default();
        let ticker = Ticker::normalize("aapl");
        let with = render_chart(&marked, &ticker, &style).unwrap();
        let without = render_chart(&unmarked, &ticker, &style).unwrap();

        assert!(count_pixels(&with, PURE_GREEN) > count_pixels(&without, PURE_GREEN));
        assert!(count_pixels(&with, PURE_RED) > count_pixels(&without, PURE_RED));
    }

    #[test]
    fn legend_swatches_are_drawn_without_signals() {
        let style = ChartStyle::default();
        let flat = frame(&[100.0; 50]);
        assert_eq!(flat.buy_points().count() + flat.sell_points().count(), 0);

        let flat_img = render_chart(&flat, &Ticker::normalize("flat"), &style).unwrap();
        let signal_img =
            render_chart(&rally_then_decline(), &Ticker::normalize("aapl"), &style).unwrap();

        let flat_green = count_pixels(&flat_img, PURE_GREEN);
        assert!(flat_green > 0);
        assert!(count_pixels(&signal_img, PURE_GREEN) > flat_green);
        assert!(count_pixels(&flat_img, PURE_RED) > 0);
    }

    #[test]
    fn renders_single_row_and_flat_series() {
        let one = render_chart(&frame(&[42.0]), &Ticker::normalize("x"), &small()).unwrap();
        assert!(!one.as_base64().is_empty());

        let flat = render_chart(&frame(&[100.0; 50]), &Ticker::normalize("y"), &small()).unwrap();
        assert!(!flat.as_base64().is_empty());
    }

    #[test]
    fn repeated_renders_are_identical() {
        let f = frame(&(0..120).map(|i| 50.0 + (i % 17) as f64).collect::<Vec<_>>());
        let t = Ticker::normalize("rep");
        let a = render_chart(&f, &t, &small()).unwrap();
        let b = render_chart(&f, &t, &small()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn zero_size_is_rejected() {
        let style = ChartStyle { width: 0, height: 10 };
        assert!(render_chart(&frame(&[1.0, 2.0]), &Ticker::normalize("z"), &style).is_err());
    }

    #[test]
    fn axis_ranges_pad_flat_and_single_day_series() {
        let f = frame(&[100.0]);
        let day = f.rows()[0].date;
        let (x, y) = axis_ranges(&f, day, day);
        assert_eq!(x.end, day + Duration::days(1));
        assert!(y.start < 100.0 && y.end > 100.0);
    }

    #[test]
    fn axis_ranges_never_go_negative() {
        let f = frame(&[0.5, 0.0, 1.0]);
        let (_, y) = axis_ranges(&f, f.rows()[0].date, f.rows()[2].date);
        assert!(y.start >= 0.0);
    }
}
