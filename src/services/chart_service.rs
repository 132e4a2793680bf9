use std::ops::Range;

use chrono::{DateTime, Duration, Utc};
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};

use crate::config::AssetConfig;
use crate::errors::AppError;
use crate::models::PriceSample;
use crate::services::price_service::format_usd;

#[derive(Debug, Clone, Copy)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self { width: 1200, height: 600 }
    }
}

/// Sorted (time, price) series, oldest first.
pub fn chart_series(samples: &[PriceSample]) -> Vec<(DateTime<Utc>, f64)> {
    let mut series: Vec<(DateTime<Utc>, f64)> =
        samples.iter().map(|s| (s.created_at, s.price)).collect();
    series.sort_by_key(|(at, _)| *at);
    series
}

/// Time axis covering the series with 5% margin on each side so endpoint
/// markers stay inside the plot. A single instant is widened by 30 minutes each side.
pub fn time_range(series: &[(DateTime<Utc>, f64)]) -> Option<Range<DateTime<Utc>>> {
    let start = series.first()?.0;
    let end = series.last()?.0;
    if start == end {
        return Some(start - Duration::minutes(30)..end + Duration::minutes(30));
    }
    let margin = (end - start) / 20;
    Some(start - margin..end + margin)
}

/// Pixel offset and horizontal anchor of an endpoint's price label.
/// The last label hangs to the left of its point so it never runs past the right edge.
pub fn endpoint_label_layout(is_last: bool) -> ((i32, i32), HPos) {
    if is_last {
        ((-8, -10), HPos::Right)
    } else {
        ((8, -10), HPos::Left)
    }
}

/// Price axis with 15% headroom. Flat series still get a visible band.
pub fn price_range(series: &[(DateTime<Utc>, f64)]) -> Option<Range<f64>> {
    if series.is_empty() {
        return None;
    }
    let min = series.iter().map(|(_, p)| *p).fold(f64::INFINITY, f64::min);
    let max = series.iter().map(|(_, p)| *p).fold(f64::NEG_INFINITY, f64::max);

    let span = (max - min).max(max.abs() * 0.01).max(1e-8);
    let padding = span * 0.15;
    Some((min - padding).max(0.0)..max + padding)
}

/// Renders a price trend line chart and returns the PNG bytes.
pub fn render_price_chart(
    samples: &[PriceSample],
    asset: &AssetConfig,
    options: ChartOptions,
) -> Result<Vec<u8>, AppError> {
    if options.width == 0 || options.height == 0 {
        return Err(AppError::Chart(format!(
            "Invalid chart size {}x{}",
            options.width, options.height
        )));
    }

    let series = chart_series(samples);
    let x_range = time_range(&series)
        .ok_or_else(|| AppError::Chart("No price data to chart".to_string()))?;
    let y_range = price_range(&series)
        .ok_or_else(|| AppError::Chart("No price data to chart".to_string()))?;

    // BitMapBackend encodes PNG on present(), so render through a temp file.
    let file = tempfile::Builder::new()
        .prefix("price_chart_")
        .suffix(".png")
        .tempfile()
        .map_err(chart_err)?;
    let path = file.path().to_path_buf();

    {
        let root = BitMapBackend::new(&path, (options.width, options.height)).into_drawing_area();
        root.fill(&WHITE).map_err(chart_err)?;

        let mut chart = ChartBuilder::on(&root)
            .caption(
                format!("{} Price Trend (24 Hours)", asset.name),
                ("sans-serif", 28).into_font(),
            )
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(100)
            .build_cartesian_2d(x_range, y_range)
            .map_err(chart_err)?;

        let currency = asset.vs_currency.to_uppercase();
        chart
            .configure_mesh()
            .x_desc("Time (UTC)")
            .y_desc(format!("Price ({})", currency))
            .x_label_formatter(&|at: &DateTime<Utc>| at.format("%H:%M").to_string())
            .y_label_formatter(&|price: &f64| format_usd(*price))
            .light_line_style(&BLACK.mix(0.08))
            .bold_line_style(&BLACK.mix(0.2))
            .draw()
            .map_err(chart_err)?;

        chart
            .draw_series(LineSeries::new(series.iter().copied(), BLUE.stroke_width(2)))
            .map_err(chart_err)?
            .label(format!("{} Price", asset.symbol))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

        let first_at = series[0].0;
        let mut endpoints = vec![series[0]];
        if series.len() > 1 {
            endpoints.push(series[series.len() - 1]);
        }
        chart
            .draw_series(PointSeries::of_element(endpoints, 4, &BLUE, &|c, s, st| {
                let (offset, anchor) = endpoint_label_layout(c.0 != first_at);
                let style = TextStyle::from(("sans-serif", 16).into_font())
                    .pos(Pos::new(anchor, VPos::Bottom));
                EmptyElement::at(c)
                    + Circle::new((0, 0), s, st.filled())
                    + Text::new(format_usd(c.1), offset, style)
            }))
            .map_err(chart_err)?;

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(chart_err)?;

        root.present().map_err(chart_err)?;
    }

    std::fs::read(&path).map_err(chart_err)
}

fn chart_err<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Chart(e.to_string())
}
