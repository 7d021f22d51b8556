//! SVG rendering of P/L profiles and price history.

use std::error::Error;

use plotters::coord::Shift;
use plotters::prelude::*;

use crate::error::StrategyError;
use crate::types::*;
use crate::StrategyResult;

pub const CHART_WIDTH: u32 = 900;
pub const CHART_HEIGHT: u32 = 540;

type DrawResult = Result<(), Box<dyn Error>>;

fn chart_err(e: Box<dyn Error>) -> StrategyError {
    StrategyError::Chart(e.to_string())
}

/// Y-axis bounds covering `values` and zero, padded by 5%.
fn y_bounds(values: &[f64], include_zero: bool) -> (f64, f64) {
    let (mut lo, mut hi) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if include_zero {
        lo = lo.min(0.0);
        hi = hi.max(0.0);
    }
    let pad = match (hi - lo) * 0.05 {
        p if p > 0.0 => p,
        _ => lo.abs().max(1.0) * 0.05,
    };
    (lo - pad, hi + pad)
}

fn check_series(field: &str, values: &[f64]) -> StrategyResult<()> {
    if values.len() < 2 {
        return Err(StrategyError::invalid(field, "at least two points are required"));
    }
    if values.iter().any(|v| !v.is_finite()) {
        return Err(StrategyError::invalid(field, "all values must be finite"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// P/L profile
// ---------------------------------------------------------------------------

/// Render a P/L curve as an SVG document.
///
/// `prices` and `values` are the grid and the P/L at each grid point. A
/// vertical marker is drawn at `spot` when it lies inside the price range.
pub fn render_pl_chart(
    prices: &[Price],
    values: &[f64],
    title: &str,
    spot: Option<Price>,
) -> StrategyResult<String> {
    check_series("prices", prices)?;
    check_series("values", values)?;
    if prices.len() != values.len() {
        return Err(StrategyError::invalid(
            "values",
            format!("expected {} points, got {}", prices.len(), values.len()),
        ));
    }

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        draw_pl(&root, prices, values, title, spot).map_err(chart_err)?;
    }
    Ok(svg)
}

fn draw_pl(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    prices: &[Price],
    values: &[f64],
    title: &str,
    spot: Option<Price>,
) -> DrawResult {
    root.fill(&WHITE)?;

    let x_min = prices[0];
    let x_max = prices[prices.len() - 1];
    let (y_min, y_max) = y_bounds(values, true);

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Stock price at target date")
        .y_desc("Profit / Loss")
        .draw()?;

    chart.draw_series(LineSeries::new(
        vec![(x_min, 0.0), (x_max, 0.0)],
        BLACK.stroke_width(1),
    ))?;

    if let Some(s) = spot.filter(|s| *s >= x_min && *s <= x_max) {
        chart
            .draw_series(LineSeries::new(
                vec![(s, y_min), (s, y_max)],
                BLACK.mix(0.4).stroke_width(1),
            ))?
            .label(format!("Spot {:.2}", s))
            .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLACK.mix(0.4)));
    }

    chart
        .draw_series(LineSeries::new(
            prices.iter().copied().zip(values.iter().copied()),
            BLUE.stroke_width(2),
        ))?
        .label("P/L")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], BLUE.stroke_width(2)));

    // Profitable stretches in green on top of the base line
    let mut run: Vec<(f64, f64)> = Vec::new();
    for (&p, &v) in prices.iter().zip(values) {
        if v > 0.0 {
            run.push((p, v));
        } else if !run.is_empty() {
            chart.draw_series(LineSeries::new(std::mem::take(&mut run), GREEN.stroke_width(3)))?;
        }
    }
    if !run.is_empty() {
        chart.draw_series(LineSeries::new(run, GREEN.stroke_width(3)))?;
    }

    chart
        .configure_series_labels()
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Price history
// ---------------------------------------------------------------------------

/// Render daily closes as an SVG line chart indexed by trading day.
pub fn render_price_history(closes: &[Price], title: &str) -> StrategyResult<String> {
    check_series("closes", closes)?;

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (CHART_WIDTH, CHART_HEIGHT)).into_drawing_area();
        draw_history(&root, closes, title).map_err(chart_err)?;
    }
    Ok(svg)
}

fn draw_history(root: &DrawingArea<SVGBackend<'_>, Shift>, closes: &[Price], title: &str) -> DrawResult {
    root.fill(&WHITE)?;

    let (y_min, y_max) = y_bounds(closes, false);
    let last = (closes.len() - 1) as f64;

    let mut chart = ChartBuilder::on(root)
        .caption(title, ("sans-serif", 24))
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..last, y_min..y_max)?;

    chart
        .configure_mesh()
        .x_desc("Trading day")
        .y_desc("Close")
        .draw()?;

    chart.draw_series(LineSeries::new(
        closes.iter().enumerate().map(|(i, &c)| (i as f64, c)),
        BLUE.stroke_width(2),
    ))?;

    root.present()?;
    Ok(())
}
