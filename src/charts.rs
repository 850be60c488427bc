use std::error::Error;

use ndarray::Array1;
use plotters::prelude::*;

use crate::dataset::Dataset;
use crate::models::{Column, RegressionResult};
use crate::stats::CorrelationMatrix;

fn extent(values: &Array1<f64>) -> (f64, f64) {
    let lo = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    (lo, hi)
}

// Pad the axis range so markers at the extremes are not clipped; a
// degenerate span still yields a drawable range.
fn padded(lo: f64, hi: f64) -> (f64, f64) {
    if lo == hi {
        return (lo - 1.0, hi + 1.0);
    }
    let margin = (hi - lo) * 0.05;
    (lo - margin, hi + margin)
}

// Marker radius in pixels for a bubble, scaled linearly between the
// smallest and largest rate in view.
fn bubble_radius(rate: f64, lo: f64, hi: f64) -> i32 {
    if hi == lo {
        return 10;
    }
    (4.0 + (rate - lo) / (hi - lo) * 26.0).round() as i32
}

// Red-to-green ramp for defined coefficients, grey for undefined cells.
fn cell_color(value: Option<f64>) -> RGBColor {
    match value {
        Some(v) if v >= 0.0 => RGBColor((255.0 * (1.0 - v)) as u8, (255.0 * v) as u8, 0),
        Some(v) => RGBColor(0, (255.0 * (1.0 + v)) as u8, (255.0 * (-v)) as u8),
        None => RGBColor(180, 180, 180),
    }
}

// Bubble chart: x factor vs y factor, marker size encodes the selected
// COVID rate, one color per country.
pub(crate) fn create_bubble_chart(
    dataset: &Dataset,
    x_col: Column,
    y_col: Column,
    rate: Column,
    output_file: &str,
) -> Result<(), Box<dyn Error>> {
    if dataset.is_empty() {
        return Err("no countries selected".into());
    }
    let xs = dataset.column(x_col);
    let ys = dataset.column(y_col);
    let rates = dataset.column(rate);

    let (x_lo, x_hi) = padded(extent(&xs).0, extent(&xs).1);
    let (y_lo, y_hi) = padded(extent(&ys).0, extent(&ys).1);
    let (r_lo, r_hi) = extent(&rates);

    let root = BitMapBackend::new(output_file, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!(
                "Bubble Chart: {} vs {} (Size: {})",
                x_col.label(),
                y_col.label(),
                rate.label()
            ),
            ("sans-serif", 30),
        )
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_desc(x_col.label())
        .y_desc(y_col.label())
        .draw()?;

    chart.draw_series(dataset.records().iter().enumerate().map(|(i, record)| {
        let color = Palette99::pick(i).mix(0.6);
        Circle::new(
            (x_col.value(record), y_col.value(record)),
            bubble_radius(rate.value(record), r_lo, r_hi),
            color.filled(),
        )
    }))?;

    root.present()?;
    println!("Bubble chart saved to {}", output_file);
    Ok(())
}

// Scatter plot of a factor against a rate with the fitted regression line
// overlaid and the correlation coefficient in the caption.
pub(crate) fn create_scatter_with_regression(
    dataset: &Dataset,
    x_col: Column,
    rate: Column,
    fit: &RegressionResult,
    output_file: &str,
) -> Result<(), Box<dyn Error>> {
    if dataset.is_empty() {
        return Err("no countries selected".into());
    }
    let xs = dataset.column(x_col);
    let ys = dataset.column(rate);

    let (x_min, x_max) = extent(&xs);
    let (x_lo, x_hi) = padded(x_min, x_max);
    let (y_lo, y_hi) = padded(extent(&ys).0, extent(&ys).1);

    let root = BitMapBackend::new(output_file, (1024, 768)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(
            format!(
                "{} vs {} (Correlation: {:.2})",
                x_col.label(),
                rate.label(),
                fit.correlation
            ),
            ("sans-serif", 30),
        )
        .margin(20)
        .x_label_area_size(40)
        .y_label_area_size(40)
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    chart
        .configure_mesh()
        .x_desc(x_col.label())
        .y_desc(rate.label())
        .draw()?;

    chart.draw_series(
        xs.iter()
            .zip(ys.iter())
            .map(|(&x, &y)| Circle::new((x, y), 5, RGBAColor(190, 86, 131, 0.5).filled())),
    )?;

    chart
        .draw_series(LineSeries::new(
            [
                (x_min, fit.slope * x_min + fit.intercept),
                (x_max, fit.slope * x_max + fit.intercept),
            ],
            &RED,
        ))?
        .label("OLS fit")
        .legend(|(x, y)| PathElement::new([(x, y), (x + 20, y)], &RED));

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    println!("Scatter plot saved to {}", output_file);
    Ok(())
}

pub(crate) fn create_correlation_heatmap(
    matrix: &CorrelationMatrix,
    output_file: &str,
) -> Result<(), Box<dyn Error>> {
    let n = matrix.size();
    if n == 0 {
        return Err("no columns to draw".into());
    }
    let labels: Vec<String> = matrix.columns().iter().map(|c| c.label()).collect();

    let root = BitMapBackend::new(output_file, (1024, 1024)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Correlation Heatmap", ("sans-serif", 30))
        .margin(5)
        .x_label_area_size(60)
        .y_label_area_size(60)
        .build_cartesian_2d(0..n as u32, 0..n as u32)?;

    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .label_style(("sans-serif", 15))
        .x_label_formatter(&|x| labels.get(*x as usize).cloned().unwrap_or_default())
        .y_label_formatter(&|y| {
            labels
                .get(n.saturating_sub(1).saturating_sub(*y as usize))
                .cloned()
                .unwrap_or_default()
        })
        .draw()?;

    // Row 0 is drawn at the top, matching how the matrix reads on paper.
    for i in 0..n {
        for j in 0..n {
            let color = cell_color(matrix.get(i, j));
            chart.draw_series(std::iter::once(Rectangle::new(
                [
                    (j as u32, (n - i - 1) as u32),
                    ((j + 1) as u32, (n - i) as u32),
                ],
                color.filled(),
            )))?;
        }
    }

    root.present()?;
    println!("Heatmap saved to {}", output_file);
    Ok(())
}

// One bar per country for the selected rate, over the filtered subset.
pub(crate) fn create_rate_bar_chart(
    dataset: &Dataset,
    rate: Column,
    output_file: &str,
) -> Result<(), Box<dyn Error>> {
    if dataset.is_empty() {
        return Err("no countries selected".into());
    }
    let countries = dataset.countries();
    let rates = dataset.column(rate);
    let max_rate = extent(&rates).1;
    let top = if max_rate > 0.0 { max_rate * 1.2 } else { 1.0 };

    let root = BitMapBackend::new(output_file, (1280, 720)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} by Country", rate.label()), ("sans-serif", 40))
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(50)
        .build_cartesian_2d(0..countries.len() as i32, 0.0..top)?;

    chart
        .configure_mesh()
        .x_labels(countries.len())
        .y_desc(rate.label())
        .x_desc("Country")
        .axis_desc_style(("sans-serif", 20))
        .label_style(("sans-serif", 15))
        .x_label_formatter(&|x| countries.get(*x as usize).cloned().unwrap_or_default())
        .draw()?;

    chart.draw_series(rates.iter().enumerate().map(|(i, &value)| {
        Rectangle::new(
            [(i as i32, 0.0), (i as i32 + 1, value)],
            ShapeStyle {
                color: RGBAColor(110, 48, 75, 1f64),
                filled: true,
                stroke_width: 0,
            },
        )
    }))?;

    root.present()?;
    println!("Bar chart saved to {}", output_file);
    Ok(())
}
