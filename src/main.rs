use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashSet};
use std::error::Error;
use std::path::Path;

use ordered_float::NotNan;

mod cache;
mod charts;
mod dataset;
mod engine;
mod errors;
mod models;
mod stats;

use cache::DatasetCache;
use dataset::Dataset;
use engine::MetricsEngine;
use models::Column;

fn usage() -> String {
    format!(
        "usage: covid-factors <table.csv> [x_factor] [y_factor] [rate_category] [country,country,...]\n\
         factors: {}\n\
         rates: {}",
        Column::FACTORS.map(|c| c.as_str()).join(", "),
        Column::RATES.map(|c| c.as_str()).join(", ")
    )
}

fn parse_column(name: &str) -> Result<Column, Box<dyn Error>> {
    Column::parse(name).ok_or_else(|| format!("unknown column '{}'\n{}", name, usage()).into())
}

// Top-5 countries by the selected rate, bounded heap over NotNan keys.
fn print_top_countries(dataset: &Dataset, rate: Column) {
    let mut heap: BinaryHeap<Reverse<(NotNan<f64>, String)>> = BinaryHeap::new();
    for record in dataset.records() {
        if let Ok(value) = NotNan::new(rate.value(record)) {
            heap.push(Reverse((value, record.country.clone())));
            if heap.len() > 5 {
                heap.pop();
            }
        }
    }

    let mut top: Vec<(NotNan<f64>, String)> = heap.into_iter().map(|Reverse(pair)| pair).collect();
    top.sort_by(|a, b| b.cmp(a));

    println!("Top 5 countries by {}:", rate.label());
    for (value, country) in top {
        println!("  {}: {:.6}", country, value);
    }
    println!();
}

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let path = args.first().map(String::as_str).unwrap_or("data/plot2.csv");

    // Defaults mirror the dashboard widgets: health expenditure on x,
    // GDP on y, confirmed rate as the category, every country selected.
    let x_col = parse_column(args.get(1).map(String::as_str).unwrap_or("health_expenditure"))?;
    let y_col = parse_column(args.get(2).map(String::as_str).unwrap_or("gdp"))?;
    let rate = parse_column(args.get(3).map(String::as_str).unwrap_or("confirmed_rate"))?;

    let mut cache = DatasetCache::new();
    let dataset = cache.get_or_load(Path::new(path))?;
    let engine = MetricsEngine::new(dataset);
    println!("Loaded {} countries from {}", engine.dataset().len(), path);

    let selected: HashSet<String> = match args.get(4) {
        Some(list) => list.split(',').map(|s| s.trim().to_string()).collect(),
        None => engine.dataset().countries().into_iter().collect(),
    };
    let filtered = engine.filtered(&selected);
    println!("{} of {} countries selected\n", filtered.len(), engine.dataset().len());

    print_top_countries(&filtered, rate);

    // Each statistic and chart fails on its own; one bad request never
    // takes down the rest of the report.
    match engine.statistics(&filtered, x_col, rate) {
        Ok(fit) => {
            println!(
                "{} vs {}: slope {:.6}, intercept {:.6}, correlation {:.4}",
                x_col.label(),
                rate.label(),
                fit.slope,
                fit.intercept,
                fit.correlation
            );
            if let Err(e) = charts::create_scatter_with_regression(
                &filtered,
                x_col,
                rate,
                &fit,
                "scatter_regression.png",
            ) {
                println!("Could not draw scatter plot: {}", e);
            }
        }
        Err(e) => println!("No regression available: {}", e),
    }

    if let Err(e) = charts::create_bubble_chart(&filtered, x_col, y_col, rate, "bubble_chart.png") {
        println!("Could not draw bubble chart: {}", e);
    }

    let mut matrix_columns: Vec<Column> = Column::FACTORS.to_vec();
    matrix_columns.extend(Column::RATES);
    match engine.correlation_matrix(&filtered, &matrix_columns) {
        Ok(matrix) => {
            if let Err(e) = charts::create_correlation_heatmap(&matrix, "correlation_heatmap.png") {
                println!("Could not draw heatmap: {}", e);
            }
        }
        Err(e) => println!("No correlation matrix available: {}", e),
    }

    if let Err(e) = charts::create_rate_bar_chart(&filtered, rate, "rate_bar_chart.png") {
        println!("Could not draw bar chart: {}", e);
    }

    filtered.write_csv(Path::new("normalized_dataset.csv"))?;
    println!("Normalized table saved to normalized_dataset.csv");

    Ok(())
}
