use crate::export::TableRow;
use plotters::prelude::*;
use std::error::Error;
use std::fs::remove_file;
use uuid::Uuid;

const GRAPH_WIDTH: u32 = 800;
const GRAPH_HEIGHT: u32 = 600;

/// Count how many rows fall on each age
///
/// Aggregates the demo dataset's `age` column into `(age, count)` pairs,
/// sorted by age ascending. Rows without a numeric `age` value are skipped.
///
/// # Arguments
/// * `rows` - Row-oriented dataset with an `age` column
///
/// # Returns
/// * `Vec<(i32, i32)>` - One entry per distinct age, ascending
pub fn age_counts(rows: &[TableRow]) -> Vec<(i32, i32)> {
    let mut counts = std::collections::BTreeMap::new();

    for row in rows {
        if let Some(age) = row.get("age").and_then(|v| v.as_i64()) {
            *counts.entry(age as i32).or_insert(0) += 1;
        }
    }

    counts.into_iter().collect()
}

/// Render the age-count histogram as a PNG image
///
/// Generates the bar chart shown behind the demo page's "Generate Graph"
/// button: one bar per distinct age, bar height the number of rows with that
/// age.
///
/// # Arguments
/// * `rows` - Row-oriented dataset with an `age` column
///
/// # Returns
/// * `Result<Vec<u8>, Box<dyn Error>>` - PNG image data as bytes
///
/// # Implementation Notes
/// * Renders through a temporary file-based bitmap backend, read back and
///   removed afterwards
/// * Axes scale to the observed age and count ranges
pub fn age_histogram_png(rows: &[TableRow]) -> Result<Vec<u8>, Box<dyn Error>> {
    let data = age_counts(rows);

    // Unique name so concurrent requests don't clobber each other
    let path = std::env::temp_dir().join(format!("docassist_graph_{}.png", Uuid::new_v4()));
    let filename = path.to_string_lossy().into_owned();

    {
        let root =
            BitMapBackend::new(&filename, (GRAPH_WIDTH, GRAPH_HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let min_x = data.iter().map(|(x, _)| *x).min().unwrap_or(0);
        let max_x = data.iter().map(|(x, _)| *x).max().unwrap_or(100);
        let max_y = data.iter().map(|(_, y)| *y).max().unwrap_or(100);

        let mut chart = ChartBuilder::on(&root)
            .caption("Histogram of Age Counts", ("sans-serif", 30).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(40)
            .build_cartesian_2d(min_x..max_x + 1, 0..max_y + 1)?;

        chart
            .configure_mesh()
            .x_desc("Age")
            .y_desc("Count")
            .draw()?;

        // One bar per age, solid fill
        chart.draw_series(
            data.iter()
                .map(|&(x, y)| Rectangle::new([(x, 0), (x + 1, y)], BLUE.filled())),
        )?;

        root.present()?;
    }

    let png_data = std::fs::read(&filename)?;
    remove_file(&filename)?;

    Ok(png_data)
}
