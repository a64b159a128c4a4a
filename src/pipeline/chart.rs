//! Charts: validate a [`ChartRequest`] against a table, then draw it.
//!
//! [`prepare`] resolves the axis columns and extracts the plot data; it is
//! pure and does all the validation. [`render`] draws prepared data into an
//! RGB buffer with `plotters` and encodes it as PNG.
//!
//! Bar charts always place x values as categories in row order. Line and
//! scatter charts use numeric x values directly and fall back to row
//! positions labelled with the cell text when x is not numeric. Rows with a
//! missing or non-finite y (or numeric x) are skipped.

use crate::config::{ChartKind, ChartRequest};
use crate::error::FileError;
use crate::pipeline::table::{Cell, Table};
use image::{DynamicImage, ImageFormat, RgbImage};
use plotters::element::Pie;
use plotters::prelude::*;
use std::io::Cursor;
use tracing::debug;

/// Rendered chart size in pixels.
pub const CHART_SIZE: (u32, u32) = (800, 600);

const PALETTE: [RGBColor; 8] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
];

/// Points for a bar, line, or scatter chart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartesianSeries {
    pub kind: ChartKind,
    pub x_name: String,
    pub y_name: String,
    /// `(x, y)` pairs. For categorical x, `x` is the row position.
    pub points: Vec<(f64, f64)>,
    /// Category labels indexed by position, when x is categorical.
    pub x_labels: Option<Vec<String>>,
}

/// One slice of a pie chart.
#[derive(Debug, Clone, PartialEq)]
pub struct PieSlice {
    pub label: String,
    pub count: usize,
    pub percent: f64,
}

/// Plot data ready for drawing.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartData {
    Cartesian(CartesianSeries),
    Pie { column: String, slices: Vec<PieSlice> },
}

/// Validate `request` against `table` and extract what to draw.
///
/// Returns `Ok(None)` for [`ChartKind::None`].
pub fn prepare(
    table: &Table,
    request: &ChartRequest,
    file: &str,
) -> Result<Option<ChartData>, FileError> {
    let render_err = |detail: String| FileError::Render {
        file: file.to_string(),
        detail,
    };

    if request.kind == ChartKind::None {
        return Ok(None);
    }

    let y_idx = resolve_y(table, request.y.as_deref()).map_err(render_err)?;
    let y_name = table.columns()[y_idx].name.clone();

    if request.kind == ChartKind::Pie {
        let slices = value_counts(table.column_cells(y_idx));
        if slices.is_empty() {
            return Err(render_err(format!("No data to plot in column '{y_name}'")));
        }
        return Ok(Some(ChartData::Pie {
            column: y_name,
            slices,
        }));
    }

    let x_idx = resolve_x(table, request.x.as_deref()).map_err(render_err)?;
    let x_col = &table.columns()[x_idx];
    let categorical = request.kind == ChartKind::Bar || !x_col.dtype.is_numeric();

    let mut points = Vec::new();
    let mut labels = Vec::new();
    for row in table.rows() {
        let Some(y) = row[y_idx].as_f64().filter(|v| v.is_finite()) else {
            continue;
        };
        if categorical {
            points.push((labels.len() as f64, y));
            labels.push(row[x_idx].to_string());
        } else if let Some(x) = row[x_idx].as_f64().filter(|v| v.is_finite()) {
            points.push((x, y));
        }
    }

    if points.is_empty() {
        return Err(render_err(format!(
            "No data to plot for '{}' against '{}'",
            y_name, x_col.name
        )));
    }

    Ok(Some(ChartData::Cartesian(CartesianSeries {
        kind: request.kind,
        x_name: x_col.name.clone(),
        y_name,
        points,
        x_labels: categorical.then_some(labels),
    })))
}

fn resolve_x(table: &Table, requested: Option<&str>) -> Result<usize, String> {
    match requested {
        Some(name) => table
            .column_index(name)
            .ok_or_else(|| format!("Column '{name}' not found")),
        None if table.columns().is_empty() => Err("No column available for the x-axis".into()),
        None => Ok(0),
    }
}

fn resolve_y(table: &Table, requested: Option<&str>) -> Result<usize, String> {
    let idx = match requested {
        Some(name) => table
            .column_index(name)
            .ok_or_else(|| format!("Column '{name}' not found"))?,
        None => {
            let first = table
                .numeric_columns()
                .next()
                .ok_or_else(|| "No numeric column available for the y-axis".to_string())?;
            table.column_index(first).unwrap_or_default()
        }
    };
    if !table.columns()[idx].dtype.is_numeric() {
        return Err(format!(
            "Column '{}' is not numeric",
            table.columns()[idx].name
        ));
    }
    Ok(idx)
}

/// Count distinct non-missing values, most frequent first; ties keep
/// first-seen order.
fn value_counts<'a>(cells: impl Iterator<Item = &'a Cell>) -> Vec<PieSlice> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for cell in cells.filter(|c| !c.is_missing()) {
        let label = cell.to_string();
        match counts.iter_mut().find(|(l, _)| *l == label) {
            Some((_, n)) => *n += 1,
            None => counts.push((label, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    let total: usize = counts.iter().map(|(_, n)| n).sum();
    counts
        .into_iter()
        .map(|(label, count)| PieSlice {
            label,
            count,
            percent: count as f64 * 100.0 / total as f64,
        })
        .collect()
}

/// Draw prepared data and return PNG bytes.
pub fn render(data: &ChartData, file: &str) -> Result<Vec<u8>, FileError> {
    let render_err = |detail: String| FileError::Render {
        file: file.to_string(),
        detail,
    };

    let (w, h) = CHART_SIZE;
    let mut pixels = vec![0u8; (w * h * 3) as usize];
    draw(data, &mut pixels).map_err(|e| render_err(format!("Chart drawing failed: {e}")))?;

    let img = RgbImage::from_raw(w, h, pixels)
        .ok_or_else(|| render_err("Chart buffer has the wrong size".into()))?;
    let mut png = Vec::new();
    DynamicImage::ImageRgb8(img)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| render_err(format!("PNG encoding failed: {e}")))?;

    debug!("Rendered chart for {} → {} bytes PNG", file, png.len());
    Ok(png)
}

fn draw(data: &ChartData, pixels: &mut [u8]) -> Result<(), Box<dyn std::error::Error>> {
    let root = BitMapBackend::with_buffer(pixels, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    match data {
        ChartData::Cartesian(series) => draw_cartesian(&root, series)?,
        ChartData::Pie { column, slices } => {
            let area = root.titled(column, ("sans-serif", 24))?;
            let (aw, ah) = area.dim_in_pixel();
            let center = (aw as i32 / 2, ah as i32 / 2);
            let radius = f64::from(aw.min(ah)) * 0.35;
            let sizes: Vec<f64> = slices.iter().map(|s| s.count as f64).collect();
            let colors: Vec<RGBColor> = (0..slices.len())
                .map(|i| PALETTE[i % PALETTE.len()])
                .collect();
            let labels: Vec<String> = slices
                .iter()
                .map(|s| format!("{} ({:.1}%)", s.label, s.percent))
                .collect();

            let mut pie = Pie::new(&center, &radius, &sizes, &colors, &labels);
            pie.start_angle(90.0);
            pie.label_style(("sans-serif", 16).into_font().color(&BLACK));
            area.draw(&pie)?;
        }
    }

    root.present()?;
    Ok(())
}

fn draw_cartesian<DB: DrawingBackend>(
    root: &DrawingArea<DB, plotters::coord::Shift>,
    series: &CartesianSeries,
) -> Result<(), Box<dyn std::error::Error>>
where
    DB::ErrorType: 'static,
{
    let (x_range, y_range) = axis_ranges(series)?;

    let mut chart = ChartBuilder::on(root)
        .margin(20)
        .caption(
            format!("{} by {}", series.y_name, series.x_name),
            ("sans-serif", 24),
        )
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_range, y_range)?;

    let category = |v: &f64| -> String {
        let labels = series.x_labels.as_deref().unwrap_or_default();
        let pos = v.round();
        if (v - pos).abs() < 1e-6 && pos >= 0.0 && (pos as usize) < labels.len() {
            labels[pos as usize].clone()
        } else {
            String::new()
        }
    };

    let mut mesh = chart.configure_mesh();
    mesh.x_desc(series.x_name.as_str())
        .y_desc(series.y_name.as_str());
    if let Some(labels) = &series.x_labels {
        mesh.x_labels(labels.len().min(20)).x_label_formatter(&category);
    }
    mesh.draw()?;

    let color = PALETTE[0];
    match series.kind {
        ChartKind::Bar => {
            chart.draw_series(series.points.iter().map(|&(x, y)| {
                Rectangle::new([(x - 0.4, 0.0), (x + 0.4, y)], color.filled())
            }))?;
        }
        ChartKind::Line => {
            chart.draw_series(LineSeries::new(series.points.iter().copied(), &color))?;
        }
        _ => {
            chart.draw_series(
                series
                    .points
                    .iter()
                    .map(|&(x, y)| Circle::new((x, y), 4, color.filled())),
            )?;
        }
    }
    Ok(())
}

/// Padded axis ranges. Bars always include zero on the y-axis.
///
/// Fails when a bound is not finite, e.g. values near `f64::MAX` whose
/// span overflows.
fn axis_ranges(
    series: &CartesianSeries,
) -> Result<(std::ops::Range<f64>, std::ops::Range<f64>), String> {
    let (mut x_min, mut x_max) = min_max(series.points.iter().map(|p| p.0));
    let (mut y_min, mut y_max) = min_max(series.points.iter().map(|p| p.1));

    if series.x_labels.is_some() {
        x_min -= 0.5;
        x_max += 0.5;
    } else {
        let pad = ((x_max - x_min) * 0.05).max(0.5);
        x_min -= pad;
        x_max += pad;
    }

    if series.kind == ChartKind::Bar {
        y_min = y_min.min(0.0);
        y_max = y_max.max(0.0);
    }
    let pad = ((y_max - y_min) * 0.05).max(0.5);
    let (y_min, y_max) = (y_min - pad, y_max + pad);

    if ![x_min, x_max, y_min, y_max].iter().all(|b| b.is_finite()) {
        return Err(format!(
            "Axis range for '{}' against '{}' is too large to draw",
            series.y_name, series.x_name
        ));
    }
    Ok((x_min..x_max, y_min..y_max))
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tabular::parse_csv;

    fn table() -> Table {
        parse_csv(
            "t.csv",
            b"city,sales,year\nOslo,3,2020\nRome,,2021\nLima,5,2022\nOslo,3,2023\n",
        )
        .unwrap()
    }

    fn request(kind: ChartKind, x: Option<&str>, y: Option<&str>) -> ChartRequest {
        ChartRequest {
            kind,
            x: x.map(String::from),
            y: y.map(String::from),
        }
    }

    #[test]
    fn none_kind_prepares_nothing() {
        let data = prepare(&table(), &ChartRequest::default(), "t.csv").unwrap();
        assert!(data.is_none());
    }

    #[test]
    fn bar_defaults_to_first_column_and_first_numeric() {
        let data = prepare(&table(), &request(ChartKind::Bar, None, None), "t.csv")
            .unwrap()
            .unwrap();
        let ChartData::Cartesian(s) = data else {
            panic!("expected cartesian data");
        };
        assert_eq!(s.x_name, "city");
        assert_eq!(s.y_name, "sales");
        // Rome has no sales and is skipped.
        assert_eq!(s.points, vec![(0.0, 3.0), (1.0, 5.0), (2.0, 3.0)]);
        assert_eq!(
            s.x_labels,
            Some(vec!["Oslo".to_string(), "Lima".into(), "Oslo".into()])
        );
    }

    #[test]
    fn line_uses_numeric_x_values() {
        let data = prepare(
            &table(),
            &request(ChartKind::Line, Some("year"), Some("sales")),
            "t.csv",
        )
        .unwrap()
        .unwrap();
        let ChartData::Cartesian(s) = data else {
            panic!("expected cartesian data");
        };
        assert_eq!(s.x_labels, None);
        assert_eq!(s.points, vec![(2020.0, 3.0), (2022.0, 5.0), (2023.0, 3.0)]);
    }

    #[test]
    fn pie_counts_values() {
        let data = prepare(&table(), &request(ChartKind::Pie, None, Some("sales")), "t.csv")
            .unwrap()
            .unwrap();
        let ChartData::Pie { column, slices } = data else {
            panic!("expected pie data");
        };
        assert_eq!(column, "sales");
        assert_eq!(slices.len(), 2);
        assert_eq!(slices[0].label, "3");
        assert_eq!(slices[0].count, 2);
        assert!((slices[0].percent - 66.666).abs() < 0.01);
        assert_eq!(slices[1].label, "5");
    }

    #[test]
    fn non_numeric_y_is_render_error() {
        let err = prepare(&table(), &request(ChartKind::Line, None, Some("city")), "t.csv")
            .unwrap_err();
        assert!(matches!(err, FileError::Render { .. }));
        assert_eq!(err.to_string(), "Column 'city' is not numeric");
    }

    #[test]
    fn no_numeric_column_is_render_error() {
        let t = parse_csv("w.csv", b"a,b\nx,y\n").unwrap();
        let err = prepare(&t, &request(ChartKind::Pie, None, None), "w.csv").unwrap_err();
        assert_eq!(err.to_string(), "No numeric column available for the y-axis");
    }

    #[test]
    fn unknown_column_is_render_error() {
        let err = prepare(&table(), &request(ChartKind::Scatter, Some("nope"), None), "t.csv")
            .unwrap_err();
        assert_eq!(err.to_string(), "Column 'nope' not found");
    }

    #[test]
    fn bar_range_includes_zero() {
        let s = CartesianSeries {
            kind: ChartKind::Bar,
            x_name: "x".into(),
            y_name: "y".into(),
            points: vec![(0.0, 10.0), (1.0, 20.0)],
            x_labels: Some(vec!["a".into(), "b".into()]),
        };
        let (x, y) = axis_ranges(&s).unwrap();
        assert_eq!(x, -0.5..1.5);
        assert!(y.start < 0.0 && y.end > 20.0);
    }

    #[test]
    fn infinite_values_are_skipped() {
        let t = parse_csv("inf.csv", b"x,y\n1,inf\n2,3\ninfinity,4\n5,-inf\n").unwrap();
        let data = prepare(&t, &request(ChartKind::Line, Some("x"), Some("y")), "inf.csv")
            .unwrap()
            .unwrap();
        let ChartData::Cartesian(s) = &data else {
            panic!("expected cartesian data");
        };
        assert_eq!(s.points, vec![(2.0, 3.0)]);
        assert!(axis_ranges(s).is_ok());
        assert_renders(&data);
    }

    #[test]
    fn only_infinite_values_is_render_error() {
        let t = parse_csv("inf.csv", b"x,y\n1,inf\n2,1e309\n").unwrap();
        let err = prepare(&t, &request(ChartKind::Scatter, Some("x"), Some("y")), "inf.csv")
            .unwrap_err();
        assert_eq!(err.to_string(), "No data to plot for 'y' against 'x'");
    }

    #[test]
    fn overflowing_span_is_render_error() {
        let t = parse_csv("big.csv", b"x,y\n1,1e308\n2,-1e308\n").unwrap();
        let data = prepare(&t, &request(ChartKind::Line, Some("x"), Some("y")), "big.csv")
            .unwrap()
            .unwrap();
        let ChartData::Cartesian(s) = &data else {
            panic!("expected cartesian data");
        };
        assert!(axis_ranges(s).is_err());

        let err = render(&data, "big.csv").unwrap_err();
        assert!(matches!(err, FileError::Render { .. }));
        assert!(err.to_string().contains("too large to draw"), "got: {err}");
    }

    fn assert_renders(data: &ChartData) {
        match render(data, "t.csv") {
            Ok(png) => assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n"),
            Err(e) => println!("SKIP: chart text needs a system font: {e}"),
        }
    }

    #[test]
    fn scatter_renders_png() {
        let data = prepare(&table(), &request(ChartKind::Scatter, Some("year"), None), "t.csv")
            .unwrap()
            .unwrap();
        assert_renders(&data);
    }

    #[test]
    fn line_renders_png() {
        let data = prepare(
            &table(),
            &request(ChartKind::Line, Some("year"), Some("sales")),
            "t.csv",
        )
        .unwrap()
        .unwrap();
        assert_renders(&data);
    }
}
