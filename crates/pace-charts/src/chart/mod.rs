mod glyph;

use std::fs;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};

use pace_core::pair::PairKey;
use pace_core::series::PairSeries;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::FontTransform;
use plotters_backend::text_anchor::{HPos, Pos, VPos};
use thiserror::Error;

use crate::config::ChartFormat;
use glyph::GlyphBackend;

const SERIES_A_COLOR: RGBColor = RGBColor(31, 119, 180);
const SERIES_B_COLOR: RGBColor = RGBColor(255, 127, 14);
const CONNECTOR_COLOR: RGBColor = RGBColor(90, 90, 90);
/// Font sizes below are tuned for a 1500px tall figure and scale with height.
const REFERENCE_HEIGHT: f64 = 1_500.0;
const CONNECTOR_DASHES: usize = 16;

pub const Y_AXIS_LABEL: &str = "Lap Coefficient of Variation (CV)";
pub const X_AXIS_LABEL: &str = "Race";
pub const SUBTITLE: &str = "Annotations show CV difference and more consistent driver";

#[derive(Debug, Error)]
pub enum ChartError {
    #[error("{context}: {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to render plot: {0}")]
    Plot(String),
}

pub fn chart_title(key: &PairKey) -> String {
    format!(
        "Lap Consistency Comparison (CV) - {} vs {}",
        key.competitor_a, key.competitor_b
    )
}

/// `<a>_vs_<b>_season_consistency.<ext>`; path separators in names become `-`.
pub fn chart_file_name(key: &PairKey, format: ChartFormat) -> String {
    let clean = |name: &str| name.replace(['/', '\\'], "-");
    format!(
        "{}_vs_{}_season_consistency.{}",
        clean(&key.competitor_a),
        clean(&key.competitor_b),
        format.extension()
    )
}

pub fn chart_path(dir: &Path, key: &PairKey, format: ChartFormat) -> PathBuf {
    dir.join(chart_file_name(key, format))
}

/// Tick label for a race: the "Grand Prix" suffix is shortened to "GP".
pub fn race_tick_label(race: &str) -> String {
    match race.strip_suffix("Grand Prix") {
        Some(stem) => format!("{}GP", stem),
        None => race.to_string(),
    }
}

/// Render one pair's chart and atomically replace `<dir>/<file name>`.
///
/// The figure is drawn into a temporary file in `dir` and only persisted over
/// the final path once the backend has finished, so a failed render never
/// leaves a partial image behind.
pub fn render_pair(
    series: &PairSeries,
    dir: &Path,
    format: ChartFormat,
    size: (u32, u32),
) -> Result<PathBuf, ChartError> {
    if !dir.as_os_str().is_empty() {
        fs::create_dir_all(dir).map_err(|source| ChartError::Io {
            context: "creating charts directory",
            source,
        })?;
    }
    let output_path = chart_path(dir, &series.key, format);
    let staging_dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };

    let staging = tempfile::Builder::new()
        .prefix(".pace-chart-")
        .suffix(&format!(".{}", format.extension()))
        .tempfile_in(staging_dir)
        .map_err(|source| ChartError::Io {
            context: "creating staging file",
            source,
        })?;

    let staging_path = staging.path().to_path_buf();
    let attempt = panic::catch_unwind(AssertUnwindSafe(|| match format {
        ChartFormat::Png => {
            let backend = GlyphBackend::new(BitMapBackend::new(&staging_path, size));
            draw_chart(backend.into_drawing_area(), series)
        }
        ChartFormat::Svg => {
            let backend = SVGBackend::new(&staging_path, size);
            draw_chart(backend.into_drawing_area(), series)
        }
    }));

    match attempt {
        Ok(result) => result?,
        Err(_) => {
            return Err(ChartError::Plot(
                "plotting backend panicked while rendering".into(),
            ));
        }
    }

    staging
        .persist(&output_path)
        .map_err(|err| ChartError::Io {
            context: "replacing chart file",
            source: err.error,
        })?;

    Ok(output_path)
}

fn plot_err(err: impl std::fmt::Display) -> ChartError {
    ChartError::Plot(err.to_string())
}

fn draw_chart<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    series: &PairSeries,
) -> Result<(), ChartError> {
    let (width, height) = root.dim_in_pixel();
    let unit = height as f64 / REFERENCE_HEIGHT;
    let font = |base: f64| ("sans-serif", (base * unit).max(8.0)).into_font();
    let px = |base: f64| ((base * unit).round() as i32).max(1);

    root.fill(&WHITE).map_err(plot_err)?;

    let header_height = (height as f64 * 0.11) as u32;
    let (header, body) = root.split_vertically(header_height);
    let centred = Pos::new(HPos::Center, VPos::Top);
    header
        .draw(&Text::new(
            chart_title(&series.key),
            (width as i32 / 2, px(20.0)),
            TextStyle::from(font(46.0)).pos(centred).color(&BLACK),
        ))
        .map_err(plot_err)?;
    header
        .draw(&Text::new(
            SUBTITLE,
            (width as i32 / 2, px(90.0)),
            TextStyle::from(font(34.0)).pos(centred).color(&BLACK),
        ))
        .map_err(plot_err)?;

    let points = &series.points;
    let bounds = series.bounds;
    let labels: Vec<String> = points
        .iter()
        .map(|point| race_tick_label(&point.race))
        .collect();
    let x_max = points.len() as f64 - 0.5;

    let mut chart = ChartBuilder::on(&body)
        .margin(px(30.0))
        .set_label_area_size(LabelAreaPosition::Left, px(150.0))
        .set_label_area_size(LabelAreaPosition::Bottom, px(300.0))
        .build_cartesian_2d(-0.5f64..x_max, bounds.lower..bounds.upper)
        .map_err(plot_err)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .light_line_style(&BLACK.mix(0.05))
        .x_labels(points.len())
        .x_label_formatter(&|x| {
            let idx = x.round();
            if (x - idx).abs() > 1e-6 || idx < 0.0 {
                return String::new();
            }
            labels.get(idx as usize).cloned().unwrap_or_default()
        })
        .y_label_formatter(&|y| format!("{:.3}", y))
        .x_label_style(font(26.0).transform(FontTransform::Rotate90))
        .y_label_style(font(26.0))
        .axis_desc_style(font(32.0))
        .y_desc(Y_AXIS_LABEL)
        .x_desc(X_AXIS_LABEL)
        .draw()
        .map_err(plot_err)?;

    let stroke = px(4.0) as u32;
    let marker = px(9.0) as u32;
    for (name, color, values) in [
        (
            &series.key.competitor_a,
            SERIES_A_COLOR,
            series.a_values().collect::<Vec<_>>(),
        ),
        (
            &series.key.competitor_b,
            SERIES_B_COLOR,
            series.b_values().collect::<Vec<_>>(),
        ),
    ] {
        let coords: Vec<(f64, f64)> = values
            .iter()
            .enumerate()
            .map(|(idx, value)| (idx as f64, *value))
            .collect();
        chart
            .draw_series(LineSeries::new(coords.clone(), color.stroke_width(stroke)))
            .map_err(plot_err)?
            .label(name.as_str())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 40, y)], color.stroke_width(stroke))
            });
        chart
            .draw_series(
                coords
                    .iter()
                    .map(|coord| Circle::new(*coord, marker, color.filled())),
            )
            .map_err(plot_err)?;
    }

    let connector = CONNECTOR_COLOR.mix(0.6).stroke_width(px(3.0) as u32);
    for (idx, point) in points.iter().enumerate() {
        let x = idx as f64;
        let low = point.a_value.min(point.b_value);
        let high = point.a_value.max(point.b_value);
        if high <= low {
            continue;
        }
        let step = (high - low) / CONNECTOR_DASHES as f64;
        chart
            .draw_series((0..CONNECTOR_DASHES).step_by(2).map(|dash| {
                let start = low + step * dash as f64;
                PathElement::new(vec![(x, start), (x, start + step)], connector)
            }))
            .map_err(plot_err)?;
    }

    let annotation_style = TextStyle::from(font(24.0))
        .pos(Pos::new(HPos::Center, VPos::Bottom))
        .color(&BLACK);
    let line_height = px(32.0);
    for (idx, point) in points.iter().enumerate() {
        let anchor = (idx as f64, bounds.label_anchor(point.a_value, point.b_value));
        let lines: Vec<&str> = point.annotation.lines().collect();
        let last = lines.len().saturating_sub(1);
        chart
            .draw_series(lines.iter().enumerate().map(|(line_idx, line)| {
                let lift = (last - line_idx) as i32 * line_height;
                EmptyElement::at(anchor)
                    + Text::new(line.to_string(), (0, -lift), annotation_style.clone())
            }))
            .map_err(plot_err)?;
    }

    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK.mix(0.3))
        .label_font(font(28.0))
        .position(SeriesLabelPosition::UpperLeft)
        .draw()
        .map_err(plot_err)?;

    drop(chart);

    root.present().map_err(plot_err)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pace_core::calendar::RaceCalendar;
    use pace_core::pair::ComparisonPair;
    use pace_core::record::MetricRecord;

    fn sample_series() -> PairSeries {
        let calendar = RaceCalendar::season_2021();
        let records = vec![
            MetricRecord::new("Bahrain Grand Prix", "HAM", "BOT", 0.011, 0.014),
            MetricRecord::new("São Paulo Grand Prix", "HAM", "BOT", 0.016, 0.012),
            MetricRecord::new("Monaco Grand Prix", "HAM", "BOT", 0.020, 0.020),
        ];
        let pair = ComparisonPair::collect(PairKey::new("HAM", "BOT"), &records, &calendar);
        PairSeries::build(&pair).expect("series")
    }

    #[test]
    fn file_name_follows_pair_order() {
        let key = PairKey::new("Lewis Hamilton", "Valtteri Bottas");
        assert_eq!(
            chart_file_name(&key, ChartFormat::Png),
            "Lewis Hamilton_vs_Valtteri Bottas_season_consistency.png"
        );
        assert_eq!(
            chart_file_name(&PairKey::new("a/b", "c"), ChartFormat::Svg),
            "a-b_vs_c_season_consistency.svg"
        );
    }

    #[test]
    fn tick_labels_shorten_grand_prix() {
        assert_eq!(race_tick_label("Abu Dhabi Grand Prix"), "Abu Dhabi GP");
        assert_eq!(race_tick_label("Sprint"), "Sprint");
    }

    #[test]
    fn renders_png_and_leaves_no_staging_files() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = render_pair(&sample_series(), dir.path(), ChartFormat::Png, (800, 400))
            .expect("render png");
        assert_eq!(path, dir.path().join("HAM_vs_BOT_season_consistency.png"));
        let bytes = fs::read(&path).expect("read png");
        assert_eq!(&bytes[1..4], b"PNG");

        let entries: Vec<_> = fs::read_dir(dir.path())
            .expect("list dir")
            .filter_map(Result::ok)
            .collect();
        assert_eq!(entries.len(), 1, "staging file left behind");
    }

    #[test]
    fn renders_svg_with_title_text() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = render_pair(&sample_series(), dir.path(), ChartFormat::Svg, (900, 450))
            .expect("render svg");
        let svg = fs::read_to_string(&path).expect("read svg");
        assert!(svg.contains("HAM vs BOT"));
        assert!(svg.contains("0.003"));
    }

    #[test]
    fn creates_missing_directory_and_overwrites() {
        let dir = tempfile::tempdir().expect("temp dir");
        let nested = dir.path().join("season_pairs").join("consistency");
        let series = sample_series();
        let first = render_pair(&series, &nested, ChartFormat::Png, (600, 300)).expect("first");
        let first_bytes = fs::read(&first).expect("first bytes");
        let second = render_pair(&series, &nested, ChartFormat::Png, (600, 300)).expect("second");
        assert_eq!(first, second);
        assert_eq!(first_bytes, fs::read(&second).expect("second bytes"));
    }
}
