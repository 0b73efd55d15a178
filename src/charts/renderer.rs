//! Static Chart Renderer
//! Writes the report charts as PNG files with plotters.
//!
//! Charts:
//! 1. `top_diseases.png`: bar chart of total cases for the top diseases
//! 2. `yearly_trend.png`: yearly totals, one line per top disease
//! 3. `monthly_<year>.png`: monthly cases within one year, one line per top disease

use crate::charts::{ChartPlotter, ChartSeries, PALETTE};
use crate::config::YearSpan;
use crate::stats::{DiseaseTotal, MonthlyCases};
use plotters::prelude::*;
use rayon::prelude::*;
use std::ops::Range;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

const FONT: &str = "sans-serif";
const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Failed to draw {path}: {message}")]
    Draw { path: PathBuf, message: String },
    #[error("Nothing to chart for {0}")]
    NoData(String),
}

fn draw_error(path: &Path, e: impl std::fmt::Display) -> RenderError {
    RenderError::Draw {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Axis and caption text of a line chart.
struct LineChartLayout<'a> {
    title: String,
    x_desc: &'a str,
    y_desc: &'a str,
    x_range: Range<i32>,
    y_range: Range<i64>,
    x_labels: usize,
}

pub struct StaticChartRenderer {
    width: u32,
    height: u32,
    draw_text: bool,
}

impl StaticChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            draw_text: true,
        }
    }

    /// Draw axes and series only: no captions, tick labels or legends.
    /// Needs no system fonts.
    pub fn without_text(mut self) -> Self {
        self.draw_text = false;
        self
    }

    /// Fixed range when given, otherwise 0 up to the series maximum plus headroom.
    pub fn monthly_y_range(series: &[ChartSeries], fixed: Option<(i64, i64)>) -> Range<i64> {
        match fixed {
            Some((lo, hi)) => lo..hi,
            None => 0..ChartPlotter::y_upper(ChartPlotter::max_value(series)),
        }
    }

    /// Render every chart into `out_dir`; monthly charts are drawn in parallel.
    pub fn render_report(
        &self,
        out_dir: &Path,
        totals: &[DiseaseTotal],
        monthly: &[MonthlyCases],
        years: &YearSpan,
        monthly_y_range: Option<(i64, i64)>,
    ) -> Result<Vec<PathBuf>, RenderError> {
        let mut written = Vec::new();
        if totals.is_empty() {
            warn!("no disease has reported cases; skipping charts");
            return Ok(written);
        }

        let bar_path = out_dir.join("top_diseases.png");
        self.render_top_bar(&bar_path, totals, years)?;
        written.push(bar_path);

        let trend_path = out_dir.join("yearly_trend.png");
        self.render_yearly_trend(&trend_path, totals, years)?;
        written.push(trend_path);

        let diseases: Vec<String> = totals.iter().map(|t| t.disease.clone()).collect();
        let monthly_paths = years
            .years()
            .par_iter()
            .enumerate()
            .map(|(idx, year)| {
                let path = out_dir.join(format!("monthly_{}.png", year));
                let series = ChartPlotter::monthly_series(monthly, &diseases, idx);
                self.render_monthly(&path, *year, &series, monthly_y_range)?;
                Ok(path)
            })
            .collect::<Result<Vec<_>, RenderError>>()?;
        written.extend(monthly_paths);

        info!(charts = written.len(), dir = %out_dir.display(), "rendered charts");
        Ok(written)
    }

    /// Bar chart of `case_total` per disease, in ranking order.
    pub fn render_top_bar(
        &self,
        path: &Path,
        totals: &[DiseaseTotal],
        years: &YearSpan,
    ) -> Result<(), RenderError> {
        if totals.is_empty() {
            return Err(RenderError::NoData("top diseases bar chart".into()));
        }

        let labels: Vec<String> = totals
            .iter()
            .map(|t| ChartPlotter::short_label(&t.disease, 24))
            .collect();
        let y_max = ChartPlotter::y_upper(totals.iter().map(|t| t.case_total).max().unwrap_or(0));

        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| draw_error(path, e))?;

        let mut builder = ChartBuilder::on(&root);
        builder.margin(20).x_label_area_size(60).y_label_area_size(90);
        if self.draw_text {
            builder.caption(
                format!(
                    "Top CDC Notifiable Diseases Between {} and {}",
                    years.first, years.last
                ),
                (FONT, 30.0),
            );
        }
        let mut chart = builder
            .build_cartesian_2d((0u32..totals.len() as u32).into_segmented(), 0i64..y_max)
            .map_err(|e| draw_error(path, e))?;

        let x_formatter = |v: &SegmentValue<u32>| match v {
            SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
            _ => String::new(),
        };
        let mut mesh = chart.configure_mesh();
        mesh.disable_x_mesh();
        if self.draw_text {
            mesh.x_desc("Disease")
                .y_desc("Count")
                .axis_desc_style((FONT, 20.0))
                .label_style((FONT, 14.0))
                .x_label_formatter(&x_formatter);
        } else {
            mesh.x_labels(0).y_labels(0);
        }
        mesh.draw().map_err(|e| draw_error(path, e))?;

        chart
            .draw_series(
                Histogram::vertical(&chart)
                    .style(PALETTE[0].filled())
                    .margin(20)
                    .data(
                        totals
                            .iter()
                            .enumerate()
                            .map(|(i, t)| (i as u32, t.case_total)),
                    ),
            )
            .map_err(|e| draw_error(path, e))?;

        root.present().map_err(|e| draw_error(path, e))?;
        debug!(path = %path.display(), "wrote bar chart");
        Ok(())
    }

    /// Yearly totals, one line per disease.
    pub fn render_yearly_trend(
        &self,
        path: &Path,
        totals: &[DiseaseTotal],
        years: &YearSpan,
    ) -> Result<(), RenderError> {
        if totals.is_empty() {
            return Err(RenderError::NoData("yearly trend chart".into()));
        }

        let year_list = years.years();
        let series = ChartPlotter::yearly_series(totals, &year_list);
        let x_range = if years.first == years.last {
            (years.first - 1)..(years.last + 1)
        } else {
            years.first..years.last
        };

        let layout = LineChartLayout {
            title: "Top Diseases by Year".to_string(),
            x_desc: "Year",
            y_desc: "Cases",
            x_range,
            y_range: 0..ChartPlotter::y_upper(ChartPlotter::max_value(&series)),
            x_labels: year_list.len(),
        };
        self.render_lines(path, &layout, &series, &|y| y.to_string())
    }

    /// Monthly cases of one year, one line per disease.
    pub fn render_monthly(
        &self,
        path: &Path,
        year: i32,
        series: &[ChartSeries],
        y_range: Option<(i64, i64)>,
    ) -> Result<(), RenderError> {
        let y_range = Self::monthly_y_range(series, y_range);

        let y_desc = YearSpan::column(year);
        let layout = LineChartLayout {
            title: format!("Top Diseases by Month, {}", year),
            x_desc: "Month",
            y_desc: &y_desc,
            x_range: 1..12,
            y_range,
            x_labels: 12,
        };
        self.render_lines(path, &layout, series, &|m| {
            usize::try_from(*m - 1)
                .ok()
                .and_then(|i| MONTH_LABELS.get(i))
                .map(|s| s.to_string())
                .unwrap_or_default()
        })
    }

    fn render_lines(
        &self,
        path: &Path,
        layout: &LineChartLayout,
        series: &[ChartSeries],
        x_formatter: &dyn Fn(&i32) -> String,
    ) -> Result<(), RenderError> {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(|e| draw_error(path, e))?;

        let mut builder = ChartBuilder::on(&root);
        builder.margin(20).x_label_area_size(50).y_label_area_size(90);
        if self.draw_text {
            builder.caption(&layout.title, (FONT, 28.0));
        }
        let mut chart = builder
            .build_cartesian_2d(layout.x_range.clone(), layout.y_range.clone())
            .map_err(|e| draw_error(path, e))?;

        let mut mesh = chart.configure_mesh();
        if self.draw_text {
            mesh.x_desc(layout.x_desc)
                .y_desc(layout.y_desc)
                .x_labels(layout.x_labels)
                .axis_desc_style((FONT, 18.0))
                .x_label_formatter(x_formatter);
        } else {
            mesh.x_labels(0).y_labels(0);
        }
        mesh.draw().map_err(|e| draw_error(path, e))?;

        for (i, s) in series.iter().enumerate() {
            let color = ChartPlotter::series_color(i);
            chart
                .draw_series(LineSeries::new(
                    s.points.iter().copied(),
                    color.stroke_width(2),
                ))
                .map_err(|e| draw_error(path, e))?
                .label(ChartPlotter::short_label(&s.name, 32))
                .legend(move |(x, y)| {
                    PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2))
                });
            chart
                .draw_series(
                    s.points
                        .iter()
                        .map(|&p| Circle::new(p, 3, color.filled())),
                )
                .map_err(|e| draw_error(path, e))?;
        }

        if self.draw_text {
            chart
                .configure_series_labels()
                .position(SeriesLabelPosition::UpperRight)
                .background_style(&WHITE.mix(0.8))
                .border_style(&BLACK)
                .label_font((FONT, 14.0))
                .draw()
                .map_err(|e| draw_error(path, e))?;
        }

        root.present().map_err(|e| draw_error(path, e))?;
        debug!(path = %path.display(), series = series.len(), "wrote line chart");
        Ok(())
    }
}
