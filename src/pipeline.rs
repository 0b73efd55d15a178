//! Report Pipeline
//! Load -> clean -> aggregate -> render -> write, for one input file.

use crate::charts::StaticChartRenderer;
use crate::config::Settings;
use crate::data::{normalize_columns, CleaningReport, DataLoader, DataProcessor};
use crate::report::{ReportFrames, ReportSummary, ReportWriter};
use crate::stats::{DiseaseTotal, MonthlyCases, StatsCalculator, WeeklyStats};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::{info, info_span};

/// What one run produced.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub cleaning: CleaningReport,
    pub top_diseases: Vec<DiseaseTotal>,
    pub monthly: Vec<MonthlyCases>,
    pub weekly_stats: Vec<WeeklyStats>,
    pub weeks_without_month: usize,
    pub files: Vec<PathBuf>,
}

pub fn run(settings: &Settings) -> Result<PipelineOutcome> {
    settings.validate().context("invalid settings")?;

    let span = info_span!("report", input = %settings.input.display());
    let _enter = span.enter();
    let years = &settings.years;

    let loader = DataLoader::new(&settings.input);
    let mut raw = loader
        .load_csv()
        .with_context(|| format!("loading {}", loader.file_path().display()))?;
    normalize_columns(&mut raw).context("normalizing column headers")?;

    let (clean, cleaning) = DataProcessor::clean(raw, years, &settings.drop_columns)
        .context("cleaning NNDSS records")?;

    let sums = StatsCalculator::sum_by_disease(&clean, years)?;
    let top = StatsCalculator::rank_top_n(&sums, settings.top_n)?;
    let top_diseases = StatsCalculator::disease_totals(&top, years)?;
    let names: Vec<String> = top_diseases.iter().map(|t| t.disease.clone()).collect();
    info!(top = ?names, "ranked top diseases");

    let (with_month, weeks_without_month) =
        StatsCalculator::with_month(&clean, years, settings.reference_year)?;
    let top_rows = StatsCalculator::filter_diseases(&with_month, &names)?;
    let by_month = StatsCalculator::sum_by_month(&top_rows, years)?;
    let monthly = StatsCalculator::monthly_cases(&by_month, years)?;

    let weekly_stats = StatsCalculator::compute_all_weekly_stats(&clean, &names, years)
        .context("computing weekly statistics")?;

    let writer = ReportWriter::new(&settings.output_dir).context("creating output directory")?;
    let summary = ReportSummary {
        settings,
        cleaning: &cleaning,
        weeks_without_month,
        top_diseases: &top_diseases,
        monthly: &monthly,
        weekly_stats: &weekly_stats,
    };
    let frames = ReportFrames {
        cleaned: &clean,
        totals: &sums,
        monthly: &by_month,
    };
    let mut files = writer
        .write_all(&summary, &frames)
        .context("writing report files")?;

    if settings.render_charts {
        let renderer = StaticChartRenderer::new(settings.chart_width, settings.chart_height);
        let charts = renderer
            .render_report(
                writer.out_dir(),
                &top_diseases,
                &monthly,
                years,
                settings.monthly_y_range,
            )
            .context("rendering charts")?;
        files.extend(charts);
    }

    info!(files = files.len(), "report complete");
    Ok(PipelineOutcome {
        cleaning,
        top_diseases,
        monthly,
        weekly_stats,
        weeks_without_month,
        files,
    })
}
