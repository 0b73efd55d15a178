//! NNDSS Report - command line entry point.

use anyhow::{Context, Result};
use clap::Parser;
use nndss_report::{logging, pipeline, Settings, YearSpan};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nndss_report")]
#[command(about = "Clean CDC NNDSS Table I data and chart the top reported diseases")]
#[command(version)]
struct Cli {
    /// NNDSS CSV export to read
    input: Option<PathBuf>,
    /// TOML settings file; command line flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Directory for charts and report files
    #[arg(short, long)]
    output_dir: Option<PathBuf>,
    /// Number of top diseases to chart
    #[arg(short = 'n', long)]
    top_n: Option<usize>,
    #[arg(long)]
    first_year: Option<i32>,
    #[arg(long)]
    last_year: Option<i32>,
    /// Year whose calendar maps MMWR weeks to months
    #[arg(long)]
    reference_year: Option<i32>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    /// Write only the JSON/CSV reports
    #[arg(long)]
    no_charts: bool,
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn into_settings(self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::from_file(path)
                .with_context(|| format!("reading settings from {}", path.display()))?,
            None => Settings::default(),
        };

        if let Some(input) = self.input {
            settings.input = input;
        }
        if let Some(dir) = self.output_dir {
            settings.output_dir = dir;
        }
        if let Some(n) = self.top_n {
            settings.top_n = n;
        }
        settings.years = YearSpan {
            first: self.first_year.unwrap_or(settings.years.first),
            last: self.last_year.unwrap_or(settings.years.last),
        };
        if let Some(year) = self.reference_year {
            settings.reference_year = year;
        }
        if let Some(width) = self.width {
            settings.chart_width = width;
        }
        if let Some(height) = self.height {
            settings.chart_height = height;
        }
        if self.no_charts {
            settings.render_charts = false;
        }
        Ok(settings)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let settings = cli.into_settings()?;
    let outcome = pipeline::run(&settings)?;

    println!(
        "Top {} diseases, {}-{}:",
        outcome.top_diseases.len(),
        settings.years.first,
        settings.years.last
    );
    for (rank, total) in outcome.top_diseases.iter().enumerate() {
        println!("{:>3}. {:<50} {:>10}", rank + 1, total.disease, total.case_total);
    }
    println!("\nWrote {} files to {}", outcome.files.len(), settings.output_dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nndss.toml");
        fs::write(
            &path,
            "input = \"from_file.csv\"\ntop_n = 3\nreference_year = 2015\n\n[years]\nfirst = 2014\nlast = 2016\n",
        )
        .unwrap();
        let config = path.to_string_lossy().to_string();

        let cli = Cli::parse_from([
            "nndss_report",
            "--config",
            config.as_str(),
            "-n",
            "7",
            "--last-year",
            "2017",
            "--no-charts",
        ]);
        let settings = cli.into_settings().unwrap();

        assert_eq!(settings.top_n, 7);
        assert_eq!(settings.years.first, 2014);
        assert_eq!(settings.years.last, 2017);
        assert_eq!(settings.reference_year, 2015);
        assert_eq!(settings.input, PathBuf::from("from_file.csv"));
        assert!(!settings.render_charts);
    }

    #[test]
    fn defaults_apply_without_config() {
        let cli = Cli::parse_from(["nndss_report", "input.csv"]);
        let settings = cli.into_settings().unwrap();

        assert_eq!(settings.input, PathBuf::from("input.csv"));
        assert_eq!(settings.top_n, Settings::default().top_n);
        assert!(settings.render_charts);
    }

    #[test]
    fn missing_config_file_is_an_error() {
        let cli = Cli::parse_from(["nndss_report", "--config", "/nonexistent/nndss.toml"]);
        assert!(cli.into_settings().is_err());
    }
}
