//! Chart Plotter Module
//! Turns aggregates into plottable series: colors, labels, points, axis ranges.

use crate::stats::{DiseaseTotal, MonthlyCases};
use plotters::style::RGBColor;

pub const PALETTE: [RGBColor; 10] = [
    RGBColor(52, 152, 219),  // Blue
    RGBColor(231, 76, 60),   // Red
    RGBColor(46, 204, 113),  // Green
    RGBColor(155, 89, 182),  // Purple
    RGBColor(243, 156, 18),  // Orange
    RGBColor(26, 188, 156),  // Teal
    RGBColor(233, 30, 99),   // Pink
    RGBColor(0, 188, 212),   // Cyan
    RGBColor(121, 85, 72),   // Brown
    RGBColor(96, 125, 139),  // Blue Grey
];

/// One named line of (x, cases) points.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub points: Vec<(i32, i64)>,
}

/// Creates chart series from aggregated case counts.
pub struct ChartPlotter;

impl ChartPlotter {
    /// Color for the series at `index`, stable across all charts of a run.
    pub fn series_color(index: usize) -> RGBColor {
        PALETTE[index % PALETTE.len()]
    }

    /// Shorten long disease names for axis ticks and legends.
    pub fn short_label(name: &str, max_chars: usize) -> String {
        if name.chars().count() <= max_chars {
            return name.to_string();
        }
        let head: String = name.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head.trim_end())
    }

    /// Upper y bound: the maximum plus 10% headroom, rounded up to a nice step.
    pub fn y_upper(max: i64) -> i64 {
        if max <= 0 {
            return 1;
        }
        let padded = max as f64 * 1.1;
        let step = Self::nice_step(padded, 8);
        ((padded / step).ceil() * step) as i64
    }

    fn nice_step(range: f64, target_steps: usize) -> f64 {
        let raw_step = range / target_steps as f64;
        let magnitude = 10f64.powf(raw_step.log10().floor());
        let normalized = raw_step / magnitude;

        let nice = if normalized <= 1.0 {
            1.0
        } else if normalized <= 2.0 {
            2.0
        } else if normalized <= 5.0 {
            5.0
        } else {
            10.0
        };

        (nice * magnitude).max(1.0)
    }

    /// One series per disease: x = year, y = that year's total.
    pub fn yearly_series(totals: &[DiseaseTotal], years: &[i32]) -> Vec<ChartSeries> {
        totals
            .iter()
            .map(|t| ChartSeries {
                name: t.disease.clone(),
                points: years.iter().copied().zip(t.yearly.iter().copied()).collect(),
            })
            .collect()
    }

    /// One series per disease in `diseases` order: x = month, y = cases in
    /// the year at `year_index`. Months without records are absent.
    pub fn monthly_series(
        monthly: &[MonthlyCases],
        diseases: &[String],
        year_index: usize,
    ) -> Vec<ChartSeries> {
        diseases
            .iter()
            .map(|disease| {
                let mut points: Vec<(i32, i64)> = monthly
                    .iter()
                    .filter(|m| &m.disease == disease)
                    .filter_map(|m| Some((m.month as i32, *m.yearly.get(year_index)?)))
                    .collect();
                points.sort_by_key(|(month, _)| *month);
                ChartSeries {
                    name: disease.clone(),
                    points,
                }
            })
            .collect()
    }

    pub fn max_value(series: &[ChartSeries]) -> i64 {
        series
            .iter()
            .flat_map(|s| s.points.iter().map(|(_, y)| *y))
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_label_truncates_long_names() {
        assert_eq!(ChartPlotter::short_label("Listeriosis", 20), "Listeriosis");
        assert_eq!(
            ChartPlotter::short_label("Hemolytic uremic syndrome, postdiarrheal", 20),
            "Hemolytic uremic..."
        );
    }

    #[test]
    fn y_upper_leaves_headroom() {
        assert_eq!(ChartPlotter::y_upper(0), 1);
        assert!(ChartPlotter::y_upper(59005) >= 59005);
        assert_eq!(ChartPlotter::y_upper(90), 100);
        assert_eq!(ChartPlotter::y_upper(3), 4);
    }

    #[test]
    fn yearly_series_pairs_years_with_totals() {
        let totals = vec![DiseaseTotal {
            disease: "Listeriosis".into(),
            yearly: vec![38220, 39988],
            case_total: 78208,
        }];
        let series = ChartPlotter::yearly_series(&totals, &[2013, 2014]);

        assert_eq!(series.len(), 1);
        assert_eq!(series[0].points, vec![(2013, 38220), (2014, 39988)]);
        assert_eq!(ChartPlotter::max_value(&series), 39988);
    }

    #[test]
    fn monthly_series_selects_year_column() {
        let monthly = vec![
            MonthlyCases {
                month: 2,
                disease: "a".into(),
                yearly: vec![5, 6],
            },
            MonthlyCases {
                month: 1,
                disease: "a".into(),
                yearly: vec![1, 2],
            },
            MonthlyCases {
                month: 1,
                disease: "b".into(),
                yearly: vec![7, 8],
            },
        ];
        let diseases = vec!["b".to_string(), "a".to_string()];
        let series = ChartPlotter::monthly_series(&monthly, &diseases, 1);

        assert_eq!(series[0].name, "b");
        assert_eq!(series[0].points, vec![(1, 8)]);
        assert_eq!(series[1].points, vec![(1, 2), (2, 6)]);
    }

    #[test]
    fn series_color_wraps_palette() {
        let (a, b) = (ChartPlotter::series_color(0), ChartPlotter::series_color(10));
        assert_eq!((a.0, a.1, a.2), (b.0, b.1, b.2));
    }
}
