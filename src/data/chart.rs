//! Chart data accumulation for the `widget-data-*` directives.

use super::widget::{ChartData, ChartSeries, Scalar};

/// Split a directive value into tokens.
///
/// Commas separate tokens when present, otherwise whitespace does.
pub fn split_tokens(value: &str) -> Vec<&str> {
    if value.contains(',') {
        value.split(',').map(str::trim).collect()
    } else {
        value.split_whitespace().collect()
    }
}

fn coerce_row(tokens: &[&str]) -> Vec<Scalar> {
    tokens.iter().map(|t| Scalar::coerce(t)).collect()
}

/// Builds [`ChartData`] for one message.
///
/// The chart structure is only allocated once a chart directive is seen,
/// so messages without chart directives keep `chart: None`.
#[derive(Debug, Default)]
pub struct ChartAccumulator {
    data: Option<ChartData>,
}

impl ChartAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    fn data(&mut self) -> &mut ChartData {
        self.data.get_or_insert_with(ChartData::default)
    }

    /// `widget-data-labels:` replaces the labels.
    pub fn set_labels(&mut self, value: &str) {
        self.data().labels = split_tokens(value).into_iter().map(str::to_string).collect();
    }

    /// `widget-data-serie:` replaces the series with one flat list.
    pub fn set_flat_series(&mut self, value: &str) {
        self.data().series = ChartSeries::Flat(coerce_row(&split_tokens(value)));
    }

    /// `widget-data-series:` appends a row.
    ///
    /// A flat series set earlier is replaced by a fresh row set.
    pub fn push_series_row(&mut self, value: &str) {
        let row = coerce_row(&split_tokens(value));
        let data = self.data();
        if let ChartSeries::Rows(rows) = &mut data.series {
            rows.push(row);
        } else {
            data.series = ChartSeries::Rows(vec![row]);
        }
    }

    pub fn finish(self) -> Option<ChartData> {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_tokens() {
        assert_eq!(split_tokens("a, b ,c"), vec!["a", "b", "c"]);
        assert_eq!(split_tokens("a b  c"), vec!["a", "b", "c"]);
        assert!(split_tokens("").is_empty());
    }

    #[test]
    fn test_untouched_accumulator_has_no_chart() {
        assert!(ChartAccumulator::new().finish().is_none());
    }

    #[test]
    fn test_labels_replace() {
        let mut acc = ChartAccumulator::new();
        acc.set_labels("mon,tue");
        acc.set_labels("wed thu fri");

        let data = acc.finish().unwrap();
        assert_eq!(data.labels, vec!["wed", "thu", "fri"]);
        assert!(data.series.is_empty());
    }

    #[test]
    fn test_flat_series_coerced() {
        let mut acc = ChartAccumulator::new();
        acc.set_flat_series("1,2, x");

        let data = acc.finish().unwrap();
        assert_eq!(
            data.series,
            ChartSeries::Flat(vec![Scalar::Int(1), Scalar::Int(2), Scalar::Text("x".to_string())])
        );
    }

    #[test]
    fn test_series_rows_append_coerced() {
        let mut acc = ChartAccumulator::new();
        acc.push_series_row("1 2 3");
        acc.push_series_row("4, 5,six");

        let data = acc.finish().unwrap();
        assert_eq!(
            data.series,
            ChartSeries::Rows(vec![
                vec![Scalar::Int(1), Scalar::Int(2), Scalar::Int(3)],
                vec![Scalar::Int(4), Scalar::Int(5), Scalar::Text("six".to_string())],
            ])
        );
    }

    #[test]
    fn test_rows_after_flat_start_fresh() {
        let mut acc = ChartAccumulator::new();
        acc.set_flat_series("1 2");
        acc.push_series_row("3 4");

        let data = acc.finish().unwrap();
        assert_eq!(data.series.rows().len(), 1);
        assert_eq!(data.series.rows()[0], &[Scalar::Int(3), Scalar::Int(4)][..]);
    }
}
