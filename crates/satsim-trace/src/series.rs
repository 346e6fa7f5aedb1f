//! Numeric trace series loaded from text files.

use crate::{Result, TraceError};
use statrs::statistics::Statistics;
use std::io::BufRead;
use std::path::Path;

/// An immutable table of numeric samples, one row per line of the source file.
#[derive(Debug, Clone, PartialEq)]
pub struct TraceSeries {
    columns: usize,
    /// Row-major sample storage.
    data: Vec<f64>,
}

/// Summary statistics of one column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesStatistics {
    /// Number of samples.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation (NaN with fewer than two samples).
    pub std_dev: f64,
    /// Smallest sample.
    pub min: f64,
    /// Largest sample.
    pub max: f64,
}

impl TraceSeries {
    /// Build a series from rows. Every row must have `columns` values.
    pub fn from_rows(columns: usize, rows: &[Vec<f64>]) -> Result<Self> {
        let mut data = Vec::with_capacity(columns * rows.len());
        for (i, row) in rows.iter().enumerate() {
            if row.len() != columns {
                return Err(TraceError::Parse {
                    path: "<memory>".into(),
                    line: i + 1,
                    reason: format!("expected {} columns, got {}", columns, row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self { columns, data })
    }

    /// Load a series from a file.
    pub fn from_file(path: &Path, columns: usize) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| TraceError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(std::io::BufReader::new(file), path, columns)
    }

    /// Parse a series from a reader. `path` is only used in error messages.
    pub fn from_reader<R: BufRead>(reader: R, path: &Path, columns: usize) -> Result<Self> {
        let mut data = Vec::new();

        for (index, line) in reader.lines().enumerate() {
            let line_no = index + 1;
            let line = line.map_err(|source| TraceError::Io {
                path: path.to_path_buf(),
                source,
            })?;

            let content = line.split('#').next().unwrap_or("").trim();
            if content.is_empty() {
                continue;
            }

            let mut count = 0;
            for field in content
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|f| !f.is_empty())
            {
                let value: f64 = field.parse().map_err(|_| TraceError::Parse {
                    path: path.to_path_buf(),
                    line: line_no,
                    reason: format!("'{}' is not a number", field),
                })?;
                data.push(value);
                count += 1;
            }

            if count != columns {
                return Err(TraceError::Parse {
                    path: path.to_path_buf(),
                    line: line_no,
                    reason: format!("expected {} columns, got {}", columns, count),
                });
            }
        }

        Ok(Self { columns, data })
    }

    /// Number of columns per row.
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        if self.columns == 0 {
            0
        } else {
            self.data.len() / self.columns
        }
    }

    /// Whether the series has no rows.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Row `index`, if present.
    pub fn row(&self, index: usize) -> Option<&[f64]> {
        if index >= self.len() {
            return None;
        }
        let start = index * self.columns;
        Some(&self.data[start..start + self.columns])
    }

    /// Iterate over one column.
    pub fn column(&self, column: usize) -> Result<impl Iterator<Item = f64> + '_> {
        self.check_column(column)?;
        Ok(self.data.iter().skip(column).step_by(self.columns).copied())
    }

    /// Index of the row at or after `from` whose time (column 0) is closest to `time_s`.
    ///
    /// Never returns an index before `from`. Returns `None` when `from` is past the end.
    pub fn closest_index_from(&self, from: usize, time_s: f64) -> Option<usize> {
        let mut best = from;
        let mut best_distance = (self.row(best)?[0] - time_s).abs();
        while let Some(next) = self.row(best + 1) {
            let distance = (next[0] - time_s).abs();
            if distance > best_distance {
                break;
            }
            best += 1;
            best_distance = distance;
        }
        Some(best)
    }

    /// Summary statistics of one column.
    pub fn statistics(&self, column: usize) -> Result<SeriesStatistics> {
        let values: Vec<f64> = self.column(column)?.collect();
        Ok(SeriesStatistics {
            count: values.len(),
            mean: values.iter().mean(),
            std_dev: values.iter().std_dev(),
            min: Statistics::min(values.iter()),
            max: Statistics::max(values.iter()),
        })
    }

    /// Mean power of a column holding dB values, averaged in the linear domain.
    pub fn mean_power_db(&self, column: usize) -> Result<f64> {
        let linear: Vec<f64> = self
            .column(column)?
            .map(|db| 10f64.powf(db / 10.0))
            .collect();
        Ok(10.0 * linear.iter().mean().log10())
    }

    fn check_column(&self, column: usize) -> Result<()> {
        if column >= self.columns {
            return Err(TraceError::ColumnOutOfRange {
                column,
                columns: self.columns,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn parse(text: &str, columns: usize) -> Result<TraceSeries> {
        TraceSeries::from_reader(text.as_bytes(), Path::new("test.dat"), columns)
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let series = parse("# time value\n0.0 1.5\n\n0.1, 2.5  # inline\n0.2\t3.5\n", 2).unwrap();
        assert_eq!(series.len(), 3);
        assert_eq!(series.row(1), Some(&[0.1, 2.5][..]));
        assert_eq!(series.row(3), None);
    }

    #[test]
    fn test_parse_rejects_wrong_column_count() {
        let err = parse("0.0 1.0\n0.1 2.0 3.0\n", 2).unwrap_err();
        match err {
            TraceError::Parse { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(matches!(parse("0.0 abc\n", 2), Err(TraceError::Parse { line: 1, .. })));
    }

    #[test]
    fn test_statistics() {
        let series = parse("0 1\n1 2\n2 3\n3 4\n", 2).unwrap();
        let stats = series.statistics(1).unwrap();
        assert_eq!(stats.count, 4);
        assert_relative_eq!(stats.mean, 2.5);
        assert_relative_eq!(stats.std_dev, 1.2909944487358056, epsilon = 1e-12);
        assert_relative_eq!(stats.min, 1.0);
        assert_relative_eq!(stats.max, 4.0);
        assert!(matches!(
            series.statistics(2),
            Err(TraceError::ColumnOutOfRange { column: 2, columns: 2 })
        ));
    }

    #[test]
    fn test_mean_power_db_averages_linear_power() {
        // 0 dB and 10 dB -> (1 + 10) / 2 = 5.5 -> 7.40 dB
        let series = parse("0 0\n1 10\n", 2).unwrap();
        assert_relative_eq!(series.mean_power_db(1).unwrap(), 10.0 * 5.5f64.log10(), epsilon = 1e-12);
    }

    #[test]
    fn test_closest_index_is_monotonic() {
        let series = parse("0.0 0\n0.1 0\n0.2 0\n0.3 0\n", 2).unwrap();
        assert_eq!(series.closest_index_from(0, 0.16), Some(2));
        assert_eq!(series.closest_index_from(0, 10.0), Some(3));
        // Never moves backwards.
        assert_eq!(series.closest_index_from(2, 0.0), Some(2));
        assert_eq!(series.closest_index_from(4, 0.0), None);
    }
}
