//! Semicolon-separated tuning log.
//!
//! One file per run.  Header: `timestamp;cost;<param>...` plus three timing
//! columns when enabled.  One row per evaluation, ISO-8601 local timestamps
//! with millisecond precision, costs printed with full roundtrip precision.

use std::fs::File;
use std::path::Path;

use at_types::{Configuration, TunerError, TunerResult};
use chrono::{DateTime, Local};
use csv::{Writer, WriterBuilder};

/// Per-evaluation timing breakdown, all in milliseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct EvaluationTiming {
    pub get_next_config_ms: u128,
    pub cost_function_ms: u128,
    pub report_cost_ms: u128,
}

/// CSV writer for one tuning run.
pub struct TuningLog {
    writer: Writer<File>,
    with_timing: bool,
    rows: usize,
}

impl TuningLog {
    /// Create the log file and write the header row.
    pub fn create<P: AsRef<Path>>(
        path: P,
        param_names: &[String],
        with_timing: bool,
    ) -> TunerResult<Self> {
        let mut writer = WriterBuilder::new()
            .delimiter(b';')
            .from_path(path.as_ref())
            .map_err(csv_err)?;

        let mut header: Vec<&str> = vec!["timestamp", "cost"];
        header.extend(param_names.iter().map(String::as_str));
        if with_timing {
            header.extend([
                "get_next_config_ms",
                "cost_function_ms",
                "report_cost_ms",
            ]);
        }
        writer.write_record(&header).map_err(csv_err)?;

        Ok(Self {
            writer,
            with_timing,
            rows: 0,
        })
    }

    /// Append one evaluation row.
    pub fn append(
        &mut self,
        cost: f64,
        configuration: &Configuration,
        timing: EvaluationTiming,
    ) -> TunerResult<()> {
        let mut record: Vec<String> = Vec::with_capacity(2 + configuration.len() + 3);
        record.push(timestamp_str(Local::now()));
        record.push(cost.to_string());
        record.extend(configuration.values().map(ToString::to_string));
        if self.with_timing {
            record.push(timing.get_next_config_ms.to_string());
            record.push(timing.cost_function_ms.to_string());
            record.push(timing.report_cost_ms.to_string());
        }
        self.writer.write_record(&record).map_err(csv_err)?;
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far (header excluded).
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Flush and close the file.
    pub fn close(mut self) -> TunerResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}

fn csv_err(err: csv::Error) -> TunerError {
    TunerError::Csv(err.to_string())
}

/// ISO-8601 local timestamp with millisecond precision.
pub fn timestamp_str(now: DateTime<Local>) -> String {
    now.format("%Y-%m-%dT%H:%M:%S%.3f").to_string()
}

/// Log-file name used when the caller did not choose one.
pub fn default_log_file(start: DateTime<Local>) -> String {
    format!("tuning_log_{}.csv", timestamp_str(start))
}

#[cfg(test)]
mod tests {
    use super::*;
    use at_types::Value;

    fn sample_config() -> Configuration {
        let mut config = Configuration::new();
        config.push("M", Value::Int(4));
        config.push("N", Value::Int(2));
        config
    }

    #[test]
    fn writes_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let names = vec!["M".to_string(), "N".to_string()];

        let mut log = TuningLog::create(&path, &names, true).unwrap();
        log.append(12.5, &sample_config(), EvaluationTiming::default())
            .unwrap();
        log.append(
            at_types::INVALID_COST,
            &sample_config(),
            EvaluationTiming {
                get_next_config_ms: 1,
                cost_function_ms: 20,
                report_cost_ms: 0,
            },
        )
        .unwrap();
        assert_eq!(log.rows(), 2);
        log.close().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "timestamp;cost;M;N;get_next_config_ms;cost_function_ms;report_cost_ms"
        );
        // 2 fixed + 2 params + 3 timing columns
        assert_eq!(lines[1].split(';').count(), 7);
        assert!(lines[1].contains(";12.5;4;2;"));
        // the sentinel cost is written out as a plain number
        assert!(lines[2].contains(&at_types::INVALID_COST.to_string()));
    }

    #[test]
    fn timing_columns_are_optional() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.csv");
        let names = vec!["M".to_string(), "N".to_string()];

        let mut log = TuningLog::create(&path, &names, false).unwrap();
        log.append(1.0, &sample_config(), EvaluationTiming::default())
            .unwrap();
        log.close().unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "timestamp;cost;M;N");
        assert_eq!(lines[1].split(';').count(), 4);
    }

    #[test]
    fn costs_roundtrip_through_the_log() {
        let cost = 0.123456789012345678_f64;
        assert_eq!(cost.to_string().parse::<f64>().unwrap(), cost);
    }

    #[test]
    fn default_file_name_carries_the_timestamp() {
        let name = default_log_file(Local::now());
        assert!(name.starts_with("tuning_log_"));
        assert!(name.ends_with(".csv"));
    }
}
