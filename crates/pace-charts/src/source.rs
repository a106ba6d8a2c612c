use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use pace_core::record::MetricRecord;
use serde::Deserialize;
use thiserror::Error;

/// Columns the upstream `pace_per_race` query is contracted to provide.
pub const REQUIRED_COLUMNS: [&str; 5] = [
    "race",
    "driver1_name",
    "driver2_name",
    "driver1_lap_cv",
    "driver2_lap_cv",
];

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("failed to open metrics table {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("metrics table is missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("malformed metrics row: {0}")]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Deserialize)]
struct PacePerRaceRow {
    race: String,
    driver1_name: String,
    driver2_name: String,
    #[serde(default)]
    driver1_lap_cv: Option<f64>,
    #[serde(default)]
    driver2_lap_cv: Option<f64>,
}

impl PacePerRaceRow {
    fn into_record(self) -> Option<MetricRecord> {
        let a_value = self.driver1_lap_cv.filter(|v| v.is_finite())?;
        let b_value = self.driver2_lap_cv.filter(|v| v.is_finite())?;
        Some(MetricRecord::new(
            self.race,
            self.driver1_name,
            self.driver2_name,
            a_value,
            b_value,
        ))
    }
}

/// Records read from the metrics table plus the rows excluded on the way.
#[derive(Debug, Default)]
pub struct LoadReport {
    pub records: Vec<MetricRecord>,
    pub dropped: usize,
}

pub fn load_records(path: &Path) -> Result<LoadReport, SourceError> {
    let file = File::open(path).map_err(|source| SourceError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    read_records(BufReader::new(file))
}

/// Parse `pace_per_race` rows. Rows missing either consistency value are
/// excluded rather than treated as errors.
pub fn read_records<R: Read>(reader: R) -> Result<LoadReport, SourceError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|header| header.eq_ignore_ascii_case(column)) {
            return Err(SourceError::MissingColumn(column));
        }
    }
    let lowered: csv::StringRecord = headers.iter().map(|h| h.to_ascii_lowercase()).collect();
    rdr.set_headers(lowered);

    let mut report = LoadReport::default();
    for result in rdr.deserialize() {
        let row: PacePerRaceRow = result?;
        match row.into_record() {
            Some(record) => report.records.push(record),
            None => report.dropped += 1,
        }
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_and_ignores_extra_columns() {
        let csv = "race,driver1_name,driver2_name,driver1_lap_cv,driver2_lap_cv,team\n\
                   Bahrain Grand Prix,HAM,BOT,0.011,0.014,Mercedes\n\
                   Monaco Grand Prix,HAM,BOT,0.020,0.018,Mercedes\n";
        let report = read_records(csv.as_bytes()).expect("load");
        assert_eq!(report.records.len(), 2);
        assert_eq!(report.dropped, 0);
        assert_eq!(
            report.records[1],
            MetricRecord::new("Monaco Grand Prix", "HAM", "BOT", 0.020, 0.018)
        );
    }

    #[test]
    fn excludes_rows_with_missing_values() {
        let csv = "race,driver1_name,driver2_name,driver1_lap_cv,driver2_lap_cv\n\
                   R1,HAM,BOT,,0.014\n\
                   R2,HAM,BOT,0.012,NaN\n\
                   R3,HAM,BOT,0.012,0.013\n";
        let report = read_records(csv.as_bytes()).expect("load");
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.dropped, 2);
        assert_eq!(report.records[0].race, "R3");
    }

    #[test]
    fn upper_case_headers_are_accepted() {
        let csv = "RACE,Driver1_Name,DRIVER2_NAME,driver1_lap_cv,DRIVER2_LAP_CV\nR1,A,B,0.1,0.2\n";
        let report = read_records(csv.as_bytes()).expect("load");
        assert_eq!(report.records.len(), 1);
    }

    #[test]
    fn missing_column_is_fatal() {
        let csv = "race,driver1_name,driver2_name,driver1_lap_cv\nR1,A,B,0.1\n";
        let err = read_records(csv.as_bytes()).expect_err("missing column");
        assert!(matches!(err, SourceError::MissingColumn("driver2_lap_cv")));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_records(Path::new("does/not/exist.csv")).expect_err("missing file");
        assert!(matches!(err, SourceError::Open { .. }));
    }
}
