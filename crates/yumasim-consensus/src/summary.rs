// crates/yumasim-consensus/src/summary.rs
//
// Total-dividends table across cases and Yuma versions.
//
// One row per case, one column per (validator, version) pair. Synthetic
// cases label validators positionally ("Validator A", "Validator B", ...) so
// rows from different cases line up; replayed metagraphs keep their hotkeys.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use yumasim_core::{Case, SimulationHyperparameters, YumaConfig, YumaError, YumaParams};

use crate::simulation::run_simulation;
use crate::version::YumaVersion;

/// How validators are labelled in column names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidatorLabels {
    /// "Validator A", "Validator B", ... by position in the case.
    Positional,
    /// The case's own validator names.
    Names,
}

/// One row of the table.
#[derive(Debug, Clone, Serialize)]
pub struct DividendsRow {
    pub case: String,
    /// Total dividends keyed by column name.
    pub values: HashMap<String, f64>,
}

/// Total dividends for every (case, version) pair.
#[derive(Debug, Clone, Serialize)]
pub struct DividendsTable {
    /// Column names after the leading "Case" column.
    pub columns: Vec<String>,
    pub rows: Vec<DividendsRow>,
}

impl DividendsTable {
    /// Value of `column` in `row`, 0.0 when the case has no such validator.
    pub fn value(&self, row: usize, column: &str) -> f64 {
        self.rows[row].values.get(column).copied().unwrap_or(0.0)
    }

    /// Header followed by one line per case, values with six decimals.
    pub fn to_csv(&self) -> Result<String, YumaError> {
        let mut wtr = csv::Writer::from_writer(vec![]);

        let header = std::iter::once("Case").chain(self.columns.iter().map(String::as_str));
        wtr.write_record(header).map_err(csv_error)?;

        for (i, row) in self.rows.iter().enumerate() {
            let mut record = vec![row.case.clone()];
            record.extend(self.columns.iter().map(|c| format!("{:.6}", self.value(i, c))));
            wtr.write_record(&record).map_err(csv_error)?;
        }

        wtr.flush()?;
        let bytes = wtr
            .into_inner()
            .map_err(|e| YumaError::Serialization(format!("CSV writer: {}", e)))?;
        String::from_utf8(bytes)
            .map_err(|e| YumaError::Serialization(format!("CSV is not UTF-8: {}", e)))
    }
}

fn csv_error(e: csv::Error) -> YumaError {
    YumaError::Serialization(format!("CSV: {}", e))
}

/// "Validator A", "Validator B", ... for position `i`.
pub fn positional_label(i: usize) -> String {
    let letter = char::from_u32('A' as u32 + i as u32).unwrap_or('?');
    format!("Validator {}", letter)
}

/// Run every case under every version and collect total dividends.
///
/// # Arguments
/// * `cases` - Cases to simulate, one table row each.
/// * `versions` - Versions with the parameters each runs under.
/// * `simulation` - Hyperparameters shared by all runs.
/// * `labels` - How validators are named in the column headers.
pub fn total_dividends_table(
    cases: &[Box<dyn Case>],
    versions: &[(YumaVersion, YumaParams)],
    simulation: &SimulationHyperparameters,
    labels: ValidatorLabels,
) -> Result<DividendsTable, YumaError> {
    let mut columns_per_version: Vec<BTreeSet<String>> = vec![BTreeSet::new(); versions.len()];
    let mut rows = Vec::with_capacity(cases.len());

    for case in cases {
        let mut values = HashMap::new();

        for ((version, params), columns) in versions.iter().zip(columns_per_version.iter_mut()) {
            let config = YumaConfig::new(simulation.clone(), params.clone());
            let totals = run_simulation(case.as_ref(), *version, &config)?.total_dividends();

            for (i, validator) in case.validators().iter().enumerate() {
                let label = match labels {
                    ValidatorLabels::Positional => positional_label(i),
                    ValidatorLabels::Names => validator.clone(),
                };
                let column = format!("{} - {}", label, version);
                values.insert(column.clone(), totals.total(validator));
                columns.insert(column);
            }
        }

        rows.push(DividendsRow {
            case: case.name().to_string(),
            values,
        });
    }

    Ok(DividendsTable {
        columns: columns_per_version.into_iter().flatten().collect(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_labels() {
        assert_eq!(positional_label(0), "Validator A");
        assert_eq!(positional_label(2), "Validator C");
    }

    #[test]
    fn test_csv_layout() {
        let table = DividendsTable {
            columns: vec!["Validator A - Yuma 1 (paper)".into(), "Validator B - Yuma 1 (paper)".into()],
            rows: vec![DividendsRow {
                case: "Case 1".into(),
                values: [("Validator A - Yuma 1 (paper)".to_string(), 1.5)].into_iter().collect(),
            }],
        };
        let csv = table.to_csv().unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Case,Validator A - Yuma 1 (paper),Validator B - Yuma 1 (paper)")
        );
        assert_eq!(lines.next(), Some("Case 1,1.500000,0.000000"));
    }

    #[test]
    fn test_csv_quotes_commas() {
        let table = DividendsTable {
            columns: vec!["hk,1 - Yuma 3 (Rhef)".into()],
            rows: vec![DividendsRow {
                case: "say \"hi\"".into(),
                values: [("hk,1 - Yuma 3 (Rhef)".to_string(), 0.25)].into_iter().collect(),
            }],
        };
        let csv = table.to_csv().unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("Case,\"hk,1 - Yuma 3 (Rhef)\""));
        assert_eq!(lines.next(), Some("\"say \"\"hi\"\"\",0.250000"));
    }
}
