use crate::types::{SummaryError, SummaryResult};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Summary statistics found in the header of a DEM difference file.
///
/// The difference tools prefix their CSV output with comment lines such as
/// `# Mean difference: 0.512`. Only the mean is required to be present.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DiffStats {
    pub max: Option<f64>,
    pub min: Option<f64>,
    pub mean: f64,
    pub std_dev: Option<f64>,
}

impl DiffStats {
    /// Parse the header of a difference file on disk
    pub fn read<P: AsRef<Path>>(path: P) -> SummaryResult<Self> {
        let file = File::open(path.as_ref())?;
        Self::parse(BufReader::new(file)).map_err(|e| match e {
            SummaryError::InvalidFormat(msg) => {
                SummaryError::InvalidFormat(format!("{}: {}", path.as_ref().display(), msg))
            }
            other => other,
        })
    }

    /// Parse difference statistics from any buffered reader
    pub fn parse<R: BufRead>(reader: R) -> SummaryResult<Self> {
        let mut max = None;
        let mut min = None;
        let mut mean = None;
        let mut std_dev = None;

        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            // Statistics live in the leading comment block only
            if !trimmed.starts_with('#') {
                break;
            }

            let slot = if trimmed.contains("StdDev") {
                &mut std_dev
            } else if trimmed.contains("Mean") {
                &mut mean
            } else if trimmed.contains("Max") {
                &mut max
            } else if trimmed.contains("Min") {
                &mut min
            } else {
                continue;
            };
            *slot = Some(parse_value(trimmed)?);
        }

        let mean = mean.ok_or_else(|| {
            SummaryError::InvalidFormat("no Mean entry in difference header".to_string())
        })?;

        Ok(DiffStats {
            max,
            min,
            mean,
            std_dev,
        })
    }
}

fn parse_value(line: &str) -> SummaryResult<f64> {
    let value = line
        .rsplit(':')
        .next()
        .map(str::trim)
        .filter(|v| !v.is_empty() && line.contains(':'))
        .ok_or_else(|| SummaryError::InvalidFormat(format!("missing value in '{}'", line)))?;

    value
        .parse::<f64>()
        .map_err(|e| SummaryError::InvalidFormat(format!("bad value in '{}': {}", line, e)))
}
