use crate::error::DataError;
use linelab_core::{LineStimulus, Series, StimulusKind, Trial};
use std::fs;
use std::path::Path;
use tracing::warn;

/// Infers the stimulus kind from a header line. Tilt wins if a header
/// somehow names both attributes.
pub fn infer_kind(header: &str) -> StimulusKind {
    let header = header.to_ascii_lowercase();
    if header.contains("tilt") {
        StimulusKind::Tilt
    } else if header.contains("saturation") {
        StimulusKind::Saturation
    } else {
        StimulusKind::LengthOnly
    }
}

/// Parses one comma-separated data source into a series. The first
/// non-blank line is the header; every data row carries 4 numeric fields
/// (length, attribute, length, attribute). Non-numeric fields are rejected
/// rather than smuggled through as NaN.
pub fn parse_series(name: &str, text: &str) -> Result<Series, DataError> {
    let mut lines = text
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty());

    let (_, header) = lines.next().ok_or(DataError::Empty)?;
    let kind = infer_kind(header);

    let mut trials = Vec::new();
    for (idx, line) in lines {
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 4 {
            return Err(DataError::BadRow {
                line: idx + 1,
                found: fields.len(),
            });
        }

        let mut values = [0.0f64; 4];
        for (col, field) in fields.iter().enumerate() {
            values[col] = field.parse().map_err(|_| DataError::BadField {
                line: idx + 1,
                column: col + 1,
                value: (*field).to_string(),
            })?;
        }

        let trial = match kind {
            StimulusKind::LengthOnly => Trial::new(
                LineStimulus::plain(values[0]),
                LineStimulus::plain(values[2]),
            ),
            StimulusKind::Tilt | StimulusKind::Saturation => Trial::new(
                LineStimulus::with_attribute(values[0], values[1]),
                LineStimulus::with_attribute(values[2], values[3]),
            ),
        };
        trials.push(trial);
    }

    Ok(Series::new(name, kind, trials))
}

/// Loads `<dir>/<name>.csv` as one series.
pub fn load_series_file(dir: &Path, name: &str) -> Result<Series, DataError> {
    let text = fs::read_to_string(dir.join(format!("{name}.csv")))?;
    parse_series(name, &text)
}

/// Loads every named series in order. A series that fails to load is
/// unavailable, not fatal: it is logged and excluded from the playable set.
pub fn load_playable(dir: &Path, names: &[&str]) -> Vec<Series> {
    names
        .iter()
        .filter_map(|name| match load_series_file(dir, name) {
            Ok(series) => Some(series),
            Err(err) => {
                warn!(series = name, %err, "series unavailable, skipping");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const TILT_CSV: &str = "\
Line 1 Length,Line 1 Tilt,Line 2 Length,Line 2 Tilt
5,30,5,60
5,0,7,45
";

    #[test]
    fn infers_kind_from_header() {
        assert_eq!(infer_kind("len1,Tilt 1,len2,Tilt 2"), StimulusKind::Tilt);
        assert_eq!(
            infer_kind("len1,saturation 1,len2,saturation 2"),
            StimulusKind::Saturation
        );
        assert_eq!(infer_kind("len1,len2"), StimulusKind::LengthOnly);
    }

    #[test]
    fn parses_tilt_rows() {
        let series = parse_series("Series-1a", TILT_CSV).unwrap();
        assert_eq!(series.kind, StimulusKind::Tilt);
        assert_eq!(series.len(), 2);
        assert_eq!(series.trials[0].first.length, 5.0);
        assert_eq!(series.trials[0].first.attribute, Some(30.0));
        assert_eq!(series.trials[1].second.length, 7.0);
        assert_eq!(series.trials[1].second.attribute, Some(45.0));
    }

    #[test]
    fn length_only_rows_keep_fields_one_and_three() {
        let series = parse_series("plain", "a,b,c,d\n3,0,4,0\n").unwrap();
        assert_eq!(series.kind, StimulusKind::LengthOnly);
        assert_eq!(series.trials[0].first, LineStimulus::plain(3.0));
        assert_eq!(series.trials[0].second, LineStimulus::plain(4.0));
    }

    #[test]
    fn blank_lines_are_skipped() {
        let series = parse_series("s", "h,tilt,h,tilt\n\n5,1,5,2\n\n").unwrap();
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn non_numeric_field_is_rejected() {
        let err = parse_series("s", "h,tilt,h,tilt\n5,oops,5,2\n").unwrap_err();
        match err {
            DataError::BadField { line, column, value } => {
                assert_eq!(line, 2);
                assert_eq!(column, 2);
                assert_eq!(value, "oops");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn short_row_is_rejected() {
        assert!(matches!(
            parse_series("s", "h,tilt,h,tilt\n5,1,5\n"),
            Err(DataError::BadRow { line: 2, found: 3 })
        ));
    }

    #[test]
    fn empty_source_is_rejected() {
        assert!(matches!(parse_series("s", "  \n"), Err(DataError::Empty)));
    }

    #[test]
    fn missing_file_is_skipped_by_load_playable() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("ok.csv"), TILT_CSV).unwrap();

        let playable = load_playable(dir.path(), &["missing", "ok"]);
        assert_eq!(playable.len(), 1);
        assert_eq!(playable[0].name, "ok");
    }
}
