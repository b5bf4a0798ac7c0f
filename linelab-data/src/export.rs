use crate::error::DataError;
use chrono::SecondsFormat;
use linelab_core::{LineStimulus, SeriesRecords, StimulusKind, TrialRecord};
use std::fmt::Write as _;
use std::io::{Seek, Write};
use tracing::info;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

fn header(kind: StimulusKind) -> &'static str {
    match kind {
        StimulusKind::Tilt => {
            "Trial,Line 1 Length,Line 1 Tilt,Line 2 Length,Line 2 Tilt,\
             Ground Truth,Your Response,Result,Response Time,Timestamp"
        }
        StimulusKind::Saturation => {
            "Trial,Line 1 Length,Line 1 Saturation,Line 2 Length,Line 2 Saturation,\
             Ground Truth,Your Response,Result,Response Time,Timestamp"
        }
        StimulusKind::LengthOnly => {
            "Trial,Line 1 Length,Line 2 Length,\
             Ground Truth,Your Response,Result,Response Time,Timestamp"
        }
    }
}

fn attr(stimulus: &LineStimulus) -> f64 {
    stimulus.attribute.unwrap_or_default()
}

fn push_row(out: &mut String, kind: StimulusKind, record: &TrialRecord) {
    let truth = record.ground_truth();
    let verdict = if record.is_correct() {
        "Correct"
    } else {
        "Incorrect"
    };
    let timestamp = record
        .timestamp
        .to_rfc3339_opts(SecondsFormat::Millis, true);

    match kind {
        StimulusKind::Tilt | StimulusKind::Saturation => {
            let _ = writeln!(
                out,
                "{},{},{},{},{},{},{},{},{},{}",
                record.trial_index,
                record.first.length,
                attr(&record.first),
                record.second.length,
                attr(&record.second),
                truth,
                record.response,
                verdict,
                record.response_time_ms,
                timestamp,
            );
        }
        StimulusKind::LengthOnly => {
            let _ = writeln!(
                out,
                "{},{},{},{},{},{},{},{}",
                record.trial_index,
                record.first.length,
                record.second.length,
                truth,
                record.response,
                verdict,
                record.response_time_ms,
                timestamp,
            );
        }
    }
}

/// Serializes one series' records to delimited text. Ground Truth and
/// Result columns are derived here with the same computation the screens
/// use, never read from stored state.
pub fn records_to_csv(kind: StimulusKind, records: &[TrialRecord]) -> String {
    let mut out = String::from(header(kind));
    out.push('\n');
    for record in records {
        push_row(&mut out, kind, record);
    }
    out
}

/// Bundles every finished series into one archive, one
/// `<series>_results.csv` entry each. Entries are stored uncompressed.
pub fn write_results_archive<W: Write + Seek>(
    writer: W,
    all: &[SeriesRecords],
) -> Result<(), DataError> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for series in all {
        zip.start_file(format!("{}_results.csv", series.name), options)?;
        zip.write_all(records_to_csv(series.kind, &series.records).as_bytes())?;
    }
    zip.finish()?;
    info!(series_count = all.len(), "results archive written");
    Ok(())
}

/// Whole-session dump: the finalized per-series record map as pretty JSON.
pub fn write_session_json<W: Write>(writer: W, all: &[SeriesRecords]) -> Result<(), DataError> {
    serde_json::to_writer_pretty(writer, all)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use linelab_core::Judgment;
    use std::io::Cursor;

    fn tilt_record(index: usize, len1: f64, len2: f64, response: Judgment) -> TrialRecord {
        TrialRecord {
            trial_index: index,
            first: LineStimulus::with_attribute(len1, 30.0),
            second: LineStimulus::with_attribute(len2, 60.0),
            response,
            response_time_ms: 850,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn row_count_matches_record_count() {
        let records: Vec<TrialRecord> = (1..=5)
            .map(|i| tilt_record(i, 5.0, 5.0, Judgment::Same))
            .collect();
        let csv = records_to_csv(StimulusKind::Tilt, &records);
        assert_eq!(csv.lines().count(), 6); // header + 5 rows
    }

    #[test]
    fn derived_columns_match_the_screen_computation() {
        let records = vec![
            tilt_record(1, 5.0, 5.0, Judgment::Same),
            tilt_record(2, 5.0, 7.0, Judgment::Same),
        ];
        let csv = records_to_csv(StimulusKind::Tilt, &records);
        let rows: Vec<&str> = csv.lines().skip(1).collect();

        assert!(rows[0].contains(",same,same,Correct,"));
        assert!(rows[1].contains(",different,same,Incorrect,"));
    }

    #[test]
    fn length_only_layout_has_no_attribute_columns() {
        let record = TrialRecord {
            trial_index: 1,
            first: LineStimulus::plain(3.0),
            second: LineStimulus::plain(4.0),
            response: Judgment::Different,
            response_time_ms: 400,
            timestamp: Utc::now(),
        };
        let csv = records_to_csv(StimulusKind::LengthOnly, &[record]);
        let header = csv.lines().next().unwrap();
        assert!(!header.contains("Tilt"));
        assert!(!header.contains("Saturation"));
        assert!(csv.lines().nth(1).unwrap().starts_with("1,3,4,different,"));
    }

    #[test]
    fn archive_holds_one_entry_per_series() {
        let all = vec![
            SeriesRecords {
                name: "Series-1a".into(),
                kind: StimulusKind::Tilt,
                records: vec![tilt_record(1, 5.0, 5.0, Judgment::Same)],
            },
            SeriesRecords {
                name: "Series-2a".into(),
                kind: StimulusKind::Saturation,
                records: vec![tilt_record(1, 5.0, 7.0, Judgment::Different)],
            },
        ];

        let mut buf = Cursor::new(Vec::new());
        write_results_archive(&mut buf, &all).unwrap();

        let archive = zip::ZipArchive::new(Cursor::new(buf.into_inner())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"Series-1a_results.csv"));
        assert!(names.contains(&"Series-2a_results.csv"));
    }

    #[test]
    fn session_json_round_trips() {
        let all = vec![SeriesRecords {
            name: "Series-1b".into(),
            kind: StimulusKind::Tilt,
            records: vec![tilt_record(1, 5.0, 5.0, Judgment::Same)],
        }];

        let mut buf = Vec::new();
        write_session_json(&mut buf, &all).unwrap();
        let parsed: Vec<SeriesRecords> = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed, all);
    }
}
