use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{NaiveTime, Timelike};

use super::model::{Table, Value};

/// Write `table` as CSV: header row first, no index column, columns in
/// table order. The header is written even when there are no rows.
///
/// The CSV is written to a scratch file next to `path` and renamed over it
/// once complete, so a failed write never touches an existing `path`.
pub fn save_csv(table: &Table, path: &Path) -> Result<()> {
    let scratch = scratch_path(path)?;
    let written = csv::Writer::from_path(&scratch)
        .with_context(|| format!("creating CSV {}", scratch.display()))
        .and_then(|writer| write_csv(table, writer))
        .and_then(|()| {
            fs::rename(&scratch, path)
                .with_context(|| format!("moving CSV into place at {}", path.display()))
        });
    if written.is_err() {
        let _ = fs::remove_file(&scratch);
    }
    written.with_context(|| format!("writing CSV {}", path.display()))
}

fn scratch_path(path: &Path) -> Result<PathBuf> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("{} has no file name", path.display()))?;
    Ok(path.with_file_name(format!(".{name}.tmp-{}", std::process::id())))
}

/// Render `table` as CSV text.
pub fn to_csv_string(table: &Table) -> Result<String> {
    let mut buf = Vec::new();
    write_csv(table, csv::Writer::from_writer(&mut buf))?;
    String::from_utf8(buf).context("CSV output is not UTF-8")
}

/// How the date/time cells of one column are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateLayout {
    /// Every date/time in the column is at midnight.
    DateOnly,
    DateTime,
}

fn date_layout(table: &Table, col: usize) -> DateLayout {
    let all_midnight = table.rows.iter().all(|row| match row.get(col) {
        Value::DateTime(dt) => dt.time() == NaiveTime::MIN,
        _ => true,
    });
    if all_midnight {
        DateLayout::DateOnly
    } else {
        DateLayout::DateTime
    }
}

fn render(value: &Value, layout: DateLayout) -> String {
    match (value, layout) {
        (Value::DateTime(dt), DateLayout::DateOnly) => dt.format("%Y-%m-%d").to_string(),
        (Value::DateTime(dt), DateLayout::DateTime) if dt.nanosecond() == 0 => {
            dt.format("%Y-%m-%d %H:%M:%S").to_string()
        }
        (Value::DateTime(dt), DateLayout::DateTime) => {
            dt.format("%Y-%m-%d %H:%M:%S%.f").to_string()
        }
        (other, _) => other.to_string(),
    }
}

fn write_csv<W: Write>(table: &Table, mut writer: csv::Writer<W>) -> Result<()> {
    writer
        .write_record(&table.columns)
        .context("writing CSV header")?;

    let layouts: Vec<DateLayout> = (0..table.columns.len())
        .map(|col| date_layout(table, col))
        .collect();

    for (row_no, row) in table.rows.iter().enumerate() {
        let fields = layouts
            .iter()
            .enumerate()
            .map(|(i, layout)| render(row.get(i), *layout));
        writer
            .write_record(fields)
            .with_context(|| format!("writing CSV row {row_no}"))?;
    }

    writer.flush().context("flushing CSV output")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::loader::parse_csv_str;
    use crate::data::model::Value;
    use chrono::NaiveDate;

    #[test]
    fn empty_table_keeps_header() {
        let table = Table::from_rows(&["id", "price", "last_review"], Vec::<Vec<Value>>::new());
        assert_eq!(to_csv_string(&table).unwrap(), "id,price,last_review\n");
    }

    #[test]
    fn renders_values_in_column_order() {
        let review = NaiveDate::from_ymd_opt(2019, 5, 21)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let table = Table::from_rows(
            &["name", "price", "last_review", "rating"],
            vec![
                vec![
                    Value::from("Cosy, bright room"),
                    Value::Integer(80),
                    Value::DateTime(review),
                    Value::Float(4.0),
                ],
                vec![Value::from("Loft"), Value::Integer(120), Value::Null, Value::Float(4.5)],
            ],
        );

        let csv = to_csv_string(&table).unwrap();
        assert_eq!(
            csv,
            "name,price,last_review,rating\n\
             \"Cosy, bright room\",80,2019-05-21,4.0\n\
             Loft,120,,4.5\n"
        );
    }

    #[test]
    fn date_column_uses_one_layout() {
        let day = NaiveDate::from_ymd_opt(2019, 5, 21).unwrap();
        let table = Table::from_rows(
            &["last_review"],
            vec![
                vec![Value::DateTime(day.and_hms_opt(0, 0, 0).unwrap())],
                vec![Value::DateTime(day.and_hms_opt(14, 5, 0).unwrap())],
                vec![Value::Null],
            ],
        );

        let csv = to_csv_string(&table).unwrap();
        assert_eq!(
            csv,
            "last_review\n2019-05-21 00:00:00\n2019-05-21 14:05:00\n\"\"\n"
        );
    }

    #[test]
    fn failed_save_keeps_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clean_sample.csv");
        std::fs::write(&path, "keep me\n").unwrap();

        // A directory squatting on the scratch name makes the write fail.
        let scratch = dir
            .path()
            .join(format!(".clean_sample.csv.tmp-{}", std::process::id()));
        std::fs::create_dir(&scratch).unwrap();

        let table = parse_csv_str("price,last_review\n80,\n").unwrap();
        assert!(save_csv(&table, &path).is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "keep me\n");
    }

    #[test]
    fn save_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clean_sample.csv");
        std::fs::write(&path, "stale\n").unwrap();

        let table = parse_csv_str("price,last_review\n80,\n").unwrap();
        save_csv(&table, &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "price,last_review\n80,\n");
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1, "{leftovers:?}");
    }

    #[test]
    fn written_file_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clean_sample.csv");
        let original = parse_csv_str("id,price,note\n1,80.5,a\n2,,b\n").unwrap();

        save_csv(&original, &path).unwrap();
        let reloaded = crate::data::loader::load_file(&path).unwrap();
        assert_eq!(reloaded, original);
    }
}
