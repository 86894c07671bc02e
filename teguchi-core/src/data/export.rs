//! Dataset export to delimited text.
//!
//! Columns: 証券会社名, n225_sell, n225_buy, n225_net, topix_sell, topix_buy,
//! topix_net, net_total. The publication date is carried by the file name and
//! is not repeated in the rows.
//!
//! Output is UTF-8, or Shift-JIS for spreadsheet tools that open CSV files
//! with the Japanese legacy codepage. The choice is made by the caller and
//! passed in; nothing here looks at the host platform.

use super::provider::{DataRecord, SyncError};
use encoding_rs::SHIFT_JIS;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Fixed header row.
pub const HEADER: [&str; 8] = [
    "証券会社名",
    "n225_sell",
    "n225_buy",
    "n225_net",
    "topix_sell",
    "topix_buy",
    "topix_net",
    "net_total",
];

/// Text encoding of exported files.
///
/// Config values go through [`FromStr`], so `utf8`, `UTF-8`, `shiftjis`,
/// `Shift_JIS` and `sjis` are all accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum OutputEncoding {
    Utf8,
    ShiftJis,
}

impl OutputEncoding {
    /// Shift-JIS on Windows, where spreadsheet tools open CSV files with the
    /// legacy codepage; UTF-8 everywhere else.
    pub fn for_platform() -> Self {
        if cfg!(windows) {
            OutputEncoding::ShiftJis
        } else {
            OutputEncoding::Utf8
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OutputEncoding::Utf8 => "utf8",
            OutputEncoding::ShiftJis => "shiftjis",
        }
    }
}

impl fmt::Display for OutputEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for OutputEncoding {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "utf8" => Ok(OutputEncoding::Utf8),
            "shiftjis" | "sjis" => Ok(OutputEncoding::ShiftJis),
            other => Err(SyncError::ConfigError(format!(
                "unknown encoding '{other}' (expected utf8 or shiftjis)"
            ))),
        }
    }
}

impl TryFrom<String> for OutputEncoding {
    type Error = SyncError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OutputEncoding> for String {
    fn from(encoding: OutputEncoding) -> Self {
        encoding.label().to_string()
    }
}

/// Writes one dataset per file.
#[derive(Debug, Clone, Copy)]
pub struct RecordExporter {
    encoding: OutputEncoding,
}

impl RecordExporter {
    pub fn new(encoding: OutputEncoding) -> Self {
        Self { encoding }
    }

    pub fn encoding(&self) -> OutputEncoding {
        self.encoding
    }

    /// Render the header plus one row per record, encoded.
    pub fn render(&self, dataset: &[DataRecord]) -> Result<Vec<u8>, SyncError> {
        let mut wtr = csv::WriterBuilder::new()
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(vec![]);

        wtr.write_record(HEADER)
            .map_err(|e| SyncError::ExportError(format!("header: {e}")))?;
        for record in dataset {
            wtr.write_record(record.export_fields())
                .map_err(|e| SyncError::ExportError(format!("row for {}: {e}", record.company)))?;
        }
        let utf8 = wtr
            .into_inner()
            .map_err(|e| SyncError::ExportError(format!("flush: {e}")))?;

        match self.encoding {
            OutputEncoding::Utf8 => Ok(utf8),
            OutputEncoding::ShiftJis => {
                let text = String::from_utf8(utf8)
                    .map_err(|e| SyncError::ExportError(format!("non-UTF-8 table: {e}")))?;
                to_shift_jis(&text)
            }
        }
    }

    /// Write `dataset` to a new file at `path`.
    ///
    /// An existing file is never replaced. The table goes to `{path}.tmp`
    /// first and is renamed into place once fully written.
    pub fn export(&self, dataset: &[DataRecord], path: &Path) -> Result<(), SyncError> {
        if path.exists() {
            return Err(SyncError::AlreadyArchived {
                path: path.to_path_buf(),
            });
        }

        let bytes = self.render(dataset)?;
        let tmp_path = tmp_path(path);

        let written = fs::File::create(&tmp_path).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        });
        if let Err(e) = written {
            let _ = fs::remove_file(&tmp_path);
            return Err(SyncError::archive(&tmp_path, e));
        }

        fs::rename(&tmp_path, path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            SyncError::archive(path, format!("atomic rename failed: {e}"))
        })?;

        tracing::debug!(path = %path.display(), rows = dataset.len(), encoding = %self.encoding, "dataset exported");
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Transcode to Shift-JIS, failing on the first unmappable character.
fn to_shift_jis(text: &str) -> Result<Vec<u8>, SyncError> {
    let (bytes, _, had_errors) = SHIFT_JIS.encode(text);
    if had_errors {
        let mut buf = [0u8; 4];
        let offending = text
            .chars()
            .find(|c| SHIFT_JIS.encode(c.encode_utf8(&mut buf)).2)
            .map(String::from)
            .unwrap_or_default();
        return Err(SyncError::Unencodable {
            text: offending,
            encoding: SHIFT_JIS.name(),
        });
    }
    Ok(bytes.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(company: &str) -> DataRecord {
        DataRecord {
            info_date: "2021-05-04".into(),
            company: company.into(),
            n225_sell: "100".into(),
            n225_buy: "200".into(),
            n225_net: "100".into(),
            topix_sell: "-".into(),
            topix_buy: "-".into(),
            topix_net: "-".into(),
            net_total: "100".into(),
        }
    }

    #[test]
    fn utf8_table_has_header_and_rows() {
        let bytes = RecordExporter::new(OutputEncoding::Utf8)
            .render(&[record("野村"), record("ゴールドマン")])
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "証券会社名,n225_sell,n225_buy,n225_net,topix_sell,topix_buy,topix_net,net_total"
        );
        assert_eq!(lines[1], "野村,100,200,100,-,-,-,100");
        assert_eq!(lines[2], "ゴールドマン,100,200,100,-,-,-,100");
        assert!(!text.contains("2021-05-04"));
        assert!(!text.contains('\r'));
    }

    #[test]
    fn fields_with_commas_are_quoted() {
        let bytes = RecordExporter::new(OutputEncoding::Utf8)
            .render(&[record("Foo, Inc.")])
            .unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.lines().nth(1).unwrap().starts_with("\"Foo, Inc.\","));
    }

    #[test]
    fn shift_jis_table_decodes_back() {
        let bytes = RecordExporter::new(OutputEncoding::ShiftJis)
            .render(&[record("野村")])
            .unwrap();
        assert!(std::str::from_utf8(&bytes).is_err());
        let (text, _, had_errors) = SHIFT_JIS.decode(&bytes);
        assert!(!had_errors);
        assert!(text.starts_with("証券会社名,"));
        assert!(text.contains("野村,100"));
    }

    #[test]
    fn unmappable_character_is_fatal() {
        let err = RecordExporter::new(OutputEncoding::ShiftJis)
            .render(&[record("🏦 Bank")])
            .unwrap_err();
        match err {
            SyncError::Unencodable { text, .. } => assert_eq!(text, "🏦"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn encoding_parses_config_spellings() {
        assert_eq!("utf8".parse::<OutputEncoding>().unwrap(), OutputEncoding::Utf8);
        assert_eq!("UTF-8".parse::<OutputEncoding>().unwrap(), OutputEncoding::Utf8);
        assert_eq!("shiftjis".parse::<OutputEncoding>().unwrap(), OutputEncoding::ShiftJis);
        assert_eq!("Shift_JIS".parse::<OutputEncoding>().unwrap(), OutputEncoding::ShiftJis);
        assert!("latin1".parse::<OutputEncoding>().is_err());
    }

    #[test]
    fn platform_default_matches_target() {
        let expected = if cfg!(windows) {
            OutputEncoding::ShiftJis
        } else {
            OutputEncoding::Utf8
        };
        assert_eq!(OutputEncoding::for_platform(), expected);
    }

    #[test]
    fn export_refuses_to_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("2021-05-04.csv");
        fs::write(&path, b"original").unwrap();

        let err = RecordExporter::new(OutputEncoding::Utf8)
            .export(&[record("A")], &path)
            .unwrap_err();
        assert!(matches!(err, SyncError::AlreadyArchived { .. }));
        assert_eq!(fs::read(&path).unwrap(), b"original");
    }

    #[test]
    fn export_leaves_no_temp_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("2021-05-04.csv");
        RecordExporter::new(OutputEncoding::Utf8)
            .export(&[record("A")], &path)
            .unwrap();
        assert!(path.exists());
        assert!(!tmp_path(&path).exists());
    }

    #[test]
    fn export_into_missing_dir_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("nope").join("2021-05-04.csv");
        let err = RecordExporter::new(OutputEncoding::Utf8)
            .export(&[record("A")], &path)
            .unwrap_err();
        assert!(matches!(err, SyncError::Archive { .. }));
    }
}
