use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::mem::take;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::model::entry::{Category, Entry};
use crate::services::encoding;

pub const HEADER: [&str; 3] = ["headword", "definition", "category"];

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    #[default]
    Csv,
    Tsv,
}

impl Delimiter {
    pub fn sep(self) -> char {
        match self {
            Delimiter::Csv => ',',
            Delimiter::Tsv => '\t',
        }
    }
}

/// Entries read from a dataset file plus the rows that could not be used.
#[derive(Debug, Default)]
pub struct LoadedDataset {
    pub entries: Vec<Entry>,
    pub malformed: usize,
}

/* ---------------- Parsing ---------------- */

/// Delimited-text parser: quoted fields, doubled quotes, CRLF tolerant.
pub fn parse_rows(text: &str, sep: char) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut field = String::new();
    let mut row = Vec::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes {
                    if matches!(chars.peek(), Some('"')) {
                        chars.next();
                        field.push('"');
                    } else {
                        in_quotes = false;
                    }
                } else {
                    in_quotes = true;
                }
            }
            c if c == sep && !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && matches!(chars.peek(), Some('\n')) {
                    chars.next();
                }
                row.push(take(&mut field));
                if !(row.len() == 1 && row[0].is_empty()) {
                    rows.push(take(&mut row));
                } else {
                    row.clear();
                }
            }
            _ => field.push(ch),
        }
    }

    // Unterminated last line.
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }

    rows
}

fn is_header(row: &[String]) -> bool {
    row.first()
        .map(|c| {
            let c = c.trim();
            c.eq_ignore_ascii_case(HEADER[0]) || c.eq_ignore_ascii_case("idiom")
        })
        .unwrap_or(false)
}

fn row_to_entry(row: &[String]) -> std::result::Result<Entry, String> {
    let headword = row.first().map(|s| s.trim()).unwrap_or("");
    let definition = row.get(1).map(|s| s.trim()).unwrap_or("");

    if headword.is_empty() {
        return Err("missing headword".into());
    }
    if definition.is_empty() {
        return Err("missing definition".into());
    }

    let category: Category = row
        .get(2)
        .ok_or_else(|| "missing category".to_string())?
        .parse()?;

    Ok(Entry::new(headword, definition, category))
}

pub fn parse_entries(text: &str, delimiter: Delimiter) -> LoadedDataset {
    let mut rows = parse_rows(text, delimiter.sep());
    if rows.first().map(|r| is_header(r)).unwrap_or(false) {
        rows.remove(0);
    }

    let mut out = LoadedDataset {
        entries: Vec::with_capacity(rows.len()),
        malformed: 0,
    };

    for (i, row) in rows.iter().enumerate() {
        match row_to_entry(row) {
            Ok(e) => out.entries.push(e),
            Err(reason) => {
                out.malformed += 1;
                warn!(row = i + 1, %reason, "skipping malformed row");
            }
        }
    }

    out
}

pub fn read_entries(path: &Path, delimiter: Delimiter) -> Result<LoadedDataset> {
    let bytes = fs::read(path)?;
    let text = encoding::decode(&bytes);
    let loaded = parse_entries(&text, delimiter);
    debug!(
        path = %path.display(),
        entries = loaded.entries.len(),
        malformed = loaded.malformed,
        "dataset loaded"
    );
    Ok(loaded)
}

/* ---------------- Writing ---------------- */

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// One row as a line of text, quoting only the fields that need it.
fn format_row<S: AsRef<str>>(row: &[S], sep: char) -> String {
    let mut line = String::new();
    for (i, cell) in row.iter().enumerate() {
        let cell = cell.as_ref();
        if i > 0 {
            line.push(sep);
        }
        if needs_quotes(cell, sep) {
            line.push('"');
            line.push_str(&cell.replace('"', "\"\""));
            line.push('"');
        } else {
            line.push_str(cell);
        }
    }
    line.push('\n');
    line
}

/// Write a single row.
pub fn write_row<W: Write, S: AsRef<str>>(mut w: W, row: &[S], sep: char) -> io::Result<()> {
    // One write per row: a record is either on disk whole or not at all.
    w.write_all(format_row(row, sep).as_bytes())
}

fn entry_row(e: &Entry) -> [&str; 3] {
    [e.headword.as_str(), e.definition.as_str(), e.category.as_str()]
}

pub fn to_dataset_string(entries: &[Entry], delimiter: Delimiter) -> String {
    let sep = delimiter.sep();
    let mut out = format_row(&HEADER, sep);
    for e in entries {
        out.push_str(&format_row(&entry_row(e), sep));
    }
    out
}

/// Writes the whole dataset through a temporary file and a rename.
pub fn write_entries_atomic(path: &Path, entries: &[Entry], delimiter: Delimiter) -> Result<()> {
    write_atomic(path, to_dataset_string(entries, delimiter).as_bytes())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = tmp_path(path);

    if let Some(parent) = tmp.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;

    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut p = path.to_path_buf();
    let file_name = match path.file_name().and_then(|s| s.to_str()) {
        Some(n) => n.to_string(),
        None => "dataset".to_string(),
    };
    p.set_file_name(format!("{file_name}.tmp"));
    p
}

/// Record-at-a-time writer for the intermediate dataset. Every record is
/// flushed as soon as it is written.
pub struct RecordWriter {
    out: BufWriter<File>,
    sep: char,
    written: usize,
}

impl RecordWriter {
    /// Truncates `path` and writes the header row.
    pub fn create(path: &Path, delimiter: Delimiter) -> Result<Self> {
        ensure_parent(path)?;
        let file = File::create(path)?;
        let mut w = Self {
            out: BufWriter::new(file),
            sep: delimiter.sep(),
            written: 0,
        };
        write_row(&mut w.out, &HEADER, w.sep)?;
        w.out.flush()?;
        Ok(w)
    }

    /// Opens `path` for append; creates it with a header when missing.
    pub fn append(path: &Path, delimiter: Delimiter) -> Result<Self> {
        if !path.exists() {
            return Self::create(path, delimiter);
        }
        let file = OpenOptions::new().append(true).open(path)?;
        Ok(Self {
            out: BufWriter::new(file),
            sep: delimiter.sep(),
            written: 0,
        })
    }

    pub fn write(&mut self, entry: &Entry) -> Result<()> {
        write_row(&mut self.out, &entry_row(entry), self.sep)?;
        self.out.flush()?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_fields_keep_separators_and_quotes() {
        let rows = parse_rows("a,\"b, \"\"c\"\"\",d\r\n\nx,y,z", ',');
        assert_eq!(
            rows,
            vec![
                vec!["a".to_string(), "b, \"c\"".to_string(), "d".to_string()],
                vec!["x".to_string(), "y".to_string(), "z".to_string()],
            ]
        );
    }

    #[test]
    fn header_is_skipped_and_bad_rows_counted() {
        let text = "headword,definition,category\n\
                    Haste makes waste,Hurrying leads to mistakes.,proverb\n\
                    No definition,,proverb\n\
                    Only headword\n\
                    Odd one,Something.,idiom\n\
                    Two fields,Missing category\n";
        let loaded = parse_entries(text, Delimiter::Csv);
        assert_eq!(loaded.entries.len(), 1);
        assert_eq!(loaded.entries[0].headword, "Haste makes waste");
        assert_eq!(loaded.malformed, 4);
    }

    #[test]
    fn written_dataset_reads_back() {
        let entries = vec![
            Entry::new("as cool as a cucumber", "Calm, \"unflustered\".", Category::Simile),
            Entry::new("time is money", "Time is valuable.", Category::Aphorism),
        ];
        let text = to_dataset_string(&entries, Delimiter::Csv);
        assert!(text.starts_with("headword,definition,category\n"));
        assert!(text.contains("\"Calm, \"\"unflustered\"\".\""));

        let loaded = parse_entries(&text, Delimiter::Csv);
        assert_eq!(loaded.entries, entries);
        assert_eq!(loaded.malformed, 0);
    }

    #[test]
    fn tsv_does_not_quote_commas() {
        let mut buf = Vec::new();
        write_row(&mut buf, &["a, b", "c"], '\t').unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "a, b\tc\n");
    }

    #[test]
    fn record_writer_appends_without_second_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/raw.csv");

        let mut w = RecordWriter::create(&path, Delimiter::Csv).unwrap();
        w.write(&Entry::new("a", "first", Category::Proverb)).unwrap();
        drop(w);

        let mut w = RecordWriter::append(&path, Delimiter::Csv).unwrap();
        w.write(&Entry::new("b", "second", Category::Proverb)).unwrap();
        assert_eq!(w.written(), 1);
        drop(w);

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.matches("headword").count(), 1);
        assert_eq!(parse_entries(&text, Delimiter::Csv).entries.len(), 2);
    }

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("final.csv");
        write_entries_atomic(&path, &[], Delimiter::Csv).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "headword,definition,category\n");
        assert!(!dir.path().join("final.csv.tmp").exists());
    }
}
