use std::fs;
use std::io::{BufRead, BufReader};

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::Value;

use crate::error::ScoreError;

/// Where a row came from, kept so later stages can point at the offending line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowOrigin {
    pub path: Utf8PathBuf,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct Row {
    pub origin: RowOrigin,
    values: Vec<Value>,
}

impl Row {
    pub fn values(&self) -> &[Value] {
        &self.values
    }
}

/// Column-projected rows from one or more newline-delimited JSON shards.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new(columns: &[&str]) -> Self {
        Self {
            columns: columns.iter().map(|column| column.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    /// Value of `column` in `row`, `None` when the column is unknown or the value is null.
    pub fn value<'a>(&self, row: &'a Row, column: &str) -> Option<&'a Value> {
        self.column_index(column)
            .and_then(|index| row.values.get(index))
            .filter(|value| !value.is_null())
    }

    fn push_object(&mut self, mut object: serde_json::Map<String, Value>, origin: RowOrigin) {
        let values = self
            .columns
            .iter()
            .map(|column| object.remove(column).unwrap_or(Value::Null))
            .collect();
        self.rows.push(Row { origin, values });
    }
}

/// Loads every `*.json` file under `root` (recursively) into one table holding only `columns`.
///
/// Files are read in ascending path order, lines in file order. Fails when no file
/// matches or a non-blank line is not a JSON object.
pub fn load_folder(root: &Utf8Path, columns: &[&str]) -> Result<Table, ScoreError> {
    let shards = discover_shards(root)?;
    if shards.is_empty() {
        return Err(ScoreError::NoShards(root.to_path_buf()));
    }

    let mut table = Table::new(columns);
    for shard in &shards {
        tracing::info!("processing shard {shard}");
        load_shard(shard, &mut table)?;
    }
    tracing::debug!(
        root = %root,
        shards = shards.len(),
        rows = table.len(),
        "loaded table"
    );
    Ok(table)
}

/// Sorted list of shard files below `root`. Directory symlinks are not followed.
pub fn discover_shards(root: &Utf8Path) -> Result<Vec<Utf8PathBuf>, ScoreError> {
    let mut shards = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let entries = fs::read_dir(dir.as_std_path())
            .map_err(|err| ScoreError::data_source(dir.clone(), None, err.to_string()))?;
        for entry in entries {
            let entry =
                entry.map_err(|err| ScoreError::data_source(dir.clone(), None, err.to_string()))?;
            let path = Utf8PathBuf::from_path_buf(entry.path()).map_err(|path| {
                ScoreError::data_source(
                    dir.clone(),
                    None,
                    format!("non UTF-8 path {}", path.display()),
                )
            })?;
            let file_type = entry
                .file_type()
                .map_err(|err| ScoreError::data_source(path.clone(), None, err.to_string()))?;
            // Symlinked directories are not descended into; symlinked files still count.
            if file_type.is_dir() {
                stack.push(path);
            } else if path.extension() == Some("json")
                && (file_type.is_file() || (file_type.is_symlink() && path.is_file()))
            {
                shards.push(path);
            }
        }
    }
    shards.sort();
    Ok(shards)
}

fn load_shard(path: &Utf8Path, table: &mut Table) -> Result<(), ScoreError> {
    let file = fs::File::open(path.as_std_path())
        .map_err(|err| ScoreError::data_source(path, None, err.to_string()))?;
    let reader = BufReader::new(file);

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.map_err(|err| ScoreError::data_source(path, Some(line_no), err.to_string()))?;
        if line.trim().is_empty() {
            continue;
        }
        let value: Value = serde_json::from_str(&line)
            .map_err(|err| ScoreError::data_source(path, Some(line_no), err.to_string()))?;
        let Value::Object(object) = value else {
            return Err(ScoreError::data_source(
                path,
                Some(line_no),
                "expected one JSON object per line",
            ));
        };
        table.push_object(
            object,
            RowOrigin {
                path: path.to_path_buf(),
                line: line_no,
            },
        );
    }
    Ok(())
}
