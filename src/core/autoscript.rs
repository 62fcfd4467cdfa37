use crate::utils::error::{Result, RobotError};
use std::fmt;
use std::path::{Path, PathBuf};

/// A single parameter of an autonomous script command.
///
/// Columns that parse as numbers become `Number`; everything else (including
/// empty cells in malformed rows) is kept verbatim as `Text`.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptValue {
    Number(f64),
    Text(String),
}

impl ScriptValue {
    fn parse(column: &str) -> Self {
        match column.trim().parse::<f64>() {
            Ok(n) if !column.trim().is_empty() => ScriptValue::Number(n),
            _ => ScriptValue::Text(column.to_string()),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ScriptValue::Number(n) => Some(*n),
            ScriptValue::Text(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ScriptValue::Number(_) => None,
            ScriptValue::Text(s) => Some(s),
        }
    }
}

impl fmt::Display for ScriptValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptValue::Number(n) => write!(f, "{}", n),
            ScriptValue::Text(s) => write!(f, "{}", s),
        }
    }
}

/// One autonomous command: a name plus its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptCommand {
    pub name: String,
    pub args: Vec<ScriptValue>,
}

/// An autonomous robot sequence read from a CSV script file.
///
/// Each row is one command; the first column is the command name and the
/// remaining columns are its parameters. Rows with an empty first column are
/// skipped.
#[derive(Debug, Default)]
pub struct AutoScript {
    commands: Vec<ScriptCommand>,
    cursor: usize,
}

impl AutoScript {
    /// Parses a script file (conventionally `*.as`).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| RobotError::ScriptError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_csv_str(&content)
    }

    /// Parses script commands from CSV text.
    pub fn from_csv_str(content: &str) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_reader(content.as_bytes());

        let mut commands = Vec::new();
        for record in reader.records() {
            let record = record?;
            let mut columns = record.iter();
            let name = match columns.next() {
                Some(name) if !name.is_empty() => name.to_string(),
                _ => continue,
            };
            let args = columns.map(ScriptValue::parse).collect();
            commands.push(ScriptCommand { name, args });
        }

        Ok(Self {
            commands,
            cursor: 0,
        })
    }

    /// Lists the `*.as` script files in a directory, sorted by name.
    pub fn available_scripts<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut scripts = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) == Some("as") {
                scripts.push(path);
            }
        }
        scripts.sort();
        Ok(scripts)
    }

    pub fn commands(&self) -> &[ScriptCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Returns the next command in the sequence, or `None` once exhausted.
    pub fn next_command(&mut self) -> Option<&ScriptCommand> {
        let command = self.commands.get(self.cursor);
        if command.is_some() {
            self.cursor += 1;
        }
        command
    }

    /// Rewinds the sequence to the first command.
    pub fn rewind(&mut self) {
        self.cursor = 0;
    }
}
