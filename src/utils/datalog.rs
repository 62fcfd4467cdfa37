use crate::utils::error::Result;
use std::fmt::Display;
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Append-only telemetry file used by subsystems when logging is enabled.
///
/// Each record is either a free-form line or a `name = value` pair, with an
/// optional timestamp prefix.
pub struct DataLog {
    writer: BufWriter<File>,
    timestamps: bool,
}

impl DataLog {
    /// Creates or truncates the log file at `path`.
    pub fn create<P: AsRef<Path>>(path: P, timestamps: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            timestamps,
        })
    }

    pub fn write_line(&mut self, line: &str) -> Result<()> {
        self.write_prefix()?;
        writeln!(self.writer, "{}", line)?;
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_value<V: Display>(&mut self, name: &str, value: V) -> Result<()> {
        self.write_prefix()?;
        writeln!(self.writer, "{} = {}", name, value)?;
        self.writer.flush()?;
        Ok(())
    }

    fn write_prefix(&mut self) -> Result<()> {
        if self.timestamps {
            write!(self.writer, "{} ", chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3f"))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_line_and_value() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("drivetrain.log");

        let mut log = DataLog::create(&path, false).unwrap();
        log.write_line("Gyro enabled").unwrap();
        log.write_value("Gyro angle", 42.5).unwrap();
        drop(log);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Gyro enabled\nGyro angle = 42.5\n");
    }

    #[test]
    fn test_timestamp_prefix() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("robot.log");

        let mut log = DataLog::create(&path, true).unwrap();
        log.write_value("Distance traveled", 1.25).unwrap();
        drop(log);

        let content = std::fs::read_to_string(&path).unwrap();
        // "<timestamp> Distance traveled = 1.25"
        assert!(content.trim_end().ends_with("Distance traveled = 1.25"));
        assert!(content.len() > "Distance traveled = 1.25\n".len());
    }

    #[test]
    fn test_create_truncates_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("old.log");
        std::fs::write(&path, "stale contents\n").unwrap();

        let mut log = DataLog::create(&path, false).unwrap();
        log.write_line("fresh").unwrap();
        drop(log);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\n");
    }
}
