//! Command file source
//!
//! Files are read line by line relative to a project root. Lines come back
//! in order with terminators stripped and nothing filtered, blank lines
//! included.

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Buffer size for reading command files (64 KB)
const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Iterator over the lines of a command file
pub type Lines = Box<dyn Iterator<Item = io::Result<String>> + Send>;

/// Storage collaborator that yields the lines of a named file
pub trait LineSource: Send {
    /// Open `name` and return its lines, or fail if it cannot be opened
    fn open_lines(&self, name: &str) -> io::Result<Lines>;

    /// Where `name` resolves to, for messages
    fn describe(&self, name: &str) -> String {
        name.to_string()
    }
}

/// Files under a project root directory
#[derive(Debug, Clone)]
pub struct ProjectFiles {
    root: PathBuf,
}

impl ProjectFiles {
    /// Resolve names against `root`
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The project root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path of `name`
    pub fn resolve(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

impl LineSource for ProjectFiles {
    fn open_lines(&self, name: &str) -> io::Result<Lines> {
        let file = File::open(self.resolve(name))?;
        let reader = BufReader::with_capacity(READ_BUFFER_SIZE, file);
        Ok(Box::new(reader.lines()))
    }

    fn describe(&self, name: &str) -> String {
        self.resolve(name).display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_lines_in_order_with_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = File::create(dir.path().join("job.gcode")).unwrap();
        write!(file, "G21\r\n\r\nG0 X1\nM2").unwrap();

        let files = ProjectFiles::new(dir.path());
        let lines: Vec<String> = files
            .open_lines("job.gcode")
            .unwrap()
            .collect::<io::Result<_>>()
            .unwrap();

        assert_eq!(lines, vec!["G21", "", "G0 X1", "M2"]);
    }

    #[test]
    fn test_missing_file_fails_to_open() {
        let dir = tempfile::tempdir().unwrap();
        let files = ProjectFiles::new(dir.path());
        let err = files.open_lines("absent.gcode").err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
