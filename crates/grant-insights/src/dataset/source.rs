use std::path::{Path, PathBuf};

/// Supplies the raw bytes of a grant export. Fetching is the only step of a
/// run that may fail outright; callers must not clean when it does.
pub trait DatasetSource: Send + Sync {
    fn describe(&self) -> String;
    fn fetch(&self) -> Result<Vec<u8>, SourceError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("failed to read grant export from {location}: {source}")]
    Read {
        location: String,
        #[source]
        source: std::io::Error,
    },
    #[error("grant export at {location} is empty")]
    Empty { location: String },
}

/// Reads a CSV export from the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DatasetSource for FileSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<Vec<u8>, SourceError> {
        let bytes = std::fs::read(&self.path).map_err(|source| SourceError::Read {
            location: self.describe(),
            source,
        })?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(SourceError::Empty {
                location: self.describe(),
            });
        }
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("grant-insights-{}-{name}", std::process::id()))
    }

    #[test]
    fn reads_existing_files() {
        let path = temp_path("source.csv");
        std::fs::write(&path, "Gender\nfemale\n").expect("write fixture");
        let bytes = FileSource::new(&path).fetch().expect("fetch");
        assert_eq!(bytes, b"Gender\nfemale\n");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn missing_files_surface_read_errors() {
        let error = FileSource::new("./does-not-exist.csv")
            .fetch()
            .expect_err("expected read error");
        match error {
            SourceError::Read { location, .. } => assert_eq!(location, "./does-not-exist.csv"),
            other => panic!("expected read error, got {other:?}"),
        }
    }

    #[test]
    fn blank_files_are_rejected() {
        let path = temp_path("blank.csv");
        std::fs::write(&path, "  \n").expect("write fixture");
        let error = FileSource::new(&path).fetch().expect_err("blank export");
        assert!(matches!(error, SourceError::Empty { .. }));
        std::fs::remove_file(path).ok();
    }
}
