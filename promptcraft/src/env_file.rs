use std::path::{Path, PathBuf};

/// Result of reading a `.env` file into the process environment.
///
/// Loading happens before logging is set up, so the outcome is kept and logged later.
#[derive(Debug)]
pub(crate) enum EnvFile {
    Loaded(PathBuf),
    Missing,
    Invalid(dotenvy::Error),
}

impl EnvFile {
    /// Reads `.env` from the working directory or one of its parents.
    ///
    /// Variables that are already set keep their value.
    pub(crate) fn load() -> Self {
        Self::from_result(dotenvy::dotenv())
    }

    /// Reads the given file.
    pub(crate) fn load_from(path: &Path) -> Self {
        Self::from_result(dotenvy::from_path(path).map(|()| path.to_path_buf()))
    }

    fn from_result(result: Result<PathBuf, dotenvy::Error>) -> Self {
        match result {
            Ok(path) => EnvFile::Loaded(path),
            Err(e) if e.not_found() => EnvFile::Missing,
            Err(e) => EnvFile::Invalid(e),
        }
    }

    pub(crate) fn log(&self) {
        match self {
            EnvFile::Loaded(path) => log::debug!("Loaded environment variables from {}", path.display()),
            EnvFile::Missing => (),
            EnvFile::Invalid(e) => log::warn!("Ignoring unreadable .env file: {e}"),
        }
    }
}
