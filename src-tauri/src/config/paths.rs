use std::path::PathBuf;

/// Directory name under the platform data dir
pub const APP_DIR_NAME: &str = "loopboard";

/// File name of the persisted record
pub const DATA_FILE_NAME: &str = "data.json";

/// Overrides the data directory, mostly for development and tests
pub const DATA_DIR_ENV: &str = "LOOPBOARD_DATA_DIR";

/// Resolve where the config record lives.
///
/// `LOOPBOARD_DATA_DIR` wins when set and non-empty; otherwise the platform data
/// directory from `dirs`, falling back to the working directory.
pub fn data_file_path() -> PathBuf {
    data_dir().join(DATA_FILE_NAME)
}

pub fn data_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }

    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}
