use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Config {
    /// Directory of `<key>.json` vocabulary files
    pub data_dir: PathBuf,
    /// Directory the file-backed store writes to
    pub storage_dir: PathBuf,
    pub log_level: String,
}

impl Config {
    pub fn from_env() -> Self {
        let data_dir = std::env::var("DANCI_DATA_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./data"));

        let storage_dir = std::env::var("DANCI_STORAGE_DIR")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./.danci"));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| crate::logging::DEFAULT_LOG_LEVEL.to_string());

        Self {
            data_dir,
            storage_dir,
            log_level,
        }
    }
}
