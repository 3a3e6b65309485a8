use directories::ProjectDirs;
use std::path::PathBuf;

pub fn data_root() -> PathBuf {
    if let Some(pd) = ProjectDirs::from("com", "imagedeck", "ImageDeck") {
        pd.data_dir().to_path_buf()
    } else {
        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}

/// `(store file, backups dir)` under the platform data directory.
pub fn default_store_file() -> (PathBuf, PathBuf) {
    let root = data_root();
    (root.join("imagedeck.json"), root.join("backups"))
}

pub fn default_log_file() -> PathBuf {
    data_root().join("imagedeck.log")
}
