use async_trait::async_trait;
use chrono::{DateTime, Utc};
use imagedeck_core::{CoreError, KeyValueStore};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tokio::task;

pub mod paths;

const FILE_VERSION: u32 = 1;

#[derive(Clone, Serialize, Deserialize)]
struct FileImage {
    version: u32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    entries: BTreeMap<String, String>,
}

impl FileImage {
    fn new_empty() -> Self {
        let now = Utc::now();
        Self {
            version: FILE_VERSION,
            created_at: now,
            updated_at: now,
            entries: BTreeMap::new(),
        }
    }
}

/// Key-value slots kept in one JSON document on disk. Every `set` rewrites
/// the document through a temp file and keeps a rotating set of backups.
pub struct JsonKvStore {
    path: PathBuf,
    backups_dir: PathBuf,
    max_backups: usize,
    state: RwLock<FileImage>,
    // serializes read-modify-write so files never land out of order
    write_gate: Mutex<()>,
}

impl JsonKvStore {
    pub async fn open_default() -> Result<Self, CoreError> {
        let (file, backups) = paths::default_store_file();
        Self::open_with(file, backups, 10).await
    }

    pub async fn open_with(path: PathBuf, backups_dir: PathBuf, max_backups: usize) -> Result<Self, CoreError> {
        ensure_parent_dirs(&path)?;
        ensure_dir(&backups_dir)?;
        let max_backups = max_backups.max(1);
        let state = load_or_init(&path, &backups_dir, max_backups).await?;
        tracing::debug!(path = %path.display(), keys = state.entries.len(), "json store opened");
        Ok(Self {
            path,
            backups_dir,
            max_backups,
            state: RwLock::new(state),
            write_gate: Mutex::new(()),
        })
    }

    async fn write(&self, img: FileImage) -> Result<(), CoreError> {
        let path = self.path.clone();
        let backups = self.backups_dir.clone();
        let keep = self.max_backups;

        task::spawn_blocking(move || write_with_backup(&path, &backups, keep, &img))
            .await
            .map_err(|_| CoreError::Storage("json io"))?
            .map_err(|e| {
                tracing::error!(error = %e, "json store write failed");
                CoreError::Storage("json io")
            })
    }
}

#[async_trait]
impl KeyValueStore for JsonKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>, CoreError> {
        Ok(self.state.read().entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), CoreError> {
        let _gate = self.write_gate.lock().await;
        let mut next = self.state.read().clone();
        next.entries.insert(key.to_string(), value.to_string());
        next.updated_at = Utc::now();
        // readers only ever see what made it to disk
        self.write(next.clone()).await?;
        *self.state.write() = next;
        Ok(())
    }
}

fn ensure_parent_dirs(path: &Path) -> Result<(), CoreError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        ensure_dir(parent)?;
    }
    Ok(())
}

fn ensure_dir(path: &Path) -> Result<(), CoreError> {
    fs::create_dir_all(path).map_err(|_| CoreError::Storage("json io"))
}

async fn load_or_init(path: &Path, backups_dir: &Path, keep: usize) -> Result<FileImage, CoreError> {
    if path.exists() {
        let p = path.to_path_buf();
        let img = task::spawn_blocking(move || {
            let buf = fs::read_to_string(&p)?;
            let v = serde_json::from_str::<FileImage>(&buf)?;
            Ok::<FileImage, io::Error>(v)
        })
        .await
        .map_err(|_| CoreError::Storage("json io"))?
        .map_err(|e| {
            tracing::error!(path = %path.display(), error = %e, "json store unreadable");
            CoreError::Storage("json parse")
        })?;
        Ok(img)
    } else {
        let img = FileImage::new_empty();
        write_with_backup(path, backups_dir, keep, &img).map_err(|_| CoreError::Storage("json io"))?;
        Ok(img)
    }
}

fn write_with_backup(path: &Path, backups_dir: &Path, max_backups: usize, img: &FileImage) -> Result<(), io::Error> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;
    fs::create_dir_all(backups_dir)?;

    let json = serde_json::to_vec_pretty(img)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&json)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;

    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S%3f");
    let backup_path = backups_dir.join(format!("imagedeck-{ts}.json"));
    let mut btmp = NamedTempFile::new_in(backups_dir)?;
    btmp.write_all(&json)?;
    btmp.flush()?;
    btmp.persist(&backup_path).map_err(|e| e.error)?;

    rotate_backups(backups_dir, max_backups)
}

fn rotate_backups(dir: &Path, keep: usize) -> Result<(), io::Error> {
    let mut entries: Vec<_> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    // names embed the timestamp, so lexical order is age order
    entries.sort_by_key(|e| e.file_name());
    if entries.len() > keep {
        for e in &entries[0..entries.len() - keep] {
            let _ = fs::remove_file(e.path());
        }
    }
    Ok(())
}
