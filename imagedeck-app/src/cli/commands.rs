use crate::cli::opts::*;

use anyhow::{bail, Context, Result};
use imagedeck_core::{
    next_id, CollectionStore, ImageId, ImageRecord, KeyValueStore, Phase, WriteStatus,
};
use imagedeck_json::paths::data_root;
use imagedeck_json::JsonKvStore;
use imagedeck_sqlite::SqliteKv;
use std::sync::Arc;

pub async fn run_cli(args: Cli) -> Result<()> {
    let kv = open_kv(&args).await?;
    run_with_kv(args, kv).await
}

pub async fn run_with_kv(args: Cli, kv: Arc<dyn KeyValueStore>) -> Result<()> {
    let mut store = CollectionStore::from_config(kv, &args.store_config());
    store.load().await?;
    match args.cmd {
        Command::List => list_cmd(&store),
        Command::Show { id } => show_cmd(&store, id),
        Command::Rm { id } => rm_cmd(&mut store, id).await,
        Command::Add { uri, id } => add_cmd(&mut store, uri, id).await,
        Command::Tui => bail!("the TUI is started from main"),
    }
}

pub async fn open_kv(args: &Cli) -> Result<Arc<dyn KeyValueStore>> {
    match args.store {
        StoreKind::Json => {
            let s = match &args.data_file {
                Some(file) => {
                    let backups = file.with_extension("backups");
                    JsonKvStore::open_with(file.clone(), backups, 10).await?
                }
                None => JsonKvStore::open_default().await?,
            };
            Ok(Arc::new(s))
        }
        StoreKind::Sqlite => {
            let p = args
                .db_path
                .clone()
                .unwrap_or_else(|| data_root().join("imagedeck.sqlite3"));
            if let Some(parent) = p.parent().filter(|d| !d.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating {}", parent.display()))?;
            }
            let s = SqliteKv::open_file(&p).await?;
            Ok(Arc::new(s))
        }
    }
}

fn list_cmd(store: &CollectionStore) -> Result<()> {
    if store.phase() == Phase::Empty {
        println!("no images registered");
        return Ok(());
    }
    for r in store.images() {
        println!("{}\t{}", r.id, r.uri);
    }
    Ok(())
}

fn show_cmd(store: &CollectionStore, id: ImageId) -> Result<()> {
    let Some(route) = store.open(id) else {
        bail!("image not found: {id}");
    };
    if let Some(r) = store.get(id) {
        println!("{}\nid:  {}\nuri: {}", route.path(), r.id, r.uri);
    }
    Ok(())
}

async fn rm_cmd(store: &mut CollectionStore, id: ImageId) -> Result<()> {
    store.delete(id);
    for n in store.take_notices() {
        println!("{}", n.message());
    }
    settle(store).await
}

async fn add_cmd(store: &mut CollectionStore, uri: String, id: Option<ImageId>) -> Result<()> {
    let id = match id {
        Some(id) => id,
        None => next_id(store.images())?,
    };
    store.insert(ImageRecord::new(id, uri))?;
    settle(store).await?;
    println!("{id}");
    Ok(())
}

// ===== Helpers =====
async fn settle(store: &mut CollectionStore) -> Result<()> {
    store.flush().await;
    if let WriteStatus::Failed { error, .. } = store.status() {
        bail!("save failed: {error}");
    }
    Ok(())
}
