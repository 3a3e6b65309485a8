use clap::{Parser, Subcommand, ValueEnum};
use imagedeck_core::{ImageId, MalformedPolicy, RetryPolicy, StoreConfig, DEFAULT_COLLECTION_KEY};
use std::path::PathBuf;

#[derive(Debug, Clone, ValueEnum)]
pub enum StoreKind {
    Json,
    Sqlite,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OnMalformed {
    /// Treat unreadable data as an empty collection
    Empty,
    /// Refuse to continue
    Fail,
}

#[derive(Debug, Parser, Clone)]
#[command(name = "imagedeck", version, about = "ImageDeck flashcard image list (CLI/TUI)")]
pub struct Cli {
    /// Storage backend
    #[arg(long, value_enum, env = "IMAGEDECK_STORE", default_value_t = StoreKind::Json)]
    pub store: StoreKind,

    /// SQLite DB path when --store sqlite (defaults to app data dir)
    #[arg(long, env = "IMAGEDECK_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// JSON store file when --store json (defaults to app data dir)
    #[arg(long, env = "IMAGEDECK_DATA_FILE")]
    pub data_file: Option<PathBuf>,

    /// Key the collection is stored under
    #[arg(long, env = "IMAGEDECK_KEY", default_value = DEFAULT_COLLECTION_KEY)]
    pub key: String,

    #[arg(long, value_enum, default_value_t = OnMalformed::Empty)]
    pub on_malformed: OnMalformed,

    /// Attempts per write before giving up
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Log destination (the TUI defaults to a file in the app data dir)
    #[arg(long, env = "IMAGEDECK_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// List registered images
    List,
    /// Show one image
    Show { id: ImageId },
    /// Delete an image
    Rm { id: ImageId },
    /// Register an image
    Add {
        uri: String,
        #[arg(long)]
        id: Option<ImageId>,
    },
    /// Launch the study list TUI
    Tui,
}

impl Cli {
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            key: self.key.clone(),
            on_malformed: match self.on_malformed {
                OnMalformed::Empty => MalformedPolicy::FallBackEmpty,
                OnMalformed::Fail => MalformedPolicy::Fail,
            },
            retry: RetryPolicy { max_attempts: self.retries, ..RetryPolicy::default() },
        }
    }
}
