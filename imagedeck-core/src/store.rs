use crate::{
    collection, CollectionRepository, CoreError, ImageId, ImageRecord, KeyValueStore,
    KvCollectionRepo, Notice, Phase, RetryPolicy, Route, StoreConfig,
};
use std::sync::Arc;
use tokio::sync::mpsc::{self, error::TryRecvError};

/// Sequence number of a submitted write. Tickets grow by one per submission.
pub type WriteTicket = u64;

struct SaveJob {
    ticket: WriteTicket,
    images: Vec<ImageRecord>,
}

/// Reported once per write the persister actually performed. A write covers
/// every ticket up to and including `through`, since newer snapshots replace
/// older ones that were still queued.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WriteOutcome {
    pub through: WriteTicket,
    pub attempts: u32,
    pub result: Result<(), CoreError>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WriteStatus {
    Idle,
    Pending { ticket: WriteTicket },
    Saved { ticket: WriteTicket },
    Failed { ticket: WriteTicket, error: CoreError },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeleteOutcome {
    /// Records removed from memory; zero when the id was unknown.
    pub removed: usize,
    /// `None` when nothing was handed to the persister.
    pub ticket: Option<WriteTicket>,
}

/// Keeps the in-memory study list consistent with the stored collection.
///
/// Mutations apply to memory first and are then handed to a background
/// persister that writes snapshots in submission order, retrying with
/// backoff. Outcomes come back through [`CollectionStore::poll_writes`] or
/// [`CollectionStore::flush`].
pub struct CollectionStore {
    repo: Arc<dyn CollectionRepository>,
    images: Vec<ImageRecord>,
    loading: bool,
    failure: Option<String>,
    notices: Vec<Notice>,
    jobs: mpsc::UnboundedSender<SaveJob>,
    outcomes: mpsc::UnboundedReceiver<WriteOutcome>,
    submitted: WriteTicket,
    settled: WriteTicket,
    status: WriteStatus,
}

impl CollectionStore {
    /// Spawns the persister on the current tokio runtime.
    pub fn new(repo: Arc<dyn CollectionRepository>, retry: RetryPolicy) -> Self {
        let (jobs, job_rx) = mpsc::unbounded_channel();
        let (outcome_tx, outcomes) = mpsc::unbounded_channel();
        tokio::spawn(run_persister(repo.clone(), retry, job_rx, outcome_tx));
        Self {
            repo,
            images: Vec::new(),
            loading: true,
            failure: None,
            notices: Vec::new(),
            jobs,
            outcomes,
            submitted: 0,
            settled: 0,
            status: WriteStatus::Idle,
        }
    }

    pub fn from_config(kv: Arc<dyn KeyValueStore>, config: &StoreConfig) -> Self {
        let repo = KvCollectionRepo::new(kv, config);
        Self::new(Arc::new(repo), config.retry.clone())
    }

    /// Replaces the in-memory collection with the stored one. Called every
    /// time the study list gains focus. While the last write is failed the
    /// in-memory collection is kept, so `retry_save` still has the edits.
    pub async fn load(&mut self) -> Result<(), CoreError> {
        self.loading = true;
        // our own queued writes must land before we read the slot back
        self.flush().await;
        if let WriteStatus::Failed { ticket, .. } = &self.status {
            // the slot is behind memory; reading it would undo unsaved edits
            tracing::warn!(ticket = *ticket, "last write failed, keeping unsaved collection");
            self.loading = false;
            return Ok(());
        }
        let res = self.repo.load().await;
        self.loading = false;
        match res {
            Ok(images) => {
                self.images = images;
                self.failure = None;
                Ok(())
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to load collection");
                self.images.clear();
                self.failure = Some(e.to_string());
                Err(e)
            }
        }
    }

    /// Removes every record with `id`, reflects it immediately, then queues
    /// the resulting collection for persistence. An unknown id still
    /// re-persists and is still acknowledged.
    pub fn delete(&mut self, id: ImageId) -> DeleteOutcome {
        let before = self.images.len();
        self.images = collection::remove_by_id(&self.images, id);
        let removed = before - self.images.len();
        self.notices.push(Notice::Deleted { id, removed });

        if self.failure.is_some() {
            tracing::warn!(id, "collection not loaded, delete not persisted");
            return DeleteOutcome { removed, ticket: None };
        }
        tracing::info!(id, removed, "image deleted");
        DeleteOutcome { removed, ticket: Some(self.submit()) }
    }

    /// Appends a record produced by the register view.
    pub fn insert(&mut self, record: ImageRecord) -> Result<WriteTicket, CoreError> {
        if self.failure.is_some() {
            return Err(CoreError::Invalid("collection failed to load"));
        }
        if collection::find_by_id(&self.images, record.id).is_some() {
            return Err(CoreError::Conflict("image id already exists"));
        }
        let id = record.id;
        self.images.push(record);
        self.notices.push(Notice::Added { id });
        tracing::info!(id, "image registered");
        Ok(self.submit())
    }

    /// Re-submits the current collection after a failed write.
    pub fn retry_save(&mut self) -> Option<WriteTicket> {
        match self.status {
            WriteStatus::Failed { .. } => Some(self.submit()),
            _ => None,
        }
    }

    /// Drains finished writes without waiting.
    pub fn poll_writes(&mut self) -> Vec<WriteOutcome> {
        let mut out = Vec::new();
        loop {
            match self.outcomes.try_recv() {
                Ok(o) => {
                    self.apply(&o);
                    out.push(o);
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.persister_gone();
                    break;
                }
            }
        }
        out
    }

    /// Waits until every submitted write has settled.
    pub async fn flush(&mut self) -> Vec<WriteOutcome> {
        let mut out = Vec::new();
        while self.settled < self.submitted {
            match self.outcomes.recv().await {
                Some(o) => {
                    self.apply(&o);
                    out.push(o);
                }
                None => {
                    self.persister_gone();
                    break;
                }
            }
        }
        out
    }

    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    pub fn get(&self, id: ImageId) -> Option<&ImageRecord> {
        collection::find_by_id(&self.images, id)
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Loading
        } else if let Some(msg) = &self.failure {
            Phase::Failed(msg.clone())
        } else if self.images.is_empty() {
            Phase::Empty
        } else {
            Phase::Populated
        }
    }

    pub fn status(&self) -> &WriteStatus {
        &self.status
    }

    pub fn has_pending_writes(&self) -> bool {
        self.settled < self.submitted
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn open(&self, id: ImageId) -> Option<Route> {
        self.get(id).map(|r| Route::Detail { id: r.id })
    }

    pub fn register(&self) -> Route {
        Route::Create
    }

    fn submit(&mut self) -> WriteTicket {
        self.submitted += 1;
        let ticket = self.submitted;
        let job = SaveJob { ticket, images: self.images.clone() };
        if self.jobs.send(job).is_err() {
            self.persister_gone();
        } else {
            self.status = WriteStatus::Pending { ticket };
        }
        ticket
    }

    fn apply(&mut self, o: &WriteOutcome) {
        self.settled = self.settled.max(o.through);
        match &o.result {
            Ok(()) if self.settled < self.submitted => {
                self.status = WriteStatus::Pending { ticket: self.submitted };
            }
            Ok(()) => {
                self.status = WriteStatus::Saved { ticket: o.through };
            }
            Err(e) => {
                self.status = WriteStatus::Failed { ticket: o.through, error: e.clone() };
                self.notices.push(Notice::SaveFailed { error: e.to_string() });
            }
        }
    }

    fn persister_gone(&mut self) {
        if self.settled >= self.submitted {
            return;
        }
        tracing::error!(ticket = self.submitted, "persister stopped before write settled");
        let error = CoreError::Storage("persister stopped");
        self.settled = self.submitted;
        self.notices.push(Notice::SaveFailed { error: error.to_string() });
        self.status = WriteStatus::Failed { ticket: self.submitted, error };
    }
}

async fn run_persister(
    repo: Arc<dyn CollectionRepository>,
    retry: RetryPolicy,
    mut jobs: mpsc::UnboundedReceiver<SaveJob>,
    outcomes: mpsc::UnboundedSender<WriteOutcome>,
) {
    while let Some(mut job) = jobs.recv().await {
        // whole-value replace: only the newest queued snapshot matters
        while let Ok(newer) = jobs.try_recv() {
            job = newer;
        }
        let repo = &*repo;
        let images = &job.images[..];
        let (result, attempts) = retry.run(move || repo.save(images)).await;
        if let Err(e) = &result {
            tracing::error!(ticket = job.ticket, attempts, error = %e, "giving up on collection write");
        }
        let outcome = WriteOutcome { through: job.ticket, attempts, result };
        if outcomes.send(outcome).is_err() {
            break;
        }
    }
}
