#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use tempfile::TempDir;
use uuid::Uuid;

use eva_core::config::EvaConfig;
use eva_core::models::user::User;
use eva_generation::orchestrator::Orchestrator;
use eva_ledger::ledger::Ledger;
use eva_ledger::memory::MemoryStore;
use eva_ledger::store::LedgerStore;
use eva_providers::error::ProviderError;
use eva_providers::media::{
    BoxFuture, JobHandle, JobRequest, JobStatus, MediaProvider, TextModel,
};
use eva_providers::registry::ProviderSet;
use eva_storage::artifact::ArtifactFetcher;
use eva_storage::local::LocalStore;

/// How a [`FakeProvider`] answers `submit`.
pub enum Submit {
    /// Synchronous provider: the handle already carries this URL.
    Ready(String),
    /// Asynchronous provider: the handle must be polled.
    Async,
    MissingCredential,
}

/// Scripted provider. Polls pop `script` in order and report `Pending`
/// once it runs dry.
pub struct FakeProvider {
    name: &'static str,
    submit: Submit,
    script: Mutex<VecDeque<Result<JobStatus, ProviderError>>>,
    submitted: Mutex<Vec<JobRequest>>,
    polls: AtomicU32,
}

impl FakeProvider {
    pub fn new(name: &'static str, submit: Submit) -> Arc<Self> {
        Self::scripted(name, submit, Vec::new())
    }

    pub fn scripted(
        name: &'static str,
        submit: Submit,
        script: Vec<Result<JobStatus, ProviderError>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            name,
            submit,
            script: Mutex::new(script.into()),
            submitted: Mutex::new(Vec::new()),
            polls: AtomicU32::new(0),
        })
    }

    pub fn submitted(&self) -> Vec<JobRequest> {
        self.submitted.lock().expect("lock").clone()
    }

    pub fn polls(&self) -> u32 {
        self.polls.load(Ordering::SeqCst)
    }
}

impl MediaProvider for FakeProvider {
    fn name(&self) -> &'static str {
        self.name
    }

    fn submit<'a>(
        &'a self,
        request: &'a JobRequest,
    ) -> BoxFuture<'a, Result<JobHandle, ProviderError>> {
        Box::pin(async move {
            self.submitted.lock().expect("lock").push(request.clone());
            let ready_url = match &self.submit {
                Submit::Ready(url) => Some(url.clone()),
                Submit::Async => None,
                Submit::MissingCredential => {
                    return Err(ProviderError::MissingCredential(self.name));
                }
            };
            Ok(JobHandle {
                provider: self.name,
                kind: request.kind,
                job_id: format!("{}-job", self.name),
                ready_url,
            })
        })
    }

    fn poll<'a>(&'a self, _handle: &'a JobHandle) -> BoxFuture<'a, Result<JobStatus, ProviderError>> {
        Box::pin(async move {
            self.polls.fetch_add(1, Ordering::SeqCst);
            self.script
                .lock()
                .expect("lock")
                .pop_front()
                .unwrap_or(Ok(JobStatus::Pending))
        })
    }
}

/// Text model answering every prompt the same way. `None` behaves like a
/// missing API key.
pub struct FakeText(pub Option<String>);

impl TextModel for FakeText {
    fn complete<'a>(&'a self, _prompt: &'a str) -> BoxFuture<'a, Result<String, ProviderError>> {
        Box::pin(async move {
            self.0
                .clone()
                .ok_or(ProviderError::MissingCredential("deepseek"))
        })
    }
}

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub store: Arc<MemoryStore>,
    pub user_id: Uuid,
    pub media: TempDir,
}

impl Harness {
    pub async fn balance(&self) -> Decimal {
        self.orchestrator
            .ledger()
            .balance(self.user_id)
            .await
            .expect("balance")
    }

    pub async fn transactions(&self) -> Vec<eva_core::models::transaction::Transaction> {
        self.orchestrator
            .ledger()
            .recent_transactions(self.user_id, 100)
            .await
            .expect("transactions")
    }

    pub fn files(&self, namespace: &str) -> Vec<std::path::PathBuf> {
        match std::fs::read_dir(self.media.path().join(namespace)) {
            Ok(entries) => entries.map(|e| e.expect("entry").path()).collect(),
            Err(_) => Vec::new(),
        }
    }
}

pub struct Providers {
    pub create: Arc<FakeProvider>,
    pub edit: Arc<FakeProvider>,
    pub video: Arc<FakeProvider>,
    pub text: Option<String>,
}

impl Default for Providers {
    fn default() -> Self {
        Self {
            create: FakeProvider::new("create", Submit::MissingCredential),
            edit: FakeProvider::new("edit", Submit::MissingCredential),
            video: FakeProvider::new("video", Submit::MissingCredential),
            text: None,
        }
    }
}

pub async fn harness(balance: i64, config: EvaConfig, providers: &Providers) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let user = User::new("tester@example.com", Decimal::from(balance));
    store.insert_user(&user).await.expect("insert user");

    let media = tempfile::tempdir().expect("tempdir");
    let local = LocalStore::new(media.path(), config.media.url_prefix.clone());
    let fetcher = Arc::new(ArtifactFetcher::new(reqwest::Client::new(), Arc::new(local)));

    let set = ProviderSet {
        image_create: providers.create.clone(),
        image_edit: providers.edit.clone(),
        video: providers.video.clone(),
        text: Arc::new(FakeText(providers.text.clone())),
    };

    let ledger = Arc::new(Ledger::new(store.clone()));
    Harness {
        orchestrator: Orchestrator::new(&config, ledger, set, fetcher),
        store,
        user_id: user.id,
        media,
    }
}

/// Fast polling so tests that do reach the poller finish quickly.
pub fn fast_config() -> EvaConfig {
    let mut config = EvaConfig::default();
    config.polling.image_interval_ms = 1;
    config.polling.video_interval_ms = 1;
    config
}
