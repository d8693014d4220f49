//! In-memory collaborators for exercising [`ambar::Deployment`] without
//! docker, sysctl, a network or a terminal.

use ambar::lifecycle::{Collaborators, Deployment};
use ambar::{AmbarError, AmbarResult, ContainerRuntime, Fetcher, HealthProbe, InstallLayout};
use ambar::{KernelTuner, Prompter};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tempfile::TempDir;

pub const CONFIG_URL: &str = "http://config.test/config.json";
pub const TEMPLATE_URL: &str = "http://config.test/docker-compose.template.yml";

/// A compose template referencing every placeholder the sample
/// configuration can satisfy.
pub const TEMPLATE: &str = "\
version: \"2.1\"
services:
  db:
    image: ${DOCKER_REPO_URL}/ambar-mongodb:latest
    volumes:
      - ${DB_PATH}:/data/db
  es:
    image: ${DOCKER_REPO_URL}/ambar-es:latest
    environment:
      - ES_JAVA_OPTS=-Xms${ES_HEAP_SIZE} -Xmx${ES_HEAP_SIZE}
    volumes:
      - ${ES_PATH}:/usr/share/elasticsearch/data
  rabbit:
    volumes:
      - ${RABBIT_PATH}:/var/lib/rabbitmq
  webapi:
    image: ${DOCKER_REPO_URL}/ambar-webapi:latest
    ports:
      - \"${API_EXT_PORT}:${API_EXT_PORT}\"
    environment:
      - uiLang=${DEFAULT_LANG_ANALYZER}
      - mode=${MODE}
      - auth=${AUTH_TYPE}
      - pipelines=${PIPELINE_COUNT}
      - crawlers=${CRAWLER_COUNT}
  frontend:
    image: ${DOCKER_REPO_URL}/ambar-frontend:latest
    ports:
      - \"${FE_EXT_PORT}:80\"
    environment:
      - api=${API_PUBLIC_URI}
";

/// Sample configuration JSON with the given data path.
pub fn sample_config(data_path: &Path) -> String {
    serde_json::json!({
        "dockerRepo": "ambar",
        "dataPath": data_path.to_string_lossy(),
        "dockerComposeTemplate": TEMPLATE_URL,
        "fe": {"external": {"protocol": "http", "host": "localhost", "port": "80"}},
        "api": {
            "external": {"protocol": "http", "host": "localhost", "port": "8080"},
            "pipelineCount": 1,
            "crawlerCount": 1,
            "defaultLangAnalyzer": "ambar_en",
            "auth": "none"
        },
        "es": {"heapSize": "2g", "containerSize": "4g"}
    })
    .to_string()
}

// ============================================================================
// RUNTIME
// ============================================================================

/// A recorded container runtime call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RuntimeCall {
    PullImage(String),
    ComposePull,
    ComposeUp,
    ComposeDown,
    ListByAncestor(String),
    Remove(Vec<String>),
}

/// Runtime operations that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RuntimeOp {
    PullImage,
    ComposePull,
    ComposeUp,
    ComposeDown,
    ListByAncestor,
    Remove,
}

#[derive(Default)]
pub struct FakeRuntime {
    calls: Mutex<Vec<RuntimeCall>>,
    containers: Mutex<HashMap<String, Vec<String>>>,
    failing: Mutex<HashSet<RuntimeOp>>,
}

impl FakeRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend containers with `ids` run from `ancestor`.
    pub fn add_containers(&self, ancestor: &str, ids: &[&str]) {
        self.containers
            .lock()
            .entry(ancestor.to_string())
            .or_default()
            .extend(ids.iter().map(|s| s.to_string()));
    }

    pub fn fail_on(&self, op: RuntimeOp) {
        self.failing.lock().insert(op);
    }

    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.calls.lock().clone()
    }

    pub fn running_containers(&self) -> usize {
        self.containers.lock().values().map(Vec::len).sum()
    }

    fn record(&self, op: RuntimeOp, call: RuntimeCall) -> AmbarResult<()> {
        self.calls.lock().push(call);
        if self.failing.lock().contains(&op) {
            return Err(AmbarError::command(format!("{op:?}"), "injected failure"));
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn pull_image(&self, image: &str) -> AmbarResult<()> {
        self.record(RuntimeOp::PullImage, RuntimeCall::PullImage(image.to_string()))
    }

    async fn compose_pull(&self, _descriptor: &Path, _project: &str) -> AmbarResult<()> {
        self.record(RuntimeOp::ComposePull, RuntimeCall::ComposePull)
    }

    async fn compose_up(&self, _descriptor: &Path, _project: &str) -> AmbarResult<()> {
        self.record(RuntimeOp::ComposeUp, RuntimeCall::ComposeUp)
    }

    async fn compose_down(&self, _descriptor: &Path, _project: &str) -> AmbarResult<()> {
        self.record(RuntimeOp::ComposeDown, RuntimeCall::ComposeDown)
    }

    async fn list_containers_by_ancestor(&self, image: &str) -> AmbarResult<Vec<String>> {
        self.record(
            RuntimeOp::ListByAncestor,
            RuntimeCall::ListByAncestor(image.to_string()),
        )?;
        Ok(self.containers.lock().get(image).cloned().unwrap_or_default())
    }

    async fn remove_containers(&self, ids: &[String]) -> AmbarResult<()> {
        self.record(RuntimeOp::Remove, RuntimeCall::Remove(ids.to_vec()))?;
        for running in self.containers.lock().values_mut() {
            running.retain(|id| !ids.contains(id));
        }
        Ok(())
    }
}

// ============================================================================
// KERNEL
// ============================================================================

/// Boot-time file kept as a string; live values kept as a list.
#[derive(Default)]
pub struct FakeKernel {
    persisted: Mutex<String>,
    live: Mutex<Vec<(String, String)>>,
    fail_live: AtomicBool,
    fail_persist: AtomicBool,
}

impl FakeKernel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_persisted(contents: &str) -> Self {
        let kernel = Self::default();
        *kernel.persisted.lock() = contents.to_string();
        kernel
    }

    pub fn persisted(&self) -> String {
        self.persisted.lock().clone()
    }

    pub fn live(&self) -> Vec<(String, String)> {
        self.live.lock().clone()
    }

    pub fn fail_live(&self, fail: bool) {
        self.fail_live.store(fail, Ordering::SeqCst);
    }

    pub fn fail_persist(&self, fail: bool) {
        self.fail_persist.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl KernelTuner for FakeKernel {
    async fn key_exists_in_persisted_file(&self, key: &str) -> AmbarResult<bool> {
        Ok(self.persisted.lock().contains(key))
    }

    async fn append_persisted_param(&self, key: &str, value: &str) -> AmbarResult<()> {
        if self.fail_persist.load(Ordering::SeqCst) {
            return Err(AmbarError::Storage("read-only file system".into()));
        }
        self.persisted.lock().push_str(&format!("{key}={value}\n"));
        Ok(())
    }

    async fn apply_live_param(&self, key: &str, value: &str) -> AmbarResult<()> {
        if self.fail_live.load(Ordering::SeqCst) {
            return Err(AmbarError::command("sysctl -w", "permission denied"));
        }
        self.live.lock().push((key.to_string(), value.to_string()));
        Ok(())
    }
}

// ============================================================================
// FETCHER, PROMPTER, PROBE
// ============================================================================

/// Serves registered bodies; any other URL fails.
#[derive(Default)]
pub struct FakeFetcher {
    bodies: Mutex<HashMap<String, String>>,
    fetched: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn serve(&self, url: &str, body: &str) {
        self.bodies.lock().insert(url.to_string(), body.to_string());
    }

    /// Make `url` unreachable from now on.
    pub fn unserve(&self, url: &str) {
        self.bodies.lock().remove(url);
    }

    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().clone()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> AmbarResult<String> {
        self.fetched.lock().push(url.to_string());
        self.bodies
            .lock()
            .get(url)
            .cloned()
            .ok_or_else(|| AmbarError::Fetch {
                url: url.to_string(),
                reason: "404 Not Found".into(),
            })
    }
}

/// Answers questions from a queue, recording what was asked.
#[derive(Default)]
pub struct ScriptedPrompter {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<Vec<String>>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_answers(&self, answers: &[&str]) {
        self.answers
            .lock()
            .extend(answers.iter().map(|s| s.to_string()));
    }

    pub fn asked(&self) -> Vec<String> {
        self.asked.lock().clone()
    }
}

impl Prompter for ScriptedPrompter {
    fn ask(&self, question: &str) -> AmbarResult<String> {
        self.asked.lock().push(question.to_string());
        self.answers
            .lock()
            .pop_front()
            .map(|a| a.trim().to_lowercase())
            .ok_or_else(|| AmbarError::InvalidArgument("no scripted answer left".into()))
    }
}

/// Reports ready from the `ready_after`-th check on (1-based); never when
/// `ready_after` is zero.
#[derive(Default)]
pub struct FakeProbe {
    ready_after: AtomicUsize,
    checks: AtomicUsize,
}

impl FakeProbe {
    pub fn ready_after(checks: usize) -> Self {
        Self {
            ready_after: AtomicUsize::new(checks),
            checks: AtomicUsize::new(0),
        }
    }

    pub fn set_ready_after(&self, checks: usize) {
        self.ready_after.store(checks, Ordering::SeqCst);
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HealthProbe for FakeProbe {
    async fn check(&self, _url: &str) -> bool {
        let n = self.checks.fetch_add(1, Ordering::SeqCst) + 1;
        let ready_after = self.ready_after.load(Ordering::SeqCst);
        ready_after != 0 && n >= ready_after
    }
}

// ============================================================================
// HARNESS
// ============================================================================

/// A deployment rooted in a temp dir, wired to fakes.
///
/// The remote configuration and template are served at [`CONFIG_URL`] and
/// [`TEMPLATE_URL`]; the data path lives inside the temp dir.
pub struct TestDeployment {
    _dir: TempDir,
    pub home: PathBuf,
    pub data_path: PathBuf,
    pub runtime: Arc<FakeRuntime>,
    pub kernel: Arc<FakeKernel>,
    pub fetcher: Arc<FakeFetcher>,
    pub prompter: Arc<ScriptedPrompter>,
    pub probe: Arc<FakeProbe>,
    pub deployment: Deployment,
}

impl TestDeployment {
    pub fn new() -> Self {
        Self::with_kernel(FakeKernel::new())
    }

    pub fn with_kernel(kernel: FakeKernel) -> Self {
        let dir = TempDir::new().expect("temp dir");
        let home = dir.path().join("home");
        let data_path = dir.path().join("data");

        let runtime = Arc::new(FakeRuntime::new());
        let kernel = Arc::new(kernel);
        let fetcher = Arc::new(FakeFetcher::new());
        let prompter = Arc::new(ScriptedPrompter::new());
        let probe = Arc::new(FakeProbe::ready_after(1));

        fetcher.serve(CONFIG_URL, &sample_config(&data_path));
        fetcher.serve(TEMPLATE_URL, TEMPLATE);

        let deployment = Deployment::new(
            InstallLayout::new(home.clone()),
            Collaborators {
                runtime: runtime.clone(),
                kernel: kernel.clone(),
                fetcher: fetcher.clone(),
                prompter: prompter.clone(),
                probe: probe.clone(),
            },
        );

        Self {
            _dir: dir,
            home,
            data_path,
            runtime,
            kernel,
            fetcher,
            prompter,
            probe,
            deployment,
        }
    }

    pub fn layout(&self) -> &InstallLayout {
        self.deployment.layout()
    }

    /// Install from [`CONFIG_URL`] accepting the proposed host and port.
    pub async fn install_defaults(&self) -> AmbarResult<ambar::ActionReport> {
        self.prompter.push_answers(&["y", "y"]);
        self.deployment
            .install(ambar::InstallOptions {
                source: ambar::ConfigSource::Remote(CONFIG_URL.to_string()),
                detected_address: std::net::Ipv4Addr::new(192, 168, 1, 42),
            })
            .await
    }
}

impl Default for TestDeployment {
    fn default() -> Self {
        Self::new()
    }
}
