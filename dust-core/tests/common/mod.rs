#![allow(dead_code)]

pub mod contract;

use axum::{
    Router,
    body::Bytes,
    extract::{Path, State},
    http::{Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::any,
};
use dust_core::{DistributedStorage, HybridStorage, StorageConfig};
use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

pub const BASE_URL: &str = "http://media.example.com/";

#[derive(Default)]
struct HostState {
    files: Mutex<HashMap<String, Bytes>>,
    readonly: AtomicBool,
    override_code: Mutex<Option<u16>>,
}

/// In-process media host speaking the PUT/GET/HEAD/DELETE contract.
///
/// `readonly` answers 403 to writes. `override_code` answers every request
/// with that status without touching the files.
pub struct MediaHost {
    state: Arc<HostState>,
    address: SocketAddr,
    task: JoinHandle<()>,
}

impl MediaHost {
    pub async fn start() -> Self {
        let state = Arc::new(HostState::default());
        let app = Router::new()
            .route("/*name", any(handle))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            state,
            address,
            task,
        }
    }

    pub fn address(&self) -> String {
        self.address.to_string()
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.state.files.lock().unwrap().contains_key(name)
    }

    pub fn get_file(&self, name: &str) -> Option<String> {
        self.state
            .files
            .lock()
            .unwrap()
            .get(name)
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
    }

    pub fn create_file(&self, name: &str, content: &str) {
        self.state
            .files
            .lock()
            .unwrap()
            .insert(name.to_string(), Bytes::from(content.to_string()));
    }

    pub fn delete_file(&self, name: &str) {
        self.state.files.lock().unwrap().remove(name);
    }

    pub fn set_readonly(&self, readonly: bool) {
        self.state.readonly.store(readonly, Ordering::SeqCst);
    }

    pub fn set_override_code(&self, code: u16) {
        *self.state.override_code.lock().unwrap() = Some(code);
    }
}

impl Drop for MediaHost {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn handle(
    State(state): State<Arc<HostState>>,
    method: Method,
    Path(name): Path<String>,
    body: Bytes,
) -> Response {
    if let Some(code) = *state.override_code.lock().unwrap() {
        return StatusCode::from_u16(code).unwrap().into_response();
    }

    let readonly = state.readonly.load(Ordering::SeqCst);
    let mut files = state.files.lock().unwrap();
    match method {
        Method::PUT if readonly => StatusCode::FORBIDDEN.into_response(),
        Method::PUT => match files.insert(name, body) {
            Some(_) => StatusCode::NO_CONTENT.into_response(),
            None => StatusCode::CREATED.into_response(),
        },
        Method::DELETE if readonly => StatusCode::FORBIDDEN.into_response(),
        Method::DELETE => match files.remove(&name) {
            Some(_) => StatusCode::NO_CONTENT.into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        Method::HEAD => match files.get(&name) {
            Some(bytes) => (
                StatusCode::OK,
                [(header::CONTENT_LENGTH, bytes.len().to_string())],
            )
                .into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        Method::GET => match files.get(&name) {
            Some(bytes) => (StatusCode::OK, bytes.clone()).into_response(),
            None => StatusCode::NOT_FOUND.into_response(),
        },
        _ => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

/// Collects everything logged on the current thread while installed.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn install() -> (Self, DefaultGuard) {
        let capture = Self::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(capture.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (capture, guard)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).into_owned()
    }
}

pub struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter {
            buffer: self.buffer.clone(),
        }
    }
}

/// A storage wired to running media hosts, with helpers that act on the
/// hosts (and the mirror, if any) directly.
///
/// With two hosts the storage reads from the secondary first, so the
/// primary, which the helpers inspect and break, is the failover target.
pub struct Fixture<S> {
    pub storage: S,
    pub hosts: Vec<MediaHost>,
    pub mirror: Option<TempDir>,
    logs: LogCapture,
    _log_guard: DefaultGuard,
}

impl<S> Fixture<S> {
    pub fn primary(&self) -> &MediaHost {
        &self.hosts[0]
    }

    pub fn has_file(&self, name: &str) -> bool {
        self.primary().has_file(name)
    }

    pub fn get_file(&self, name: &str) -> Option<String> {
        self.primary().get_file(name)
    }

    pub fn create_file(&self, name: &str, content: &str) {
        for host in &self.hosts {
            host.create_file(name, content);
        }
        if let Some(mirror) = &self.mirror {
            let path = mirror.path().join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, content).unwrap();
        }
    }

    pub fn delete_file(&self, name: &str) {
        for host in &self.hosts {
            host.delete_file(name);
        }
        if let Some(mirror) = &self.mirror {
            std::fs::remove_file(mirror.path().join(name)).unwrap();
        }
    }

    pub fn log(&self) -> String {
        self.logs.contents()
    }

    pub fn mirror_root(&self) -> &std::path::Path {
        self.mirror.as_ref().unwrap().path()
    }
}

async fn start_hosts(count: usize) -> (Vec<MediaHost>, StorageConfig) {
    let mut hosts = Vec::with_capacity(count);
    for _ in 0..count {
        hosts.push(MediaHost::start().await);
    }

    let addresses: Vec<String> = hosts.iter().rev().map(MediaHost::address).collect();
    let config = StorageConfig::new(addresses)
        .with_base_url(BASE_URL)
        .with_timeout_secs(5);
    (hosts, config)
}

pub async fn distributed(host_count: usize) -> Fixture<DistributedStorage> {
    let (logs, log_guard) = LogCapture::install();
    let (hosts, config) = start_hosts(host_count).await;
    let storage = DistributedStorage::new(&config).unwrap();

    Fixture {
        storage,
        hosts,
        mirror: None,
        logs,
        _log_guard: log_guard,
    }
}

pub async fn hybrid(host_count: usize) -> Fixture<HybridStorage> {
    let (logs, log_guard) = LogCapture::install();
    let (hosts, config) = start_hosts(host_count).await;
    let mirror = tempfile::tempdir().unwrap();
    let storage = HybridStorage::new(&config, mirror.path()).unwrap();

    Fixture {
        storage,
        hosts,
        mirror: Some(mirror),
        logs,
        _log_guard: log_guard,
    }
}
