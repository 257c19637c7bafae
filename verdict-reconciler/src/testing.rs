//! Scripted status, report and transport sources for tests

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;
use verdict_client::{ClientError, JsonTransport};
use verdict_core::domain::normalize::{NormalizedReport, normalize_report};
use verdict_core::domain::status::JobStatus;

use crate::error::FetchError;
use crate::repository::{ReportRepository, StatusRepository};

/// Pops the next scripted entry, repeating the last one once exhausted
fn next_entry<T: Clone>(script: &Mutex<VecDeque<T>>) -> Option<T> {
    let mut script = script.lock().unwrap();
    if script.len() > 1 {
        script.pop_front()
    } else {
        script.front().cloned()
    }
}

pub struct ScriptedStatusRepository {
    script: Mutex<VecDeque<Result<JobStatus, FetchError>>>,
    calls: AtomicUsize,
}

impl ScriptedStatusRepository {
    pub fn new(script: Vec<Result<JobStatus, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StatusRepository for ScriptedStatusRepository {
    async fn fetch_status(&self, _job_id: &str) -> Result<JobStatus, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        next_entry(&self.script)
            .unwrap_or_else(|| Err(FetchError::Transient("script is empty".into())))
    }
}

pub struct ScriptedReportRepository {
    script: Mutex<VecDeque<Result<Value, FetchError>>>,
    calls: AtomicUsize,
}

impl ScriptedReportRepository {
    pub fn new(script: Vec<Result<Value, FetchError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportRepository for ScriptedReportRepository {
    async fn fetch_report(&self, _job_id: &str) -> Result<NormalizedReport, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        next_entry(&self.script)
            .unwrap_or_else(|| Err(FetchError::NotReady("script is empty".into())))
            .map(normalize_report)
    }
}

/// Status source whose fetch blocks until released
pub struct GatedStatusRepository {
    status: JobStatus,
    entered: Notify,
    gate: Notify,
}

impl GatedStatusRepository {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            entered: Notify::new(),
            gate: Notify::new(),
        }
    }

    pub async fn wait_until_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl StatusRepository for GatedStatusRepository {
    async fn fetch_status(&self, _job_id: &str) -> Result<JobStatus, FetchError> {
        self.entered.notify_one();
        self.gate.notified().await;
        Ok(self.status.clone())
    }
}

/// Report source whose fetch blocks until released
pub struct GatedReportRepository {
    report: Value,
    entered: Notify,
    gate: Notify,
    calls: AtomicUsize,
}

impl GatedReportRepository {
    pub fn new(report: Value) -> Self {
        Self {
            report,
            entered: Notify::new(),
            gate: Notify::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub async fn wait_until_entered(&self) {
        self.entered.notified().await;
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReportRepository for GatedReportRepository {
    async fn fetch_report(&self, _job_id: &str) -> Result<NormalizedReport, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.entered.notify_one();
        self.gate.notified().await;
        Ok(normalize_report(self.report.clone()))
    }
}

/// Transport answering by exact path; unknown paths get a 404
pub struct ScriptedTransport {
    routes: HashMap<String, Mutex<VecDeque<Result<Value, u16>>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Sets the response for `path`, replacing any script it had
    pub fn respond(mut self, path: &str, response: Result<Value, u16>) -> Self {
        self.routes
            .insert(path.to_string(), Mutex::new(VecDeque::from([response])));
        self
    }

    /// Appends a response served after the earlier ones for `path`
    pub fn then(mut self, path: &str, response: Result<Value, u16>) -> Self {
        self.routes
            .entry(path.to_string())
            .or_default()
            .get_mut()
            .unwrap()
            .push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_str() == path)
            .count()
    }
}

#[async_trait]
impl JsonTransport for ScriptedTransport {
    async fn get_json(&self, path: &str) -> verdict_client::Result<Value> {
        self.requests.lock().unwrap().push(path.to_string());
        let response = self
            .routes
            .get(path)
            .and_then(next_entry)
            .unwrap_or(Err(404));
        response.map_err(|status| ClientError::api_error(status, format!("scripted {}", status)))
    }
}
