use std::fmt::Display;
use std::time::Instant;

use chrono::{DateTime, Utc};
use tracing::info;

use crate::utils::logging::truncate_for_log;

const ERROR_LOG_LIMIT: usize = 200;

pub const TIMING_TARGET: &str = "critique.timing";

#[derive(Debug)]
pub struct InvocationTimer {
    method: String,
    started_at: DateTime<Utc>,
    started_perf: Instant,
    status_code: Option<u16>,
    detail: Option<String>,
    completed: bool,
}

impl InvocationTimer {
    pub fn new(method: &str) -> Self {
        InvocationTimer {
            method: method.to_string(),
            started_at: Utc::now(),
            started_perf: Instant::now(),
            status_code: None,
            detail: None,
            completed: false,
        }
    }

    pub fn log_received(&self) {
        info!(
            target: TIMING_TARGET,
            "event=invocation_received method={} received_at={}",
            self.method,
            self.started_at.to_rfc3339()
        );
    }

    pub fn mark_status(&mut self, status_code: u16, detail: Option<String>) {
        self.status_code = Some(status_code);
        self.detail = detail;
    }

    pub fn log_completed(&mut self) {
        if self.completed {
            return;
        }
        self.completed = true;
        let completed_at = Utc::now();
        let duration = self.started_perf.elapsed().as_secs_f64();
        info!(
            target: TIMING_TARGET,
            "event=invocation_completed method={} started_at={} completed_at={} duration_s={:.3} status={} detail={}",
            self.method,
            self.started_at.to_rfc3339(),
            completed_at.to_rfc3339(),
            duration,
            self.status_code.map(|code| code.to_string()).unwrap_or_default(),
            self.detail.clone().unwrap_or_default()
        );
    }
}

pub fn start_invocation_timer(method: &str) -> InvocationTimer {
    let timer = InvocationTimer::new(method);
    timer.log_received();
    timer
}

pub fn complete_invocation_timer(timer: &mut InvocationTimer, status_code: u16, detail: Option<String>) {
    timer.mark_status(status_code, detail);
    timer.log_completed();
}

pub async fn log_llm_timing<T, E, F, Fut>(model: &str, operation: &str, call: F) -> Result<T, E>
where
    E: Display,
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let started_at = Utc::now();
    let started_perf = Instant::now();
    info!(
        target: TIMING_TARGET,
        "event=llm_request model={} operation={} started_at={}",
        model,
        operation,
        started_at.to_rfc3339()
    );

    let result = call().await;
    let status = match &result {
        Ok(_) => "success".to_string(),
        Err(err) => format!("error({})", truncate_for_log(&err.to_string(), ERROR_LOG_LIMIT)),
    };

    let completed_at = Utc::now();
    let duration = started_perf.elapsed().as_secs_f64();
    info!(
        target: TIMING_TARGET,
        "event=llm_response model={} operation={} completed_at={} duration_s={:.3} status={}",
        model,
        operation,
        completed_at.to_rfc3339(),
        duration,
        status
    );

    result
}
