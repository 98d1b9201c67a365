use crate::models::session::{ScanSession, ScanStatus, SessionSnapshot};
use crate::services::gemini::GeminiClient;
use crate::utils::target::normalize_target;
use anyhow::Result;
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use uuid::Uuid;

// Cosmetic pacing for the terminal log; not driven by real work.
pub const SCAN_STEPS: [&str; 9] = [
    "Initializing passive scan modules...",
    "Resolving DNS records...",
    "Analyzing SSL/TLS certificate chain...",
    "Fuzzing HTTP security headers...",
    "Detecting CMS and server technologies...",
    "Checking for exposed .git and .env files...",
    "Simulating XSS and SQLi attack vectors (Passive)...",
    "Aggregating risk score...",
    "Finalizing report...",
];

pub const DEFAULT_STEP_DELAY_MS: u64 = 600;

pub struct ScanOrchestrator {
    gemini: Arc<GeminiClient>,
    session: Arc<RwLock<ScanSession>>,
    step_delay: Duration,
}

impl ScanOrchestrator {
    pub fn new(gemini: Arc<GeminiClient>, step_delay: Duration) -> Self {
        Self {
            gemini,
            session: Arc::new(RwLock::new(ScanSession::new())),
            step_delay,
        }
    }

    pub async fn start_scan(&self, raw_target: &str) -> Result<SessionSnapshot> {
        let target = normalize_target(raw_target)?;

        let seq = {
            let mut session = self.session.write().await;
            session.seq += 1;
            session.scan_id = Uuid::new_v4();
            session.status = ScanStatus::Scanning;
            session.logs.clear();
            session.result = None;
            session.seq
        };

        info!("Starting scan {} for {}", seq, target);

        tokio::spawn(run_scan(
            Arc::clone(&self.gemini),
            Arc::clone(&self.session),
            self.step_delay,
            seq,
            target,
        ));

        Ok(self.snapshot().await)
    }

    pub async fn reset(&self) -> SessionSnapshot {
        let mut session = self.session.write().await;
        // Bumping the sequence abandons any scan still in flight.
        session.seq += 1;
        session.scan_id = Uuid::nil();
        session.status = ScanStatus::Idle;
        session.logs.clear();
        session.result = None;
        snapshot_of(&session)
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let session = self.session.read().await;
        snapshot_of(&session)
    }
}

async fn run_scan(
    gemini: Arc<GeminiClient>,
    session: Arc<RwLock<ScanSession>>,
    step_delay: Duration,
    seq: u64,
    target: String,
) {
    for step in SCAN_STEPS {
        tokio::time::sleep(step_delay).await;

        let mut guard = session.write().await;
        if guard.seq != seq {
            debug!("Scan {} superseded, abandoning log sequence", seq);
            return;
        }
        guard.logs.push(format!("{} [OK]", step));
    }

    let report = gemini.generate_report(&target).await;

    let mut guard = session.write().await;
    if guard.seq != seq {
        debug!("Scan {} superseded, discarding late report", seq);
        return;
    }
    guard.result = Some(report);
    guard.status = ScanStatus::Complete;
    info!("Scan {} complete for {}", seq, target);
}

fn snapshot_of(session: &ScanSession) -> SessionSnapshot {
    SessionSnapshot {
        scan_id: session.scan_id,
        status: session.status.clone(),
        logs: session.logs.clone(),
        result: session.result.clone(),
    }
}
