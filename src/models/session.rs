use crate::models::report::ScanResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Idle,
    Scanning,
    Complete,
    Error,
}

#[derive(Debug, Clone)]
pub struct ScanSession {
    pub scan_id: Uuid,
    // Bumped on every start_scan; writes from an older sequence are stale
    // and must not be applied.
    pub seq: u64,
    pub status: ScanStatus,
    pub logs: Vec<String>,
    pub result: Option<ScanResult>,
}

impl ScanSession {
    pub fn new() -> Self {
        Self {
            scan_id: Uuid::nil(),
            seq: 0,
            status: ScanStatus::Idle,
            logs: Vec::new(),
            result: None,
        }
    }
}

impl Default for ScanSession {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionSnapshot {
    #[serde(rename = "scanId")]
    pub scan_id: Uuid,
    pub status: ScanStatus,
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScanResult>,
}
