use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ScanResult {
    pub target: String,
    pub timestamp: String,
    pub score: i64,
    #[serde(rename = "riskLevel")]
    pub risk_level: RiskLevel,
    pub summary: String,
    pub ssl: SslInfo,
    pub headers: HeaderAudit,
    #[serde(rename = "techStack")]
    pub tech_stack: TechStack,
    #[serde(rename = "openPorts")]
    pub open_ports: Vec<u16>,
    pub dns: DnsInfo,
    #[serde(rename = "sensitiveFiles")]
    pub sensitive_files: SensitiveFiles,
    pub vulnerabilities: Vec<Vulnerability>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SslInfo {
    pub valid: bool,
    pub issuer: String,
    pub expiry: String,
    pub algorithm: String,
    pub grade: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HeaderAudit {
    pub grade: String,
    pub missing: Vec<String>,
    pub present: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TechStack {
    pub cms: Option<String>,
    pub server: Option<String>,
    pub language: Option<String>,
    pub frameworks: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DnsInfo {
    pub ip: String,
    pub registrar: String,
    pub location: String,
    pub nameservers: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SensitiveFiles {
    pub found: bool,
    pub files: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Vulnerability {
    #[serde(rename = "type")]
    pub vuln_type: String,
    pub severity: Severity,
    pub description: String,
    pub remediation: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}
