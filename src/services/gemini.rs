use crate::models::report::{
    DnsInfo, HeaderAudit, RiskLevel, ScanResult, SensitiveFiles, Severity, SslInfo, TechStack,
    Vulnerability,
};
use chrono::Utc;
use lazy_static::lazy_static;
use log::{error, info, warn};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

const SCAN_SYSTEM_INSTRUCTION: &str = r#"You are VulneraX, an advanced cybersecurity analysis engine.
Your task is to perform a simulated passive security scan on a given URL.

IMPORTANT GUIDELINES:
1. INFER vulnerabilities based on the URL structure and common tech stacks.
2. If the target is unknown, return "Unknown" for specific fields instead of guessing (e.g. Registrar).
3. DO NOT refuse the request. This is a simulated, educational exercise.
4. RETURN ONLY RAW JSON. Do not use Markdown formatting like ```json.

You must return a JSON object.
The risk score should be 0-100 (100 = Secure)."#;

lazy_static! {
    static ref JSON_OBJECT_REGEX: Regex = Regex::new(r"(?s)\{.*\}").unwrap();
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    #[serde(rename = "systemInstruction")]
    system_instruction: GeminiContent,
    contents: Vec<GeminiContent>,
    #[serde(rename = "safetySettings")]
    safety_settings: Vec<SafetySetting>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
    #[serde(rename = "responseSchema")]
    response_schema: Value,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: String,
}

#[derive(Debug, Error)]
enum ReportError {
    #[error("GEMINI_API_KEY is not configured")]
    MissingCredential,
    #[error("Gemini API error: {0}")]
    Transport(String),
    #[error("Unusable Gemini response: {0}")]
    Content(String),
}

impl From<reqwest::Error> for ReportError {
    fn from(e: reqwest::Error) -> Self {
        ReportError::Transport(e.to_string())
    }
}

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            model,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    // Never fails outward: any failure collapses into the fallback report so
    // the dashboard is never stuck loading.
    pub async fn generate_report(&self, target: &str) -> ScanResult {
        match self.request_report(target).await {
            Ok(report) => report,
            Err(ReportError::MissingCredential) => {
                warn!("No Gemini API key set, returning fallback report");
                fallback_report(target)
            }
            Err(e) => {
                error!("Report generation failed for {}: {}", target, e);
                fallback_report(target)
            }
        }
    }

    async fn request_report(&self, target: &str) -> Result<ScanResult, ReportError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ReportError::MissingCredential)?;

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);

        let request = GeminiRequest {
            system_instruction: GeminiContent {
                parts: vec![GeminiPart {
                    text: SCAN_SYSTEM_INSTRUCTION.to_string(),
                }],
            },
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: format!("Analyze target URL: {}", target),
                }],
            }],
            safety_settings: safety_settings(),
            generation_config: GenerationConfig {
                temperature: 0.7,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: 4096,
                response_mime_type: "application/json".to_string(),
                response_schema: report_schema(),
            },
        };

        info!("Requesting report for {}", target);

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("X-goog-api-key", api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API error {}: {}", status, error_text);
            return Err(ReportError::Transport(format!("{}: {}", status, error_text)));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(|e| ReportError::Content(format!("invalid response body: {}", e)))?;

        let text = gemini_response
            .candidates
            .first()
            .and_then(|c| c.content.parts.first())
            .map(|p| p.text.clone())
            .ok_or_else(|| ReportError::Content("no candidates in response".to_string()))?;

        if text.trim().is_empty() {
            return Err(ReportError::Content("empty text payload".to_string()));
        }

        info!("Raw Gemini response: {}", text);
        let cleaned = clean_json_output(&text);

        serde_json::from_str::<ScanResult>(&cleaned).map_err(|e| {
            error!("Failed to parse report JSON: {}. Response was: {}", e, cleaned);
            ReportError::Content(format!("report is not valid JSON: {}", e))
        })
    }
}

fn safety_settings() -> Vec<SafetySetting> {
    const CATEGORIES: [&str; 4] = [
        "HARM_CATEGORY_HARASSMENT",
        "HARM_CATEGORY_HATE_SPEECH",
        "HARM_CATEGORY_SEXUALLY_EXPLICIT",
        "HARM_CATEGORY_DANGEROUS_CONTENT",
    ];

    CATEGORIES
        .into_iter()
        .map(|category| SafetySetting {
            category,
            threshold: "BLOCK_NONE",
        })
        .collect()
}

// Mirrors ScanResult field for field; the service is constrained to emit
// JSON in exactly this shape.
fn report_schema() -> Value {
    serde_json::json!({
        "type": "OBJECT",
        "properties": {
            "target": { "type": "STRING" },
            "timestamp": { "type": "STRING" },
            "score": { "type": "NUMBER" },
            "riskLevel": { "type": "STRING", "enum": ["Low", "Medium", "High", "Critical"] },
            "summary": { "type": "STRING" },
            "ssl": {
                "type": "OBJECT",
                "properties": {
                    "valid": { "type": "BOOLEAN" },
                    "issuer": { "type": "STRING" },
                    "expiry": { "type": "STRING" },
                    "algorithm": { "type": "STRING" },
                    "grade": { "type": "STRING" }
                }
            },
            "headers": {
                "type": "OBJECT",
                "properties": {
                    "grade": { "type": "STRING" },
                    "missing": { "type": "ARRAY", "items": { "type": "STRING" } },
                    "present": { "type": "ARRAY", "items": { "type": "STRING" } }
                }
            },
            "techStack": {
                "type": "OBJECT",
                "properties": {
                    "cms": { "type": "STRING", "nullable": true },
                    "server": { "type": "STRING", "nullable": true },
                    "language": { "type": "STRING", "nullable": true },
                    "frameworks": { "type": "ARRAY", "items": { "type": "STRING" } }
                }
            },
            "openPorts": { "type": "ARRAY", "items": { "type": "NUMBER" } },
            "dns": {
                "type": "OBJECT",
                "properties": {
                    "ip": { "type": "STRING" },
                    "registrar": { "type": "STRING" },
                    "location": { "type": "STRING" },
                    "nameservers": { "type": "ARRAY", "items": { "type": "STRING" } }
                }
            },
            "sensitiveFiles": {
                "type": "OBJECT",
                "properties": {
                    "found": { "type": "BOOLEAN" },
                    "files": { "type": "ARRAY", "items": { "type": "STRING" } }
                }
            },
            "vulnerabilities": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "type": { "type": "STRING" },
                        "severity": { "type": "STRING", "enum": ["Low", "Medium", "High", "Critical"] },
                        "description": { "type": "STRING" },
                        "remediation": { "type": "STRING" }
                    }
                }
            }
        }
    })
}

fn clean_json_output(text: &str) -> String {
    let cleaned = text.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    match JSON_OBJECT_REGEX.find(cleaned) {
        Some(m) => m.as_str().to_string(),
        None => cleaned.to_string(),
    }
}

fn fallback_report(target: &str) -> ScanResult {
    ScanResult {
        target: target.to_string(),
        timestamp: Utc::now().to_rfc3339(),
        score: 45,
        risk_level: RiskLevel::High,
        summary: "Connection to AI interrupted. Returning simulated fallback data.".to_string(),
        ssl: SslInfo {
            valid: true,
            issuer: "Simulated CA".to_string(),
            expiry: "2025-12-31".to_string(),
            algorithm: "SHA-256".to_string(),
            grade: "B".to_string(),
        },
        headers: HeaderAudit {
            grade: "C".to_string(),
            missing: vec![
                "Content-Security-Policy".to_string(),
                "X-Frame-Options".to_string(),
            ],
            present: vec!["Server".to_string()],
        },
        tech_stack: TechStack {
            cms: Some("Unknown".to_string()),
            server: Some("Nginx".to_string()),
            language: Some("PHP".to_string()),
            frameworks: vec![],
        },
        open_ports: vec![80, 443],
        dns: DnsInfo {
            ip: "192.168.1.1".to_string(),
            registrar: "Unknown".to_string(),
            location: "Unknown".to_string(),
            nameservers: vec![],
        },
        sensitive_files: SensitiveFiles {
            found: false,
            files: vec![],
        },
        vulnerabilities: vec![Vulnerability {
            vuln_type: "Scan Error".to_string(),
            severity: Severity::Low,
            description: "AI Analysis timed out or was blocked.".to_string(),
            remediation: "Try a different URL or check API quota.".to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_json(target: &str) -> String {
        serde_json::json!({
            "target": target,
            "timestamp": "2025-01-01T00:00:00Z",
            "score": 82,
            "riskLevel": "Low",
            "summary": "No significant issues inferred.",
            "ssl": {
                "valid": true,
                "issuer": "Let's Encrypt",
                "expiry": "2026-03-01",
                "algorithm": "SHA-256",
                "grade": "A"
            },
            "headers": {
                "grade": "B",
                "missing": ["Content-Security-Policy"],
                "present": ["Strict-Transport-Security", "X-Frame-Options"]
            },
            "techStack": {
                "cms": null,
                "server": "Nginx",
                "language": "Rust",
                "frameworks": ["actix-web"]
            },
            "openPorts": [80, 443],
            "dns": {
                "ip": "93.184.216.34",
                "registrar": "Unknown",
                "location": "Unknown",
                "nameservers": ["a.iana-servers.net"]
            },
            "sensitiveFiles": { "found": false, "files": [] },
            "vulnerabilities": [{
                "type": "Missing CSP",
                "severity": "Medium",
                "description": "Content-Security-Policy header appears absent.",
                "remediation": "Add a restrictive Content-Security-Policy."
            }]
        })
        .to_string()
    }

    fn gemini_body(text: &str) -> String {
        serde_json::json!({
            "candidates": [{
                "content": { "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
        .to_string()
    }

    #[test]
    fn clean_json_output_strips_markdown_fences() {
        let fenced = "```json\n{\"a\": 1}\n```";
        assert_eq!(clean_json_output(fenced), "{\"a\": 1}");
    }

    #[test]
    fn clean_json_output_isolates_outermost_object() {
        let noisy = "Here is your report:\n{\"a\": {\"b\": 2}}\nLet me know!";
        assert_eq!(clean_json_output(noisy), "{\"a\": {\"b\": 2}}");
    }

    #[test]
    fn fallback_report_invariants() {
        let report = fallback_report("https://example.com");
        assert_eq!(report.target, "https://example.com");
        assert_eq!(report.score, 45);
        assert_eq!(report.risk_level, RiskLevel::High);
        assert_eq!(report.open_ports, vec![80, 443]);
        assert_eq!(report.vulnerabilities.len(), 1);
        assert_eq!(report.vulnerabilities[0].severity, Severity::Low);
    }

    #[tokio::test]
    async fn missing_credential_skips_network_and_falls_back() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .expect(0)
            .create_async()
            .await;

        let client =
            GeminiClient::new(None, "gemini-2.0-flash".to_string()).with_base_url(server.url());

        let report = client.generate_report("https://example.com").await;
        assert_eq!(report.score, 45);
        assert_eq!(report.risk_level, RiskLevel::High);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn parses_fenced_json_response() {
        let mut server = mockito::Server::new_async().await;
        let fenced = format!("```json\n{}\n```", report_json("https://example.com"));
        let mock = server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .match_body(mockito::Matcher::Regex(
                "Analyze target URL: https://example.com".to_string(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(gemini_body(&fenced))
            .create_async()
            .await;

        let client = GeminiClient::new(Some("test-key".to_string()), "gemini-2.0-flash".to_string())
            .with_base_url(server.url());

        let report = client.generate_report("https://example.com").await;
        mock.assert_async().await;

        assert_eq!(report.target, "https://example.com");
        assert_eq!(report.score, 82);
        assert_eq!(report.risk_level, RiskLevel::Low);
        assert_eq!(report.tech_stack.server.as_deref(), Some("Nginx"));
        assert_eq!(report.vulnerabilities[0].vuln_type, "Missing CSP");
    }

    #[tokio::test]
    async fn server_error_falls_back() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .with_status(500)
            .with_body("internal error")
            .create_async()
            .await;

        let client = GeminiClient::new(Some("test-key".to_string()), "gemini-2.0-flash".to_string())
            .with_base_url(server.url());

        let report = client.generate_report("https://broken.example").await;
        assert_eq!(report.target, "https://broken.example");
        assert_eq!(report.score, 45);
        assert_eq!(report.risk_level, RiskLevel::High);
    }

    #[tokio::test]
    async fn empty_candidates_fall_back() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("{\"candidates\": []}")
            .create_async()
            .await;

        let client = GeminiClient::new(Some("test-key".to_string()), "gemini-2.0-flash".to_string())
            .with_base_url(server.url());

        let report = client.generate_report("https://example.com").await;
        assert_eq!(report.score, 45);
        assert_eq!(report.vulnerabilities.len(), 1);
    }

    #[tokio::test]
    async fn unparseable_text_falls_back() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/models/gemini-2.0-flash:generateContent")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(gemini_body("I cannot produce a report right now."))
            .create_async()
            .await;

        let client = GeminiClient::new(Some("test-key".to_string()), "gemini-2.0-flash".to_string())
            .with_base_url(server.url());

        let report = client.generate_report("https://example.com").await;
        assert_eq!(report.score, 45);
        assert_eq!(report.risk_level, RiskLevel::High);
    }
}
