use anyhow::{Result, anyhow};

pub fn normalize_target(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("Target URL is empty"));
    }

    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("https://{}", trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepends_https_when_scheme_missing() {
        assert_eq!(normalize_target("example.com").unwrap(), "https://example.com");
    }

    #[test]
    fn keeps_existing_scheme() {
        assert_eq!(
            normalize_target("http://example.com").unwrap(),
            "http://example.com"
        );
        assert_eq!(
            normalize_target("https://example.com/path").unwrap(),
            "https://example.com/path"
        );
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert_eq!(
            normalize_target("  example.com  ").unwrap(),
            "https://example.com"
        );
    }

    #[test]
    fn rejects_empty_input() {
        assert!(normalize_target("").is_err());
        assert!(normalize_target("   ").is_err());
    }
}
