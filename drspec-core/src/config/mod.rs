//! Process-wide tuning, loaded from `_drspec/config.toml` if present.
//!
//! Field-by-field `Option` + `effective_*` accessor, matching the
//! teacher's `ScanConfig` convention so every default lives in one place
//! next to the field it defaults.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DrspecConfig {
    /// `[0,100]` confidence threshold for VERIFIED vs NEEDS_REVIEW (§4.9). Default 70.
    pub confidence_threshold: Option<f64>,
    /// Queue `max_attempts` before a row becomes permanently unpoppable (§4.4). Default 3.
    pub max_attempts: Option<u32>,
    /// Default `push` priority (§4.4). Default 100.
    pub default_priority: Option<i64>,
    /// Verification Runner timeout, in milliseconds (§4.10). Default 1000.
    pub verification_timeout_ms: Option<u64>,
    /// Extra scanner ignore globs, beyond the defaults of §4.3.
    #[serde(default)]
    pub extra_ignore: Vec<String>,
    /// Scanner include globs — if non-empty, only matching paths are scanned.
    #[serde(default)]
    pub include: Vec<String>,
    /// `PYTHONPATH` to pass through to the verification subprocess.
    pub python_path: Option<String>,
    /// Virtual-environment marker directory for the verification subprocess.
    pub venv_path: Option<String>,
}

impl DrspecConfig {
    pub fn load_from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    pub fn effective_confidence_threshold(&self) -> f64 {
        self.confidence_threshold.unwrap_or(70.0)
    }

    pub fn effective_max_attempts(&self) -> u32 {
        self.max_attempts.unwrap_or(3)
    }

    pub fn effective_default_priority(&self) -> i64 {
        self.default_priority.unwrap_or(100)
    }

    pub fn effective_verification_timeout_ms(&self) -> u64 {
        self.verification_timeout_ms.unwrap_or(1000)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spec() {
        let c = DrspecConfig::default();
        assert_eq!(c.effective_confidence_threshold(), 70.0);
        assert_eq!(c.effective_max_attempts(), 3);
        assert_eq!(c.effective_default_priority(), 100);
        assert_eq!(c.effective_verification_timeout_ms(), 1000);
    }

    #[test]
    fn loads_missing_file_as_default() {
        let c = DrspecConfig::load_from_file(std::path::Path::new("/nonexistent/config.toml"))
            .unwrap();
        assert_eq!(c.effective_max_attempts(), 3);
    }

    #[test]
    fn loads_overrides_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "confidence_threshold = 80\nmax_attempts = 5\n").unwrap();
        let c = DrspecConfig::load_from_file(&path).unwrap();
        assert_eq!(c.effective_confidence_threshold(), 80.0);
        assert_eq!(c.effective_max_attempts(), 5);
    }
}
