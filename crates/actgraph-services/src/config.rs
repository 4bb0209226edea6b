//! Service endpoints

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Endpoints and request timeout of the external services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServicesConfig {
    pub srl_url: String,
    pub coref_url: String,
    pub entailment_url: String,
    /// Activity data endpoint; lookups append `request-type=activities`
    pub backend_url: String,
    pub timeout_secs: u64,
}

impl Default for ServicesConfig {
    fn default() -> Self {
        Self {
            srl_url: "http://allen_nlp:5000/predict/srl".into(),
            coref_url: "http://allen_nlp:5000/predict/coref".into(),
            entailment_url: "http://allen_nlp:5000/predict/entailment".into(),
            backend_url: "http://django:8000/model/data?uml-type=activity".into(),
            timeout_secs: 30,
        }
    }
}

impl ServicesConfig {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All endpoints under one base URL, with the default paths
    #[must_use]
    pub fn with_base_url(mut self, base: &str) -> Self {
        let base = base.trim_end_matches('/');
        self.srl_url = format!("{base}/predict/srl");
        self.coref_url = format!("{base}/predict/coref");
        self.entailment_url = format!("{base}/predict/entailment");
        self.backend_url = format!("{base}/model/data?uml-type=activity");
        self
    }

    /// With backend endpoint
    #[inline]
    #[must_use]
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    /// With request timeout
    #[inline]
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `(name, url)` of every endpoint
    #[must_use]
    pub fn endpoints(&self) -> [(&'static str, &str); 4] {
        [
            ("srl_url", &self.srl_url),
            ("coref_url", &self.coref_url),
            ("entailment_url", &self.entailment_url),
            ("backend_url", &self.backend_url),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_sets_every_endpoint() {
        let config = ServicesConfig::new().with_base_url("http://127.0.0.1:9000/");
        assert_eq!(config.srl_url, "http://127.0.0.1:9000/predict/srl");
        assert_eq!(config.backend_url, "http://127.0.0.1:9000/model/data?uml-type=activity");
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }
}
