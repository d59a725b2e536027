//! Scripted page driver
//!
//! A deterministic, in-memory [`PageDriver`] that serves a pre-built sequence
//! of synthetic results pages. It backs the integration tests and the
//! binary's offline run mode; real deployments supply their own driver.
//!
//! Failure injection (login failures, dead next buttons, defensive signals)
//! is configurable so the controller's retry and termination paths can be
//! exercised without any real automation.

use crate::driver::{DriverError, PageDriver, RawCandidate};
use async_trait::async_trait;
use sha2::{Digest, Sha256};

/// One synthetic results page
#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    /// Candidates visible on this page
    pub candidates: Vec<RawCandidate>,

    /// Whether this page presents an anti-automation signal
    pub defensive_signal: bool,

    /// Optional fingerprint override; defaults to a hash of the page index
    /// and its candidate URLs
    pub fingerprint: Option<String>,
}

impl ScriptedPage {
    /// Page with the given candidates and no special behavior
    pub fn with_candidates(candidates: Vec<RawCandidate>) -> Self {
        Self {
            candidates,
            ..Default::default()
        }
    }

    /// Page that triggers the defensive short-circuit
    pub fn defensive() -> Self {
        Self {
            defensive_signal: true,
            ..Default::default()
        }
    }
}

/// Deterministic in-memory page driver
pub struct ScriptedDriver {
    pages: Vec<ScriptedPage>,
    index: usize,
    query: String,
    login_failures: u32,
    pagination_failures: u32,
    logged_in: bool,
    closed: bool,
}

impl ScriptedDriver {
    /// Creates a driver serving the given page sequence
    pub fn new(pages: Vec<ScriptedPage>) -> Self {
        Self {
            pages,
            index: 0,
            query: String::new(),
            login_failures: 0,
            pagination_failures: 0,
            logged_in: false,
            closed: false,
        }
    }

    /// Generates a synthetic results corpus for a search
    ///
    /// Candidate URLs are derived from the query and page position, so two
    /// drivers built from the same arguments serve identical content.
    pub fn synthetic(keyword: &str, location: &str, pages: usize, per_page: usize) -> Self {
        let slug_base = format!("{} {}", keyword, location)
            .to_lowercase()
            .replace(|c: char| !c.is_alphanumeric(), "-");

        let pages = (0..pages)
            .map(|p| {
                let candidates = (0..per_page)
                    .map(|i| {
                        let slug = format!("{}-p{}-c{}", slug_base, p, i);
                        RawCandidate {
                            url: format!("https://results.example/profiles/{}", slug),
                            display_name: format!("{} Candidate {}", keyword, p * per_page + i),
                            title: Some(keyword.to_string()),
                            company: None,
                            location: Some(location.to_string()),
                            connection_degree: Some("2nd".to_string()),
                        }
                    })
                    .collect();
                ScriptedPage::with_candidates(candidates)
            })
            .collect();

        Self::new(pages)
    }

    /// Makes the first `n` login attempts fail
    pub fn with_login_failures(mut self, n: u32) -> Self {
        self.login_failures = n;
        self
    }

    /// Makes the next `n` pagination attempts fail
    pub fn with_pagination_failures(mut self, n: u32) -> Self {
        self.pagination_failures = n;
        self
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    fn current_page(&self) -> Option<&ScriptedPage> {
        self.pages.get(self.index)
    }
}

#[async_trait]
impl PageDriver for ScriptedDriver {
    async fn login(&mut self) -> Result<(), DriverError> {
        if self.login_failures > 0 {
            self.login_failures -= 1;
            return Err(DriverError::Login("scripted login failure".to_string()));
        }
        self.logged_in = true;
        Ok(())
    }

    async fn navigate_to_search(&mut self, query: &str) -> Result<(), DriverError> {
        if !self.logged_in {
            return Err(DriverError::Navigation("not logged in".to_string()));
        }
        self.query = query.to_string();
        self.index = 0;
        Ok(())
    }

    fn current_location(&self) -> String {
        format!("scripted://{}/page/{}", self.query, self.index)
    }

    async fn page_fingerprint(&mut self) -> Result<String, DriverError> {
        if let Some(fp) = self.current_page().and_then(|p| p.fingerprint.clone()) {
            return Ok(fp);
        }

        let mut hasher = Sha256::new();
        hasher.update(self.index.to_le_bytes());
        for candidate in self.current_page().map(|p| p.candidates.as_slice()).unwrap_or(&[]) {
            hasher.update(candidate.url.as_bytes());
        }
        Ok(hex::encode(hasher.finalize()))
    }

    async fn defensive_signal_detected(&mut self) -> Result<bool, DriverError> {
        Ok(self.current_page().map(|p| p.defensive_signal).unwrap_or(false))
    }

    async fn has_next_page(&mut self) -> Result<bool, DriverError> {
        Ok(self.index + 1 < self.pages.len())
    }

    async fn click_next(&mut self) -> Result<(), DriverError> {
        if self.pagination_failures > 0 {
            self.pagination_failures -= 1;
            return Err(DriverError::Pagination(
                "scripted next-button failure".to_string(),
            ));
        }
        if self.index + 1 >= self.pages.len() {
            return Err(DriverError::Pagination("no next page".to_string()));
        }
        self.index += 1;
        Ok(())
    }

    async fn extract_candidates(&mut self) -> Result<Vec<RawCandidate>, DriverError> {
        Ok(self.current_page().map(|p| p.candidates.clone()).unwrap_or_default())
    }

    async fn close(&mut self) {
        self.closed = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_page_driver() -> ScriptedDriver {
        ScriptedDriver::new(vec![
            ScriptedPage::with_candidates(vec![RawCandidate::new(
                "https://results.example/profiles/a",
                "A",
            )]),
            ScriptedPage::with_candidates(vec![RawCandidate::new(
                "https://results.example/profiles/b",
                "B",
            )]),
        ])
    }

    #[tokio::test]
    async fn test_login_then_navigate() {
        let mut driver = two_page_driver();
        driver.login().await.unwrap();
        driver.navigate_to_search("q").await.unwrap();
        assert_eq!(driver.current_location(), "scripted://q/page/0");
    }

    #[tokio::test]
    async fn test_navigate_before_login_fails() {
        let mut driver = two_page_driver();
        assert!(driver.navigate_to_search("q").await.is_err());
    }

    #[tokio::test]
    async fn test_login_failure_injection() {
        let mut driver = two_page_driver().with_login_failures(2);
        assert!(driver.login().await.is_err());
        assert!(driver.login().await.is_err());
        assert!(driver.login().await.is_ok());
    }

    #[tokio::test]
    async fn test_pagination_advances_fingerprint() {
        let mut driver = two_page_driver();
        driver.login().await.unwrap();
        driver.navigate_to_search("q").await.unwrap();

        let fp0 = driver.page_fingerprint().await.unwrap();
        assert!(driver.has_next_page().await.unwrap());
        driver.click_next().await.unwrap();
        let fp1 = driver.page_fingerprint().await.unwrap();

        assert_ne!(fp0, fp1);
        assert!(!driver.has_next_page().await.unwrap());
        assert!(driver.click_next().await.is_err());
    }

    #[tokio::test]
    async fn test_synthetic_corpus_is_deterministic() {
        let mut a = ScriptedDriver::synthetic("Engineer", "Oslo", 2, 3);
        let mut b = ScriptedDriver::synthetic("Engineer", "Oslo", 2, 3);
        for driver in [&mut a, &mut b] {
            driver.login().await.unwrap();
            driver.navigate_to_search("q").await.unwrap();
        }

        let ca = a.extract_candidates().await.unwrap();
        let cb = b.extract_candidates().await.unwrap();
        assert_eq!(ca.len(), 3);
        assert_eq!(ca[0].url, cb[0].url);
    }

    #[tokio::test]
    async fn test_defensive_page() {
        let mut driver = ScriptedDriver::new(vec![ScriptedPage::defensive()]);
        driver.login().await.unwrap();
        driver.navigate_to_search("q").await.unwrap();
        assert!(driver.defensive_signal_detected().await.unwrap());
    }
}
