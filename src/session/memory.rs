use crate::advisory::Action;
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Per-session crawl memory
///
/// Owned by exactly one session and never shared: each concurrent session
/// starts from a fresh memory. Mutated once per loop iteration via
/// [`CrawlMemory::update`], plus [`CrawlMemory::mark_visited`] calls during
/// extraction.
///
/// The repeat counter is the controller's sole defense against infinite
/// pagination/extraction loops: an unchanging page combined with an
/// unchanging action increments it, and anything else resets it.
#[derive(Debug)]
pub struct CrawlMemory {
    /// Identifiers (page locators and candidate URLs) seen this session
    pub visited: HashSet<String>,

    /// Content fingerprints of pages observed this session
    pub seen_fingerprints: HashSet<String>,

    /// The action dispatched in the previous iteration
    pub last_action: Option<Action>,

    /// Consecutive observations of a repeated (action, fingerprint) pair
    pub action_repeat_count: u32,

    /// When this session started
    pub session_start: Instant,
}

impl CrawlMemory {
    /// Creates a fresh memory with the session clock starting now
    pub fn new() -> Self {
        Self {
            visited: HashSet::new(),
            seen_fingerprints: HashSet::new(),
            last_action: None,
            action_repeat_count: 0,
            session_start: Instant::now(),
        }
    }

    /// Records one loop iteration's observation
    ///
    /// The repeat counter increments only when the action equals the previous
    /// action AND the fingerprint has been seen before; any other combination
    /// resets it to 1.
    ///
    /// # Arguments
    ///
    /// * `locator` - Identifier of the current page
    /// * `action` - The action chosen this iteration
    /// * `fingerprint` - Content fingerprint of the current page
    pub fn update(&mut self, locator: &str, action: Action, fingerprint: &str) {
        self.visited.insert(locator.to_string());

        if self.last_action == Some(action) && self.seen_fingerprints.contains(fingerprint) {
            self.action_repeat_count += 1;
        } else {
            self.action_repeat_count = 1;
        }

        self.last_action = Some(action);
        self.seen_fingerprints.insert(fingerprint.to_string());
    }

    /// Whether this session should terminate
    ///
    /// True once the repeat counter exceeds `stall_threshold`, or the
    /// session has been running longer than `max_runtime`.
    pub fn should_stop(&self, stall_threshold: u32, max_runtime: Duration) -> bool {
        self.action_repeat_count > stall_threshold || self.elapsed() > max_runtime
    }

    /// Whether an identifier has already been seen this session
    pub fn has_visited(&self, identifier: &str) -> bool {
        self.visited.contains(identifier)
    }

    /// Marks an identifier as seen
    ///
    /// Extraction calls this for each accepted candidate before the store
    /// write lands, preventing re-extraction within the same session.
    pub fn mark_visited(&mut self, identifier: &str) {
        self.visited.insert(identifier.to_string());
    }

    /// Time elapsed since session start
    pub fn elapsed(&self) -> Duration {
        self.session_start.elapsed()
    }
}

impl Default for CrawlMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THREE_HOURS: Duration = Duration::from_secs(10_800);

    #[test]
    fn test_new_memory() {
        let memory = CrawlMemory::new();
        assert!(memory.visited.is_empty());
        assert!(memory.seen_fingerprints.is_empty());
        assert_eq!(memory.last_action, None);
        assert_eq!(memory.action_repeat_count, 0);
    }

    #[test]
    fn test_first_update_resets_to_one() {
        let mut memory = CrawlMemory::new();
        memory.update("page-0", Action::Paginate, "fp-a");

        assert_eq!(memory.action_repeat_count, 1);
        assert_eq!(memory.last_action, Some(Action::Paginate));
        assert!(memory.has_visited("page-0"));
        assert!(memory.seen_fingerprints.contains("fp-a"));
    }

    #[test]
    fn test_repeated_observation_increments() {
        let mut memory = CrawlMemory::new();
        memory.update("page-0", Action::Paginate, "fp-a");
        memory.update("page-0", Action::Paginate, "fp-a");
        memory.update("page-0", Action::Paginate, "fp-a");

        assert_eq!(memory.action_repeat_count, 3);
    }

    #[test]
    fn test_new_fingerprint_resets() {
        let mut memory = CrawlMemory::new();
        memory.update("page-0", Action::Paginate, "fp-a");
        memory.update("page-0", Action::Paginate, "fp-a");
        memory.update("page-1", Action::Paginate, "fp-b");

        assert_eq!(memory.action_repeat_count, 1);
    }

    #[test]
    fn test_changed_action_resets() {
        let mut memory = CrawlMemory::new();
        memory.update("page-0", Action::Paginate, "fp-a");
        memory.update("page-0", Action::Paginate, "fp-a");
        memory.update("page-0", Action::Extract, "fp-a");

        assert_eq!(memory.action_repeat_count, 1);
    }

    #[test]
    fn test_stall_fires_on_sixth_repeat() {
        // Threshold 5: should_stop becomes true after exactly 6 repeated
        // (action, fingerprint) observations and not before.
        let mut memory = CrawlMemory::new();

        for i in 1..=6 {
            memory.update("page-0", Action::Extract, "fp-same");
            let stopped = memory.should_stop(5, THREE_HOURS);
            if i < 6 {
                assert!(!stopped, "stopped too early at observation {}", i);
            } else {
                assert!(stopped, "did not stop at observation 6");
            }
        }
    }

    #[test]
    fn test_runtime_ceiling() {
        let mut memory = CrawlMemory::new();
        memory.session_start = Instant::now() - Duration::from_secs(100);

        assert!(!memory.should_stop(5, Duration::from_secs(200)));
        assert!(memory.should_stop(5, Duration::from_secs(50)));
    }

    #[test]
    fn test_mark_visited() {
        let mut memory = CrawlMemory::new();
        assert!(!memory.has_visited("https://results.example/profiles/a"));

        memory.mark_visited("https://results.example/profiles/a");
        assert!(memory.has_visited("https://results.example/profiles/a"));
    }
}
