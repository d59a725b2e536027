//! Humanized pacing delays
//!
//! Delays injected after each page action to emulate human browsing rhythm.
//! The magnitude grows with the number of records already stored: a session
//! that has collected a lot slows down. This is an anti-detection heuristic,
//! not correctness-critical; the control loop works with zero delays.

use crate::config::PacingConfig;
use rand::Rng;
use std::time::Duration;

/// Scale factor applied to the base delay as the stored record count grows
///
/// The factors compound: 1.2 above 50 records, a further 1.5 above 100,
/// a further 1.8 above 150.
pub fn record_count_scale(stored_records: u64) -> f64 {
    let mut scale = 1.0;
    if stored_records > 50 {
        scale *= 1.2;
    }
    if stored_records > 100 {
        scale *= 1.5;
    }
    if stored_records > 150 {
        scale *= 1.8;
    }
    scale
}

/// Computes one randomized pacing delay
///
/// The base delay is drawn uniformly from the configured range, scaled by
/// [`record_count_scale`], jittered by ±20%, and occasionally stretched by a
/// long pause.
///
/// # Arguments
///
/// * `config` - Pacing bounds and long-pause probability
/// * `stored_records` - Current stored record count
pub fn humanized_delay(config: &PacingConfig, stored_records: u64) -> Duration {
    let mut rng = rand::thread_rng();

    let base = rng.gen_range(config.base_delay_min_ms..=config.base_delay_max_ms) as f64;
    let scaled = base * record_count_scale(stored_records);
    let jittered = scaled * rng.gen_range(0.8..=1.2);

    let mut total_ms = jittered as u64;
    if rng.gen::<f64>() < config.long_pause_chance {
        total_ms += rng.gen_range(config.long_pause_min_ms..=config.long_pause_max_ms);
    }

    Duration::from_millis(total_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale_steps() {
        assert_eq!(record_count_scale(0), 1.0);
        assert_eq!(record_count_scale(50), 1.0);
        assert_eq!(record_count_scale(51), 1.2);
        assert_eq!(record_count_scale(101), 1.2 * 1.5);
        assert_eq!(record_count_scale(151), 1.2 * 1.5 * 1.8);
    }

    #[test]
    fn test_delay_within_bounds() {
        let config = PacingConfig {
            base_delay_min_ms: 100,
            base_delay_max_ms: 200,
            long_pause_chance: 0.0,
            long_pause_min_ms: 0,
            long_pause_max_ms: 0,
        };

        for _ in 0..100 {
            let delay = humanized_delay(&config, 0);
            // base in [100, 200], jitter in [0.8, 1.2]
            assert!(delay >= Duration::from_millis(80));
            assert!(delay <= Duration::from_millis(240));
        }
    }

    #[test]
    fn test_delay_scales_with_records() {
        let config = PacingConfig {
            base_delay_min_ms: 1_000,
            base_delay_max_ms: 1_000,
            long_pause_chance: 0.0,
            long_pause_min_ms: 0,
            long_pause_max_ms: 0,
        };

        for _ in 0..100 {
            let delay = humanized_delay(&config, 200);
            // 1000ms * 3.24 scale * [0.8, 1.2] jitter
            assert!(delay >= Duration::from_millis(2_592));
            assert!(delay <= Duration::from_millis(3_888));
        }
    }

    #[test]
    fn test_certain_long_pause_applied() {
        let config = PacingConfig {
            base_delay_min_ms: 0,
            base_delay_max_ms: 0,
            long_pause_chance: 1.0,
            long_pause_min_ms: 500,
            long_pause_max_ms: 500,
        };

        let delay = humanized_delay(&config, 0);
        assert_eq!(delay, Duration::from_millis(500));
    }
}
