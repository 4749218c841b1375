use rand::rngs::OsRng;
use rand::Rng;
use std::time::Duration;
use tokio::time::sleep;

/// Human-like pauses between browser actions.
#[derive(Debug, Clone, Default)]
pub struct BehavioralEngine {}

impl BehavioralEngine {
    pub fn new() -> Self {
        Self {}
    }

    /// Sleep for a random duration in `[min, max]` milliseconds.
    pub async fn random_delay(&self, min: u64, max: u64) {
        sleep(Duration::from_millis(pick_delay(min, max))).await;
    }
}

/// A uniform pick in `[min, max]`; `min` when the window is empty.
pub fn pick_delay(min: u64, max: u64) -> u64 {
    if max <= min {
        return min;
    }
    OsRng.gen_range(min..=max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delay_stays_in_window() {
        for _ in 0..100 {
            let ms = pick_delay(10, 20);
            assert!((10..=20).contains(&ms));
        }
        assert_eq!(pick_delay(30, 5), 30);
    }
}
