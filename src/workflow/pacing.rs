//! 节奏控制
//!
//! 模拟检查评分标准和批改题目所花的时间，以及是否需要修正评分标准

use crate::config::{Config, DelayRange};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

/// 每个助教独占一个随机源
#[derive(Debug)]
pub struct Pacer {
    rng: StdRng,
    review_delay: DelayRange,
    mark_delay: DelayRange,
    correction_probability: f64,
}

impl Pacer {
    /// 配置了种子时按 `seed + worker_id` 播种，否则使用系统熵
    pub fn new(config: &Config, worker_id: usize) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(worker_id as u64)),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            review_delay: config.review_delay_ms,
            mark_delay: config.mark_delay_ms,
            correction_probability: config.correction_probability,
        }
    }

    fn pick(&mut self, range: DelayRange) -> Duration {
        Duration::from_millis(self.rng.gen_range(range.min_ms..=range.max_ms))
    }

    /// 检查评分标准的耗时
    pub async fn review_pause(&mut self) {
        let delay = self.pick(self.review_delay);
        pause(delay).await;
    }

    /// 批改一道题的耗时
    pub async fn mark_pause(&mut self) {
        let delay = self.pick(self.mark_delay);
        pause(delay).await;
    }

    /// 本次检查是否需要修正评分标准
    pub fn wants_correction(&mut self) -> bool {
        self.rng.gen_bool(self.correction_probability)
    }
}

async fn pause(delay: Duration) {
    if delay.is_zero() {
        tokio::task::yield_now().await;
    } else {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with(probability: f64) -> Config {
        Config {
            review_delay_ms: DelayRange::new(0, 0),
            mark_delay_ms: DelayRange::new(0, 0),
            correction_probability: probability,
            seed: Some(7),
            ..Config::default()
        }
    }

    #[test]
    fn test_probability_extremes() {
        let mut always = Pacer::new(&config_with(1.0), 0);
        let mut never = Pacer::new(&config_with(0.0), 0);
        for _ in 0..50 {
            assert!(always.wants_correction());
            assert!(!never.wants_correction());
        }
    }

    #[test]
    fn test_seeded_pacers_are_reproducible() {
        let config = config_with(0.5);
        let mut first = Pacer::new(&config, 3);
        let mut second = Pacer::new(&config, 3);
        let a: Vec<bool> = (0..32).map(|_| first.wants_correction()).collect();
        let b: Vec<bool> = (0..32).map(|_| second.wants_correction()).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_delay_stays_in_range() {
        let mut pacer = Pacer::new(&config_with(0.5), 1);
        for _ in 0..100 {
            let delay = pacer.pick(DelayRange::new(500, 1000));
            assert!(delay >= Duration::from_millis(500));
            assert!(delay <= Duration::from_millis(1000));
        }
    }

    #[tokio::test]
    async fn test_zero_pause_returns() {
        let mut pacer = Pacer::new(&config_with(0.5), 0);
        pacer.review_pause().await;
        pacer.mark_pause().await;
    }
}
