//! Frequency strategies.

use crate::traits::FrequencyStrategy;

/// Dispatch the measured throughput unchanged.
pub struct IdentityStrategy;

impl FrequencyStrategy for IdentityStrategy {
    fn compute_frequency(&self, throughput: u64) -> u64 {
        throughput
    }
}

/// Dispatch a fraction of the measured throughput, leaving headroom so
/// agents run below the saturation point the probe found.
pub struct HeadroomStrategy {
    /// Fraction of throughput to use, clamped to (0, 1].
    pub headroom: f64,
}

impl FrequencyStrategy for HeadroomStrategy {
    fn compute_frequency(&self, throughput: u64) -> u64 {
        let headroom = self.headroom.clamp(f64::MIN_POSITIVE, 1.0);
        ((throughput as f64) * headroom).floor() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_passes_through() {
        assert_eq!(IdentityStrategy.compute_frequency(123), 123);
    }

    #[test]
    fn headroom_scales_down() {
        let strategy = HeadroomStrategy { headroom: 0.8 };
        assert_eq!(strategy.compute_frequency(100), 80);
        assert_eq!(strategy.compute_frequency(0), 0);
    }

    #[test]
    fn headroom_is_clamped() {
        let strategy = HeadroomStrategy { headroom: 2.5 };
        assert_eq!(strategy.compute_frequency(100), 100);
    }
}
