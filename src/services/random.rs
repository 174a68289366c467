use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::Mutex;

/// Single source of randomness for metric synthesis and analytics.
pub trait RandomSource: Send + Sync {
    /// Uniform draw in `[0, 1)`.
    fn next_f64(&self) -> f64;
}

/// Uniform draw in `[min, max)`; returns `min` when the range is empty.
pub fn uniform(source: &dyn RandomSource, min: f64, max: f64) -> f64 {
    if max <= min {
        return min;
    }
    let v = min + source.next_f64() * (max - min);
    if v < max {
        return v;
    }
    // a draw just under 1.0 can round up onto `max`
    let below = max - (max - min) * f64::EPSILON;
    if below < max {
        below
    } else {
        min
    }
}

pub struct StdRandom {
    rng: Mutex<StdRng>,
}

impl StdRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for StdRandom {
    fn next_f64(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen::<f64>(),
            // a panic while holding the lock cannot leave StdRng half-updated
            Err(poisoned) => poisoned.into_inner().gen::<f64>(),
        }
    }
}

/// Always returns the same draw. Useful for pinning synthesized numbers.
#[derive(Debug, Clone, Copy)]
pub struct FixedRandom(pub f64);

impl RandomSource for FixedRandom {
    fn next_f64(&self) -> f64 {
        self.0.clamp(0.0, 1.0 - f64::EPSILON)
    }
}
