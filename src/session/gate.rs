use rand::{Rng, SeedableRng, rngs::SmallRng};

/// Decides, per scanned student, whether a liveness check is required.
pub trait VerificationGate {
    fn requires_verification(&mut self) -> bool;
}

/// Requires verification with a fixed probability drawn from an injected RNG.
pub struct RandomGate<R = SmallRng> {
    probability: f64,
    rng: R,
}

impl RandomGate<SmallRng> {
    pub fn from_entropy(probability: f64) -> Self {
        Self::with_rng(probability, SmallRng::from_entropy())
    }

    pub fn seeded(probability: f64, seed: u64) -> Self {
        Self::with_rng(probability, SmallRng::seed_from_u64(seed))
    }
}

impl<R: Rng> RandomGate<R> {
    /// `probability` is clamped into `[0, 1]`; NaN counts as 0.
    pub fn with_rng(probability: f64, rng: R) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        Self { probability, rng }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl<R: Rng> VerificationGate for RandomGate<R> {
    fn requires_verification(&mut self) -> bool {
        self.rng.gen_bool(self.probability)
    }
}
