//! Deterministic synthetic series shared by the unit tests.

/// xorshift64 stream of uniforms in `(0, 1]`.
struct XorShift(u64);

impl XorShift {
    fn new(seed: u64) -> Self {
        Self(seed.max(1))
    }

    fn next_uniform(&mut self) -> f64 {
        let mut s = self.0;
        s ^= s << 13;
        s ^= s >> 7;
        s ^= s << 17;
        self.0 = s;
        ((s >> 11) as f64 + 1.0) / (1u64 << 53) as f64
    }
}

/// Standard normal draws (Box–Muller).
pub(crate) fn gaussian_noise(len: usize, seed: u64) -> Vec<f64> {
    let mut rng = XorShift::new(seed);
    (0..len)
        .map(|_| {
            let u1 = rng.next_uniform();
            let u2 = rng.next_uniform();
            (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos()
        })
        .collect()
}

/// Gaussian random walk starting at 100.
pub(crate) fn random_walk(len: usize, seed: u64) -> Vec<f64> {
    let mut level = 100.0;
    gaussian_noise(len, seed)
        .into_iter()
        .map(|e| {
            level += e;
            level
        })
        .collect()
}

/// Discrete Ornstein–Uhlenbeck process around 100 with reversion speed
/// `theta`.
pub(crate) fn ornstein_uhlenbeck(len: usize, theta: f64, seed: u64) -> Vec<f64> {
    let mut level = 100.0;
    gaussian_noise(len, seed)
        .into_iter()
        .map(|e| {
            level += theta * (100.0 - level) + e;
            level
        })
        .collect()
}
