//! Per-battle random source. Uses SplitMix64 for throughput and good statistical quality.
//! Deterministic: same seed produces the same sequence. Not cryptographically secure.

use crate::error::DuelError;

const SPLITMIX64_GOLDEN: u64 = 0x9e3779b97f4a7c15;
const SPLITMIX64_M1: u64 = 0xbf58476d1ce4e5b9;
const SPLITMIX64_M2: u64 = 0x94d049bb133111eb;

/// 2^-53, maps the top 53 bits of a draw onto `[0, 1)`.
const UNIT_SCALE: f64 = 1.0 / (1u64 << 53) as f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rng {
    state: u64,
}

impl Rng {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    #[inline]
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(SPLITMIX64_GOLDEN);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(SPLITMIX64_M1);
        z = (z ^ (z >> 27)).wrapping_mul(SPLITMIX64_M2);
        z ^ (z >> 31)
    }

    /// Uniform draw in `[0, 1)`.
    #[inline]
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 * UNIT_SCALE
    }
}

/// The random stream a battle draws every roll and tie-break from.
///
/// The driver binds its [`Rng`] for the duration of one battle and releases it
/// afterwards, so consecutive battles continue the same sequence.
#[derive(Debug, Clone, Default)]
pub struct RandomStream {
    rng: Option<Rng>,
}

impl RandomStream {
    pub fn unbound() -> Self {
        Self { rng: None }
    }

    pub fn bound(rng: Rng) -> Self {
        Self { rng: Some(rng) }
    }

    pub fn bind(&mut self, rng: Rng) {
        self.rng = Some(rng);
    }

    /// Detaches the generator, returning its advanced state.
    pub fn release(&mut self) -> Option<Rng> {
        self.rng.take()
    }

    pub fn is_bound(&self) -> bool {
        self.rng.is_some()
    }

    pub fn next_f64(&mut self) -> Result<f64, DuelError> {
        self.rng
            .as_mut()
            .map(Rng::next_f64)
            .ok_or(DuelError::UnboundRandomStream)
    }

    /// Returns true with probability `p`. Consumes exactly one draw.
    pub fn chance(&mut self, p: f64) -> Result<bool, DuelError> {
        if !(0.0..=1.0).contains(&p) {
            return Err(DuelError::ProbabilityOutOfRange(p));
        }
        Ok(self.next_f64()? < p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splitmix64_deterministic() {
        let mut a = Rng::new(7);
        let mut b = Rng::new(7);
        for _ in 0..100 {
            assert_eq!(a.next_u64(), b.next_u64());
        }
    }

    #[test]
    fn splitmix64_different_seeds_differ() {
        let mut a = Rng::new(1);
        let mut b = Rng::new(2);
        assert_ne!(a.next_u64(), b.next_u64());
    }

    #[test]
    fn next_f64_stays_in_unit_interval() {
        let mut rng = Rng::new(42);
        for _ in 0..10_000 {
            let x = rng.next_f64();
            assert!((0.0..1.0).contains(&x), "draw out of range: {x}");
        }
    }

    #[test]
    fn unbound_stream_fails_fast() {
        let mut stream = RandomStream::unbound();
        assert!(matches!(
            stream.chance(0.5),
            Err(DuelError::UnboundRandomStream)
        ));
    }

    #[test]
    fn chance_rejects_out_of_range_probabilities() {
        let mut stream = RandomStream::bound(Rng::new(1));
        for p in [-0.1, 1.01, f64::NAN] {
            assert!(matches!(
                stream.chance(p),
                Err(DuelError::ProbabilityOutOfRange(_))
            ));
        }
    }

    #[test]
    fn chance_bounds_are_certain() {
        let mut stream = RandomStream::bound(Rng::new(3));
        for _ in 0..1000 {
            assert!(!stream.chance(0.0).unwrap());
            assert!(stream.chance(1.0).unwrap());
        }
    }

    #[test]
    fn release_returns_advanced_state() {
        let mut stream = RandomStream::bound(Rng::new(9));
        stream.next_f64().unwrap();
        let released = stream.release().unwrap();
        assert!(!stream.is_bound());

        let mut fresh = Rng::new(9);
        fresh.next_u64();
        assert_eq!(released, fresh);
    }
}
