//! Random number generation.
//!
//! This crate is a set of thin abstractions around the
//! [`rand`](https://docs.rs/rand/) and
//! [`rand_distr`](https://docs.rs/rand_distr/) crates.
//!
//! All variate functions draw from a seeded [`Rng`], so a fixed
//! seed reproduces the same stream of events.

use rand::Rng as _;
use rand::SeedableRng;
use rand_distr::Distribution;

/// A random number generator.
///
/// This is a newtype wrapper around [`rand::rngs::StdRng`],
/// seeded deterministically from a `u64`.
#[repr(transparent)]
pub struct Rng(rand::rngs::StdRng);

impl Rng {
    /// Create a new [`Rng`] with a seed.
    pub fn new(seed: u64) -> Self {
        Self(rand::rngs::StdRng::seed_from_u64(seed))
    }
}

/// Provide access to the underlying rng type
/// wrapped by [`Rng`].
pub trait UnderlyingRngAccess {
    type UnderlyingRng;
    /// Get a reference to the underlying rng
    fn as_underlying_ref(&self) -> &Self::UnderlyingRng;
    /// Get a mutable reference to the underlying rng
    fn as_underlying_mut_ref(&mut self) -> &mut Self::UnderlyingRng;
}

impl UnderlyingRngAccess for Rng {
    type UnderlyingRng = rand::rngs::StdRng;
    fn as_underlying_ref(&self) -> &Self::UnderlyingRng {
        &self.0
    }
    fn as_underlying_mut_ref(&mut self) -> &mut Self::UnderlyingRng {
        &mut self.0
    }
}

/// Return a uniform deviate in `[0, 1)`.
///
/// # Example
///
/// ```
/// let mut rng = bdphylo_rng::Rng::new(42);
/// let u = bdphylo_rng::uniform(&mut rng);
/// assert!((0.0..1.0).contains(&u));
/// ```
#[inline]
pub fn uniform(rng: &mut Rng) -> f64 {
    rng.0.gen::<f64>()
}

/// Return a uniform deviate in the open interval `(0, 1)`.
#[inline]
pub fn uniform_pos(rng: &mut Rng) -> f64 {
    loop {
        let r = uniform(rng);
        if r * (1.0 - r) != 0.0 {
            return r;
        }
    }
}

/// Return an exponential deviate with the given `rate`.
///
/// # Example
///
/// ```
/// let mut rng = bdphylo_rng::Rng::new(42);
/// let dt = bdphylo_rng::exponential(&mut rng, 2.0);
/// assert!(dt >= 0.0);
/// ```
#[inline]
pub fn exponential(rng: &mut Rng, rate: f64) -> f64 {
    let x: f64 = rand_distr::Exp1.sample(&mut rng.0);
    x / rate
}

/// Return `true` with probability `prob`.
///
/// `prob == 0` never draws from the stream.
#[inline]
pub fn bernoulli(rng: &mut Rng, prob: f64) -> bool {
    if prob == 0.0 {
        false
    } else {
        uniform(rng) <= prob
    }
}

/// Return a uniform integer on the inclusive range `[0, n]`.
///
/// Computed as `⌊u·(n+1)⌋`; [`uniform`] returns `u < 1`, so the
/// result never exceeds `n`.
#[inline]
pub fn uniform_index(rng: &mut Rng, n: usize) -> usize {
    if n == 0 {
        0
    } else {
        (uniform(rng) * (n as f64 + 1.0)) as usize
    }
}

/// Return an Erlang deviate: the sum of `shape` exponential
/// deviates with the given `rate`.
#[inline]
pub fn erlang(rng: &mut Rng, rate: f64, shape: u32) -> f64 {
    let mut res = 0.0;
    for _ in 0..shape {
        res += exponential(rng, rate);
    }
    res
}

/// Return a Poisson deviate from a distribution
/// with a given `mean`.
///
/// # Example
///
/// ```
/// let mut rng = bdphylo_rng::Rng::new(42);
/// let _ = bdphylo_rng::poisson(&mut rng, 5e-3);
/// ```
#[inline]
pub fn poisson(rng: &mut Rng, mean: f64) -> u64 {
    let dist = rand_distr::Poisson::new(mean).unwrap();
    dist.sample(&mut rng.0) as u64
}
