//! Named, reproducible random streams.

use rand::{Rng, SeedableRng, rngs::StdRng};
use rand_distr::StandardNormal;

/// Source of random draws for one named stream.
///
/// The model never reaches for a global generator; every draw goes through
/// one of these handles so a run can be replayed from its seeds.
pub trait RandomSource {
    /// Uniform draw in `[0, 1)`.
    fn next_uniform(&mut self) -> f64;

    /// Standard normal draw (mean 0, standard deviation 1).
    fn next_gaussian(&mut self) -> f64;
}

/// `RandomSource` backed by a seeded [`StdRng`].
#[derive(Debug, Clone)]
pub struct SeededStream {
    rng: StdRng,
}

impl SeededStream {
    /// Creates a stream from a 64-bit seed.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for SeededStream {
    fn next_uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    fn next_gaussian(&mut self) -> f64 {
        self.rng.sample::<f64, _>(StandardNormal)
    }
}

/// Label of the operational stream.
pub const MODEL_STREAM: &str = "model";
/// Label of the tariff-evaluation stream.
pub const EVAL_STREAM: &str = "eval";

/// The two independent streams owned by one model instance.
#[derive(Debug, Clone)]
pub struct RandomStreams<R> {
    /// Operational stochasticity: turnover, ancillary load, initial temperature.
    pub model: R,
    /// Tariff-choice stochasticity.
    pub eval: R,
}

impl<R> RandomStreams<R> {
    /// Bundles two existing streams.
    pub fn new(model: R, eval: R) -> Self {
        Self { model, eval }
    }
}

impl RandomStreams<SeededStream> {
    /// Derives both streams for the instance `name` from a master seed.
    ///
    /// The same `(seed, name)` pair always yields the same streams, and the
    /// two streams of one instance never share a seed.
    pub fn for_instance(seed: u64, name: &str) -> Self {
        Self {
            model: SeededStream::new(stream_seed(seed, name, MODEL_STREAM)),
            eval: SeededStream::new(stream_seed(seed, name, EVAL_STREAM)),
        }
    }
}

/// FNV-1a over `name/label`, folded into the master seed.
fn stream_seed(seed: u64, name: &str, label: &str) -> u64 {
    const OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0100_0000_01b3;
    let hash = name
        .bytes()
        .chain(std::iter::once(b'/'))
        .chain(label.bytes())
        .fold(OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(PRIME));
    seed ^ hash
}

/// Replays fixed draws, cycling when exhausted. Test-only.
#[cfg(test)]
#[derive(Debug, Clone)]
pub(crate) struct ScriptedStream {
    uniforms: Vec<f64>,
    gaussians: Vec<f64>,
    next_u: usize,
    next_g: usize,
}

#[cfg(test)]
impl ScriptedStream {
    pub(crate) fn new(uniforms: Vec<f64>, gaussians: Vec<f64>) -> Self {
        Self {
            uniforms,
            gaussians,
            next_u: 0,
            next_g: 0,
        }
    }

    /// Stream whose uniform draws are all `u` and gaussian draws all `g`.
    pub(crate) fn constant(u: f64, g: f64) -> Self {
        Self::new(vec![u], vec![g])
    }

    pub(crate) fn uniform_draws(&self) -> usize {
        self.next_u
    }

    pub(crate) fn gaussian_draws(&self) -> usize {
        self.next_g
    }
}

#[cfg(test)]
impl RandomSource for ScriptedStream {
    fn next_uniform(&mut self) -> f64 {
        let v = self.uniforms[self.next_u % self.uniforms.len()];
        self.next_u += 1;
        v
    }

    fn next_gaussian(&mut self) -> f64 {
        let v = self.gaussians[self.next_g % self.gaussians.len()];
        self.next_g += 1;
        v
    }
}
