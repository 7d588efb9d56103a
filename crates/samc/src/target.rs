//! The interface a model exposes to the sampler.

use rand::Rng;

/// A Markov chain state space the sampler can walk.
///
/// The sampler drives the chain with `propose` and undoes unwanted moves
/// with `reject`; proposals are assumed symmetric. `energy` is the negative
/// log target density up to a constant.
pub trait SamcTarget {
    /// Move to a proposed neighbouring state, remembering how to undo it.
    fn propose<R: Rng + ?Sized>(&mut self, rng: &mut R);

    /// Undo the most recent `propose`.
    fn reject(&mut self);

    /// Energy of the current state.
    fn energy(&self) -> f64;

    /// Functionals of the current state tracked in the trace.
    fn statistics(&self) -> Vec<f64>;

    /// Known energy range; `None` makes the sampler run a pilot chain.
    fn energy_bounds(&self) -> Option<(f64, f64)> {
        None
    }
}
