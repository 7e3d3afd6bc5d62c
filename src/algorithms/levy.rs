use std::f64::consts::PI;

use rand::{Rng, RngCore};
use rand_distr::StandardNormal;
use statrs::function::gamma::gamma;

use crate::core::Schedule;

/// The Lévy exponent shared by all the flight-based optimisers.
const BETA: f64 = 1.5;

/// Probe a continuous position against a chromosome: the position is materialised into a
/// throwaway chromosome and adopted (mutating `chromosome` in place) only when it dominates the
/// current assignment. The returned buffer holds the coordinates the chromosome ends up with.
///
/// # Arguments
///
/// * `local`: The candidate continuous position.
/// * `chromosome`: The chromosome to challenge.
/// * `chrom_len`: The number of continuous dimensions.
/// * `rng`: The random number generator.
///
/// returns: `Vec<f64>`
pub(crate) fn optimum(
    local: &[f64],
    chromosome: &mut Schedule,
    chrom_len: usize,
    rng: &mut dyn RngCore,
) -> Vec<f64> {
    let mut probe = chromosome.empty_from_prototype(None);
    let mut candidate = local.to_vec();
    probe.update_positions(&mut candidate, rng);

    if probe.dominates(chromosome) {
        let mut adopted = local.to_vec();
        chromosome.update_positions(&mut adopted, rng);
        return adopted;
    }

    let mut positions = vec![0.0; chrom_len];
    chromosome.extract_positions(&mut positions);
    positions
}

/// Lévy-flight step generator. Steps follow the Mantegna recipe `S = u / |v|^(1/beta)` with
/// `u ~ N(0, sigma_u)`, `v ~ N(0, 1)` and the usual gamma-function expression for `sigma_u`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LevyFlights {
    chrom_len: usize,
    sigma_u: f64,
}

impl LevyFlights {
    pub(crate) fn new(chrom_len: usize) -> Self {
        let numerator = gamma(1.0 + BETA) * (PI * BETA / 2.0).sin();
        let denominator = gamma((1.0 + BETA) / 2.0) * BETA * 2f64.powf((BETA - 1.0) / 2.0);
        Self {
            chrom_len,
            sigma_u: (numerator / denominator).powf(1.0 / BETA),
        }
    }

    pub(crate) fn chrom_len(&self) -> usize {
        self.chrom_len
    }

    fn step(&self, rng: &mut dyn RngCore) -> f64 {
        let u: f64 = rng.sample::<f64, _>(StandardNormal) * self.sigma_u;
        let v: f64 = rng.sample::<f64, _>(StandardNormal);
        u / v.abs().powf(1.0 / BETA)
    }

    /// One Lévy step per continuous dimension.
    pub(crate) fn steps(&self, rng: &mut dyn RngCore) -> Vec<f64> {
        (0..self.chrom_len).map(|_| self.step(rng)).collect()
    }

    /// One Lévy step per population member.
    pub(crate) fn step_scalars(&self, count: usize, rng: &mut dyn RngCore) -> Vec<f64> {
        (0..count).map(|_| self.step(rng)).collect()
    }

    /// See [`optimum`].
    pub(crate) fn optimum(
        &self,
        local: &[f64],
        chromosome: &mut Schedule,
        rng: &mut dyn RngCore,
    ) -> Vec<f64> {
        optimum(local, chromosome, self.chrom_len, rng)
    }

    /// Drift the whole swarm toward the running global best with member-wise Lévy steps and
    /// return the updated global best position.
    ///
    /// # Arguments
    ///
    /// * `population`: The chromosomes backing the swarm.
    /// * `positions`: The continuous position of every member, updated in place.
    /// * `global_best`: The global best position found so far, if any.
    /// * `rng`: The random number generator.
    ///
    /// returns: `Vec<f64>`
    pub(crate) fn update_velocities(
        &self,
        population: &mut [Schedule],
        positions: &mut [Vec<f64>],
        global_best: Option<Vec<f64>>,
        rng: &mut dyn RngCore,
    ) -> Vec<f64> {
        let snapshot: Vec<Vec<f64>> = positions.to_vec();
        let scalars = self.step_scalars(population.len(), rng);
        let mut global_best = global_best;

        for (member, chromosome) in population.iter_mut().enumerate() {
            let current_best = match global_best.take() {
                None => {
                    let mut seed = vec![0.0; self.chrom_len];
                    chromosome.extract_positions(&mut seed);
                    seed
                }
                Some(best) => self.optimum(&best, chromosome, rng),
            };

            for j in 0..self.chrom_len {
                let nudge: f64 = rng.sample(StandardNormal);
                positions[member][j] +=
                    nudge * 0.01 * scalars[member] * (snapshot[member][j] - current_best[j]);
            }
            positions[member] = self.optimum(&positions[member], chromosome, rng);
            global_best = Some(current_best);
        }
        global_best.unwrap_or_else(|| vec![0.0; self.chrom_len])
    }

    /// Fly a single member toward the global best and return the updated global best position.
    pub(crate) fn update_position(
        &self,
        chromosome: &mut Schedule,
        positions: &mut [Vec<f64>],
        member: usize,
        global_best: Option<Vec<f64>>,
        rng: &mut dyn RngCore,
    ) -> Vec<f64> {
        let current_best = match global_best {
            None => {
                let mut seed = vec![0.0; self.chrom_len];
                chromosome.extract_positions(&mut seed);
                seed
            }
            Some(best) => self.optimum(&best, chromosome, rng),
        };

        let steps = self.steps(rng);
        let snapshot = positions[member].clone();
        for j in 0..self.chrom_len {
            positions[member][j] += steps[j] * 0.01 * (snapshot[j] - current_best[j]);
        }
        positions[member] = self.optimum(&positions[member], chromosome, rng);
        current_best
    }
}
