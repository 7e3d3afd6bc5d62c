use std::f64::consts::PI;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use rand::Rng;

use crate::algorithms::algorithm::{
    mutate_offspring, random_pair_crossing, Algorithm, SearchOptions, SearchState,
};
use crate::algorithms::levy::optimum;
use crate::algorithms::nsga3::NsgaIii;
use crate::core::{Configuration, SError, Schedule};

/// Quantum-behaved particle swarm optimisation with a Gaussian distributed local attractor,
/// layered over the NSGA-III replacement.
///
/// Implemented based on:
/// > Jun Sun, Wei Fang, Vasile Palade, Xiaojun Wu, Wenbo Xu, "Quantum-behaved particle swarm
/// > optimization with Gaussian distributed local attractor point," Applied Mathematics and
/// > Computation, Volume 218, Issue 7, 2011, Pages 3763-3775, doi: 10.1016/j.amc.2011.09.021.
///
/// Every particle is pulled toward an attractor mixing its personal best with the global best;
/// occasionally the attractor is replaced by a Gaussian probe around the population mean best.
/// The contraction-expansion coefficient decays linearly from 0.96 to 0.5 over the run.
pub struct GaQpso {
    base: NsgaIii,
    chrom_len: usize,
    /// Final value of the contraction-expansion coefficient.
    alpha0: f64,
    /// Initial value of the contraction-expansion coefficient.
    alpha1: f64,
    global_best: Vec<f64>,
    personal_best_score: Vec<f64>,
    personal_best_position: Vec<Vec<f64>>,
    current_position: Vec<Vec<f64>>,
}

impl GaQpso {
    /// Initialise the GAQPSO algorithm for a timetable configuration.
    ///
    /// # Arguments
    ///
    /// * `configuration`: The parsed configuration.
    /// * `options`: The search options.
    ///
    /// returns: `Result<GaQpso, SError>`
    pub fn new(configuration: Arc<Configuration>, options: SearchOptions) -> Result<Self, SError> {
        Ok(Self {
            base: NsgaIii::new(configuration, options)?,
            chrom_len: 0,
            alpha0: 0.5,
            alpha1: 0.96,
            global_best: vec![],
            personal_best_score: vec![],
            personal_best_position: vec![],
            current_position: vec![],
        })
    }

    /// The Gaussian probability density used for the local attractor probe. A zero sigma falls
    /// back to the standard density of `x` itself.
    fn gaussian(x: f64, mu: f64, sigma: f64) -> f64 {
        let density = |z: f64| (-z * z / 2.0).exp() / (2.0 * PI).sqrt();
        if sigma == 0.0 {
            density(x)
        } else {
            density((x - mu) / sigma) / sigma
        }
    }

    fn update_positions(&mut self, population: &mut [Schedule]) {
        let size = population.len();
        let chrom_len = self.chrom_len;
        let mut mean_best = vec![0.0; chrom_len];
        let snapshot = self.current_position.clone();

        for (member, chromosome) in population.iter_mut().enumerate() {
            let fitness = chromosome.fitness();
            if fitness > self.personal_best_score[member] {
                self.personal_best_score[member] = fitness;
                chromosome.extract_positions(&mut self.current_position[member]);
                self.personal_best_position[member] = self.current_position[member].clone();
            }
            self.global_best = optimum(
                &self.global_best,
                chromosome,
                chrom_len,
                self.base.state.rng.as_mut(),
            );

            for j in 0..chrom_len {
                mean_best[j] += self.personal_best_position[member][j] / size as f64;
            }
        }

        let max_generations = self.base.options.max_generations as f64;
        let generation = self.base.state.generation as f64;
        let alpha =
            self.alpha0 + (max_generations - generation) * (self.alpha1 - self.alpha0) / max_generations;

        for (member, chromosome) in population.iter_mut().enumerate() {
            for j in 0..chrom_len {
                let phi: f64 = self.base.state.rng.gen();
                let u: f64 = self.base.state.rng.gen();
                let attractor = phi * self.personal_best_position[member][j]
                    + (1.0 - phi) * self.global_best[j];
                let probe = Self::gaussian(
                    attractor,
                    mean_best[j],
                    mean_best[j] - self.personal_best_position[member][j],
                );
                let pull = if (self.base.state.rng.gen_range(0..100) as f64)
                    < self.base.options.mutation_probability
                {
                    probe
                } else {
                    attractor
                };

                let spread = alpha * (mean_best[j] - snapshot[member][j]).abs() * (1.0 / u).ln();
                if self.base.state.rng.gen::<f64>() > 0.5 {
                    self.current_position[member][j] += pull + spread;
                } else {
                    self.current_position[member][j] += pull - spread;
                }
            }
            self.current_position[member] = optimum(
                &self.current_position[member],
                chromosome,
                chrom_len,
                self.base.state.rng.as_mut(),
            );
        }
    }
}

impl Display for GaQpso {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Gaussian distributed local attractor QPSO (GAQPSO)")
    }
}

impl Algorithm for GaQpso {
    fn name(&self) -> &'static str {
        "GAQPSO"
    }

    fn options(&self) -> &SearchOptions {
        &self.base.options
    }

    fn options_mut(&mut self) -> &mut SearchOptions {
        &mut self.base.options
    }

    fn state(&self) -> &SearchState {
        &self.base.state
    }

    fn state_mut(&mut self) -> &mut SearchState {
        &mut self.base.state
    }

    fn prototype(&self) -> &Schedule {
        &self.base.prototype
    }

    fn initialise(&mut self) -> Result<(), SError> {
        let size = self.base.options.population_size;
        let mut population = Vec::with_capacity(size);
        for member in 0..size {
            let mut positions = vec![];
            let chromosome = self
                .base
                .prototype
                .new_from_prototype(self.base.state.rng.as_mut(), Some(&mut positions));
            if member == 0 {
                self.chrom_len = positions.len();
                self.global_best = vec![0.0; self.chrom_len];
                self.personal_best_score = vec![0.0; size];
                self.personal_best_position = vec![vec![0.0; self.chrom_len]; size];
                self.current_position = vec![vec![0.0; self.chrom_len]; size];
            }
            population.push(chromosome);
        }
        self.base.state.best = Some(population[0].clone());
        self.base.state.population = population;
        Ok(())
    }

    fn evolve(&mut self) -> Result<(), SError> {
        let mut offspring = random_pair_crossing(
            &self.base.state.population,
            &self.base.options,
            self.base.state.rng.as_mut(),
        );
        mutate_offspring(&mut offspring, &self.base.options, self.base.state.rng.as_mut());

        let previous_first = self.base.state.population[0].clone();
        let mut combined = std::mem::take(&mut self.base.state.population);
        combined.extend(offspring);

        let swarm = self.base.options.population_size.min(combined.len());
        self.update_positions(&mut combined[..swarm]);

        for member in 0..swarm {
            let mut chromosome = self.base.prototype.empty_from_prototype(None);
            chromosome.update_positions(
                &mut self.current_position[member],
                self.base.state.rng.as_mut(),
            );
            combined[member] = chromosome;
        }

        let next = self.base.replacement(combined)?;
        let candidate = if next[0].dominates(&previous_first) {
            next[0].clone()
        } else {
            previous_first
        };
        self.track_best(candidate);
        self.base.state.population = next;
        Ok(())
    }
}
