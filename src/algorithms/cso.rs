use std::fmt::{Display, Formatter};
use std::sync::Arc;

use rand::Rng;
use rand_distr::StandardNormal;

use crate::algorithms::algorithm::{
    mutate_offspring, random_pair_crossing, Algorithm, SearchOptions, SearchState,
};
use crate::algorithms::levy::LevyFlights;
use crate::algorithms::nsga3::NsgaIii;
use crate::core::{Configuration, SError, Schedule};
use crate::utils::get_rng;

/// Cuckoo Search Optimisation layered over the NSGA-III replacement.
///
/// Implemented based on:
/// > X.-S. Yang and S. Deb, "Cuckoo Search via Lévy flights," 2009 World Congress on Nature &
/// > Biologically Inspired Computing (NaBIC), Coimbatore, India, 2009, pp. 210-214,
/// > doi: 10.1109/NABIC.2009.5393690.
///
/// Each generation performs one Lévy flight of the swarm toward the running best position and
/// one pairwise directed perturbation gated by the discovery probability `pa`, then materialises
/// the updated positions into chromosomes before delegating the selection to NSGA-III.
pub struct Cso {
    base: NsgaIii,
    levy: LevyFlights,
    /// Discovery probability of an alien egg; raised by reform instead of the mutation rate.
    pa: f64,
    current_position: Vec<Vec<f64>>,
    /// The best continuous position observed so far.
    swarm_best: Vec<f64>,
}

impl Cso {
    /// Initialise the CSO algorithm for a timetable configuration.
    ///
    /// # Arguments
    ///
    /// * `configuration`: The parsed configuration.
    /// * `options`: The search options.
    ///
    /// returns: `Result<Cso, SError>`
    pub fn new(configuration: Arc<Configuration>, options: SearchOptions) -> Result<Self, SError> {
        Ok(Self {
            base: NsgaIii::new(configuration, options)?,
            levy: LevyFlights::new(0),
            pa: 0.25,
            current_position: vec![],
            swarm_best: vec![],
        })
    }

    /// The Lévy flight of the swarm toward the best observed position.
    fn update_position_levy(&mut self, population: &mut [Schedule]) {
        let levy = self.levy;
        let chrom_len = levy.chrom_len();
        let steps = levy.steps(self.base.state.rng.as_mut());
        let snapshot = self.current_position.clone();

        for (member, chromosome) in population.iter_mut().enumerate() {
            if member == 0 {
                chromosome.extract_positions(&mut self.swarm_best);
            } else {
                self.swarm_best =
                    levy.optimum(&self.swarm_best, chromosome, self.base.state.rng.as_mut());
            }

            for j in 0..chrom_len {
                let nudge: f64 = self.base.state.rng.sample(StandardNormal);
                self.current_position[member][j] +=
                    nudge * 0.01 * steps[j] * (snapshot[member][j] - self.swarm_best[j]);
            }
            self.current_position[member] = levy.optimum(
                &self.current_position[member],
                chromosome,
                self.base.state.rng.as_mut(),
            );
        }
    }

    /// The discovery step: coordinates are pushed along the difference of two random members
    /// with probability `pa`.
    fn update_position_discovery(&mut self, population: &mut [Schedule]) {
        let levy = self.levy;
        let chrom_len = levy.chrom_len();
        let size = population.len();
        let snapshot = self.current_position.clone();

        for (member, chromosome) in population.iter_mut().enumerate() {
            let d1 = self.base.state.rng.gen_range(0..size);
            let d2 = self.base.state.rng.gen_range(0..size);
            for j in 0..chrom_len {
                let discovery: f64 = self.base.state.rng.gen();
                if discovery < self.pa {
                    let pull: f64 = self.base.state.rng.gen();
                    self.current_position[member][j] += pull * (snapshot[d1][j] - snapshot[d2][j]);
                }
            }
            self.current_position[member] = levy.optimum(
                &self.current_position[member],
                chromosome,
                self.base.state.rng.as_mut(),
            );
        }
    }
}

impl Display for Cso {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cuckoo Search Optimization (CSO)")
    }
}

impl Algorithm for Cso {
    fn name(&self) -> &'static str {
        "CSO"
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

    fn reform(&mut self) {
        self.base.state.rng = get_rng(None);
        if self.base.options.crossover_probability < 95.0 {
            self.base.options.crossover_probability += 1.0;
        } else if self.pa < 0.5 {
            self.pa += 0.01;
        }
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
                let chrom_len = positions.len();
                self.levy = LevyFlights::new(chrom_len);
                self.current_position = vec![vec![0.0; chrom_len]; size];
                self.swarm_best = vec![0.0; chrom_len];
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
        self.update_position_levy(&mut combined[..swarm]);
        self.update_position_discovery(&mut combined[..swarm]);

        for member in 0..swarm {
            let mut chromosome = self.base.prototype.empty_from_prototype(None);
            chromosome.update_positions(
                &mut self.current_position[member],
                self.base.state.rng.as_mut(),
            );
            combined[member] = chromosome;
        }

        let next = self.base.replacement(combined)?;
        next[0].extract_positions(&mut self.current_position[0]);
        self.swarm_best = self.current_position[0].clone();

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

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use float_cmp::assert_approx_eq;

    use crate::algorithms::{Algorithm, SearchOptions};
    use crate::core::test_utils::SINGLE_CLASS_CONFIG;
    use crate::core::Configuration;

    use super::Cso;

    #[test]
    /// The cuckoo search converges on a satisfiable single-class configuration.
    fn test_single_class_optimum() {
        let configuration = Arc::new(Configuration::from_json(SINGLE_CLASS_CONFIG).unwrap());
        let options = SearchOptions {
            population_size: 10,
            max_generations: 15,
            seed: Some(24),
            parallel: false,
            ..SearchOptions::default()
        };
        let mut algorithm = Cso::new(configuration, options).unwrap();
        let best = algorithm.run().unwrap();
        assert_approx_eq!(f64, best.fitness(), 1.0);
    }
}
