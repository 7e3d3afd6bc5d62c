use std::fmt::{Display, Formatter};
use std::sync::Arc;

use rand::Rng;

use crate::algorithms::algorithm::{
    mutate_offspring, random_pair_crossing, Algorithm, SearchOptions, SearchState,
};
use crate::algorithms::levy::LevyFlights;
use crate::algorithms::nsga3::NsgaIii;
use crate::core::{Configuration, SError, Schedule};
use crate::utils::get_rng;

/// Flower Pollination Algorithm layered over the NSGA-III replacement.
///
/// Implemented based on:
/// > Yang, X. S. 2012. Flower pollination algorithm for global optimization. Unconventional
/// > Computation and Natural Computation 7445: 240-49.
///
/// The switch probability `pa` gates each member between global pollination (a Lévy flight
/// toward the best position) and biotic pollination (a directed mix of two random members).
pub struct Fpa {
    base: NsgaIii,
    levy: LevyFlights,
    /// Switch probability between global and biotic pollination.
    pa: f64,
    global_best: Option<Vec<f64>>,
    current_position: Vec<Vec<f64>>,
}

impl Fpa {
    /// Initialise the FPA algorithm for a timetable configuration.
    ///
    /// # Arguments
    ///
    /// * `configuration`: The parsed configuration.
    /// * `options`: The search options.
    ///
    /// returns: `Result<Fpa, SError>`
    pub fn new(configuration: Arc<Configuration>, mut options: SearchOptions) -> Result<Self, SError> {
        // there should be at least 5 flowers for the biotic mix to make sense
        options.population_size = options.population_size.max(5);
        Ok(Self {
            base: NsgaIii::new(configuration, options)?,
            levy: LevyFlights::new(0),
            pa: 0.25,
            global_best: None,
            current_position: vec![],
        })
    }

    fn update_positions(&mut self, population: &mut [Schedule]) {
        let levy = self.levy;
        let chrom_len = levy.chrom_len();
        let size = population.len();
        let snapshot = self.current_position.clone();

        for (member, chromosome) in population.iter_mut().enumerate() {
            let switch: f64 = self.base.state.rng.gen();
            if switch < self.pa {
                let best = levy.update_position(
                    chromosome,
                    &mut self.current_position,
                    member,
                    self.global_best.take(),
                    self.base.state.rng.as_mut(),
                );
                self.global_best = Some(best);
            } else {
                let d1 = self.base.state.rng.gen_range(0..size);
                let mut d2 = self.base.state.rng.gen_range(0..size);
                while d1 == d2 {
                    d2 = self.base.state.rng.gen_range(0..size);
                }
                for j in 0..chrom_len {
                    let pull: f64 = self.base.state.rng.gen();
                    self.current_position[member][j] += pull * (snapshot[d1][j] - snapshot[d2][j]);
                }
                self.current_position[member] = levy.optimum(
                    &self.current_position[member],
                    chromosome,
                    self.base.state.rng.as_mut(),
                );
            }
        }
    }
}

impl Display for Fpa {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Flower Pollination Algorithm (FPA)")
    }
}

impl Algorithm for Fpa {
    fn name(&self) -> &'static str {
        "FPA"
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

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use float_cmp::assert_approx_eq;

    use crate::algorithms::{Algorithm, SearchOptions};
    use crate::core::test_utils::SINGLE_CLASS_CONFIG;
    use crate::core::Configuration;

    use super::Fpa;

    #[test]
    /// The pollination search converges on a satisfiable single-class configuration.
    fn test_single_class_optimum() {
        let configuration = Arc::new(Configuration::from_json(SINGLE_CLASS_CONFIG).unwrap());
        let options = SearchOptions {
            population_size: 10,
            max_generations: 15,
            seed: Some(26),
            parallel: false,
            ..SearchOptions::default()
        };
        let mut algorithm = Fpa::new(configuration, options).unwrap();
        let best = algorithm.run().unwrap();
        assert_approx_eq!(f64, best.fitness(), 1.0);
    }
}
