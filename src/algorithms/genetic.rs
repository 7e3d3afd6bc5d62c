use std::fmt::{Display, Formatter};
use std::sync::Arc;

use rand::Rng;

use crate::algorithms::algorithm::{random_population, Algorithm, SearchOptions, SearchState};
use crate::core::{Configuration, SError, Schedule};
use crate::utils::get_rng;

/// How many of the best chromosomes are protected from replacement.
const TRACK_BEST: usize = 5;

/// The default number of chromosomes replaced by offspring in each generation.
const REPLACE_BY_GENERATION: usize = 8;

/// The plain elitist genetic algorithm.
///
/// Implemented based on:
/// > Lakshmi, R. et al. "A New Biological Operator in Genetic Algorithm for Class Scheduling
/// > Problem." International Journal of Computer Applications 60 (2012): 6-11.
///
/// A fixed group of the best chromosomes is tracked and shielded from replacement; every
/// generation a handful of random non-elite members are overwritten by freshly bred offspring.
/// Reforming triples the replacement count on top of the usual probability bump.
pub struct GeneticAlgorithm {
    prototype: Schedule,
    options: SearchOptions,
    state: SearchState,
    /// Indices of the tracked best chromosomes, ordered by descending fitness.
    best_group: Vec<usize>,
    /// Whether each population slot belongs to the tracked best group.
    best_flags: Vec<bool>,
    replace_by_generation: usize,
}

impl GeneticAlgorithm {
    /// Initialise the genetic algorithm for a timetable configuration.
    ///
    /// # Arguments
    ///
    /// * `configuration`: The parsed configuration.
    /// * `options`: The search options.
    ///
    /// returns: `Result<GeneticAlgorithm, SError>`
    pub fn new(configuration: Arc<Configuration>, mut options: SearchOptions) -> Result<Self, SError> {
        // enough room must remain outside the protected group
        options.population_size = options.population_size.max(TRACK_BEST + 2);
        let seed = options.seed;
        Ok(Self {
            prototype: Schedule::from_configuration(configuration)?,
            options,
            state: SearchState::new(seed),
            best_group: vec![],
            best_flags: vec![],
            replace_by_generation: REPLACE_BY_GENERATION,
        })
    }

    fn set_replace_by_generation(&mut self, value: usize) {
        let cap = self.options.population_size - TRACK_BEST;
        self.replace_by_generation = value.min(cap);
    }

    fn is_in_best(&self, slot: usize) -> bool {
        self.best_flags[slot]
    }

    /// Try to admit a population slot into the tracked best group, keeping the group sorted by
    /// descending fitness and evicting its weakest member when full.
    fn add_to_best(&mut self, slot: usize) {
        if self.best_flags[slot] {
            return;
        }
        let fitness = self.state.population[slot].strict_fitness();
        if self.best_group.len() == TRACK_BEST {
            let weakest = *self.best_group.last().unwrap();
            if self.state.population[weakest].strict_fitness() >= fitness {
                return;
            }
            self.best_flags[weakest] = false;
            self.best_group.pop();
        }

        let position = self
            .best_group
            .partition_point(|&member| self.state.population[member].strict_fitness() >= fitness);
        self.best_group.insert(position, slot);
        self.best_flags[slot] = true;
    }

    fn clear_best(&mut self) {
        self.best_group.clear();
        self.best_flags = vec![false; self.options.population_size];
    }
}

impl Display for GeneticAlgorithm {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Genetic Algorithm")
    }
}

impl Algorithm for GeneticAlgorithm {
    fn name(&self) -> &'static str {
        "GA"
    }

    fn options(&self) -> &SearchOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut SearchOptions {
        &mut self.options
    }

    fn state(&self) -> &SearchState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SearchState {
        &mut self.state
    }

    fn prototype(&self) -> &Schedule {
        &self.prototype
    }

    fn fitness_of(&self, schedule: &Schedule) -> f64 {
        schedule.strict_fitness()
    }

    fn stagnation_limit(&self) -> f64 {
        self.options.max_repeat as f64 / 100.0
    }

    fn reform(&mut self) {
        self.state.rng = get_rng(None);
        self.set_replace_by_generation(self.replace_by_generation * 3);
        self.options.crossover_probability += 1.0;
    }

    fn initialise(&mut self) -> Result<(), SError> {
        self.clear_best();
        self.state.population = random_population(
            &self.prototype,
            self.options.population_size,
            self.options.parallel,
            self.state.rng.as_mut(),
        );
        for slot in 0..self.state.population.len() {
            self.add_to_best(slot);
        }
        let leader = self.best_group[0];
        self.state.best = Some(self.state.population[leader].clone());
        Ok(())
    }

    fn evolve(&mut self) -> Result<(), SError> {
        let size = self.state.population.len();
        for _ in 0..self.replace_by_generation {
            let child = {
                let father = &self.state.population[self.state.rng.gen_range(0..size)];
                let mother = &self.state.population[self.state.rng.gen_range(0..size)];
                let mut child = father.crossover(
                    mother,
                    self.options.crossover_points,
                    self.options.crossover_probability,
                    self.state.rng.as_mut(),
                );
                child.mutate(
                    self.options.mutation_size,
                    self.options.mutation_probability,
                    self.state.rng.as_mut(),
                );
                child
            };

            // replace a random chromosome outside the protected group
            let mut slot = self.state.rng.gen_range(0..size);
            while self.is_in_best(slot) {
                slot = self.state.rng.gen_range(0..size);
            }
            self.state.population[slot] = child;
            self.add_to_best(slot);
        }

        let leader = self.best_group[0];
        let candidate = self.state.population[leader].clone();
        self.track_best(candidate);
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

    use super::GeneticAlgorithm;

    #[test]
    /// The protected best group stays sorted by descending fitness.
    fn test_best_group_sorted() {
        let configuration = Arc::new(Configuration::from_json(SINGLE_CLASS_CONFIG).unwrap());
        let options = SearchOptions {
            population_size: 12,
            seed: Some(50),
            parallel: false,
            ..SearchOptions::default()
        };
        let mut algorithm = GeneticAlgorithm::new(configuration, options).unwrap();
        algorithm.initialise().unwrap();

        let fitness: Vec<f64> = algorithm
            .best_group
            .iter()
            .map(|&slot| algorithm.state.population[slot].strict_fitness())
            .collect();
        assert!(fitness.windows(2).all(|pair| pair[0] >= pair[1]));
    }

    #[test]
    /// The elitist search converges on a satisfiable single-class configuration.
    fn test_single_class_optimum() {
        let configuration = Arc::new(Configuration::from_json(SINGLE_CLASS_CONFIG).unwrap());
        let options = SearchOptions {
            population_size: 12,
            max_generations: 30,
            seed: Some(52),
            parallel: false,
            ..SearchOptions::default()
        };
        let mut algorithm = GeneticAlgorithm::new(configuration, options).unwrap();
        let best = algorithm.run().unwrap();
        assert_approx_eq!(f64, best.strict_fitness(), 1.0);
    }
}
