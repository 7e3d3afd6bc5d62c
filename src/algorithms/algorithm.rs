use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, info, warn};
use rand::prelude::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::{SError, Schedule};
use crate::utils::get_rng;

/// Improvements of the best fitness below this tolerance count as stagnation.
const BEST_TOLERANCE: f64 = 1e-7;

/// The knobs shared by every optimiser.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchOptions {
    /// The number of chromosomes in the population.
    pub population_size: usize,
    /// The number of crossover points of the multi-point crossover.
    pub crossover_points: usize,
    /// The number of random relocations applied by one mutation.
    pub mutation_size: usize,
    /// The crossover probability in percent.
    pub crossover_probability: f64,
    /// The mutation probability in percent.
    pub mutation_probability: f64,
    /// The hard cap on the number of generations.
    pub max_generations: usize,
    /// The search stops once the best fitness exceeds this value.
    pub min_fitness: f64,
    /// Scales the stagnation window that triggers a reform.
    pub max_repeat: usize,
    /// The optional random seed; without one the generator is seeded from entropy.
    pub seed: Option<u64>,
    /// Build and mutate chromosomes in worker threads.
    pub parallel: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            population_size: 100,
            crossover_points: 2,
            mutation_size: 2,
            crossover_probability: 80.0,
            mutation_probability: 3.0,
            max_generations: 5000,
            min_fitness: 0.999,
            max_repeat: 9999,
            seed: None,
            parallel: true,
        }
    }
}

/// The mutable state shared by every optimiser and driven by [`Algorithm::run`].
pub struct SearchState {
    /// The current population.
    pub population: Vec<Schedule>,
    /// The best chromosome found so far.
    pub best: Option<Schedule>,
    /// The current generation number.
    pub generation: usize,
    /// Consecutive generations without a best-fitness improvement.
    pub best_not_enhance: usize,
    /// The stagnation counter as a percentage of `max_repeat`.
    pub repeat_ratio: f64,
    /// The per-optimiser random number generator, replaced on every reform.
    pub rng: Box<dyn RngCore>,
    /// Cooperative cancellation flag, checked at generation boundaries.
    pub cancel: Arc<AtomicBool>,
}

impl SearchState {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            population: vec![],
            best: None,
            generation: 0,
            best_not_enhance: 0,
            repeat_ratio: 0.0,
            rng: get_rng(seed),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }
}

/// The contract shared by all the timetable optimisers. An implementation provides
/// [`Algorithm::initialise`] to seed its population and [`Algorithm::evolve`] to advance it by
/// one generation; the provided [`Algorithm::run`] drives the loop, tracks stagnation and
/// reforms the search parameters when the best chromosome stops improving.
pub trait Algorithm: Display {
    fn name(&self) -> &'static str;
    fn options(&self) -> &SearchOptions;
    fn options_mut(&mut self) -> &mut SearchOptions;
    fn state(&self) -> &SearchState;
    fn state_mut(&mut self) -> &mut SearchState;
    fn prototype(&self) -> &Schedule;

    /// Seed the population from the prototype.
    ///
    /// return: `Result<(), SError>`
    fn initialise(&mut self) -> Result<(), SError>;

    /// Advance the search by one generation: variation, evaluation and replacement.
    ///
    /// return: `Result<(), SError>`
    fn evolve(&mut self) -> Result<(), SError>;

    /// The scalar fitness driving progress and stagnation tracking. The reference-point family
    /// reads the weighted fitness; the scalar-sorting family overrides this with the strict one.
    fn fitness_of(&self, schedule: &Schedule) -> f64 {
        schedule.fitness()
    }

    /// The stagnation threshold above which the search is reformed.
    fn stagnation_limit(&self) -> f64 {
        self.options().max_repeat as f64 / 50.0
    }

    /// Shake a stagnating search: re-seed the random number generator and widen the variation
    /// probabilities, the crossover one first.
    fn reform(&mut self) {
        self.state_mut().rng = get_rng(None);
        let options = self.options_mut();
        if options.crossover_probability < 95.0 {
            options.crossover_probability += 1.0;
        } else if options.mutation_probability < 30.0 {
            options.mutation_probability += 1.0;
        }
    }

    /// Hook invoked once after the generation loop stops.
    ///
    /// return: `Result<(), SError>`
    fn finalise(&mut self) -> Result<(), SError> {
        Ok(())
    }

    /// Replace the tracked best chromosome when the candidate is at least as fit.
    fn track_best(&mut self, candidate: Schedule) {
        let improved = match self.state().best.as_ref() {
            None => true,
            Some(best) => self.fitness_of(&candidate) >= self.fitness_of(best),
        };
        if improved {
            self.state_mut().best = Some(candidate);
        }
    }

    /// The cooperative cancellation flag; setting it stops the search at the next generation
    /// boundary.
    fn cancellation(&self) -> Arc<AtomicBool> {
        self.state().cancel.clone()
    }

    /// Run the search until the fitness target, the generation cap, a degenerate population or
    /// a cancellation stops it, and return the best chromosome found.
    ///
    /// return: `Result<Schedule, SError>`
    fn run(&mut self) -> Result<Schedule, SError> {
        info!("Starting {}", self);
        self.initialise()?;

        let mut last_best_fitness = 0.0_f64;
        loop {
            if self.state().generation > 0 {
                let best_fitness = match self.state().best.as_ref() {
                    Some(best) => self.fitness_of(best),
                    None => {
                        return Err(SError::AlgorithmRun(
                            self.name().to_string(),
                            "the search produced no best chromosome".to_string(),
                        ))
                    }
                };
                debug!(
                    "Fitness: {:.6} Generation: {}",
                    best_fitness,
                    self.state().generation
                );

                if best_fitness > self.options().min_fitness {
                    info!("Fitness target reached ({best_fitness:.6})");
                    break;
                }
                if self.prototype().class_count() == 0 {
                    debug!("The timetable has no classes, nothing to improve");
                    break;
                }

                if (best_fitness - last_best_fitness).abs() <= BEST_TOLERANCE {
                    self.state_mut().best_not_enhance += 1;
                } else {
                    last_best_fitness = best_fitness;
                    self.state_mut().best_not_enhance = 0;
                }
                let stagnant = self.state().best_not_enhance;
                self.state_mut().repeat_ratio =
                    stagnant as f64 * 100.0 / self.options().max_repeat as f64;
                if stagnant as f64 > self.stagnation_limit() {
                    debug!("Best did not improve over {stagnant} generations, reforming");
                    self.reform();
                }
            }

            if self.state().generation >= self.options().max_generations {
                info!("Maximum number of generations reached");
                break;
            }
            if self.state().cancel.load(Ordering::Relaxed) {
                info!("{} cancelled", self.name());
                break;
            }

            match self.evolve() {
                Ok(()) => {}
                Err(SError::SearchDegenerate(reason)) => {
                    warn!("Stopping {} cleanly: {reason}", self.name());
                    break;
                }
                Err(other) => return Err(other),
            }
            self.state_mut().generation += 1;
        }

        self.finalise()?;
        info!(
            "{} stopped at generation {}",
            self.name(),
            self.state().generation
        );
        self.state().best.clone().ok_or_else(|| {
            SError::AlgorithmRun(
                self.name().to_string(),
                "the search produced no best chromosome".to_string(),
            )
        })
    }
}

/// Build `count` random chromosomes from the prototype, in worker threads when `parallel` is
/// set. Worker generators are seeded from the master one so a seeded run stays reproducible.
///
/// # Arguments
///
/// * `prototype`: The prototype chromosome.
/// * `count`: The number of chromosomes to build.
/// * `parallel`: Whether to build in worker threads.
/// * `rng`: The master random number generator.
///
/// returns: `Vec<Schedule>`
pub(crate) fn random_population(
    prototype: &Schedule,
    count: usize,
    parallel: bool,
    rng: &mut dyn RngCore,
) -> Vec<Schedule> {
    if parallel {
        let seeds: Vec<u64> = (0..count).map(|_| rng.next_u64()).collect();
        seeds
            .into_par_iter()
            .map(|seed| {
                let mut worker_rng = ChaCha8Rng::seed_from_u64(seed);
                prototype.new_from_prototype(&mut worker_rng, None)
            })
            .collect()
    } else {
        (0..count)
            .map(|_| prototype.new_from_prototype(rng, None))
            .collect()
    }
}

/// Mutate every offspring, in worker threads when `parallel` is set.
pub(crate) fn mutate_offspring(
    offspring: &mut [Schedule],
    options: &SearchOptions,
    rng: &mut dyn RngCore,
) {
    let mutation_size = options.mutation_size;
    let probability = options.mutation_probability;
    if options.parallel {
        let seeds: Vec<u64> = (0..offspring.len()).map(|_| rng.next_u64()).collect();
        offspring
            .par_iter_mut()
            .zip(seeds)
            .for_each(|(child, seed)| {
                let mut worker_rng = ChaCha8Rng::seed_from_u64(seed);
                child.mutate(mutation_size, probability, &mut worker_rng);
            });
    } else {
        for child in offspring.iter_mut() {
            child.mutate(mutation_size, probability, rng);
        }
    }
}

/// Produce one offspring pair per two population slots, each parent drawn at random.
pub(crate) fn random_pair_crossing(
    population: &[Schedule],
    options: &SearchOptions,
    rng: &mut dyn RngCore,
) -> Vec<Schedule> {
    let size = population.len();
    let mut offspring = Vec::with_capacity(size + 1);
    let mut produced = 0;
    while produced < size {
        let father = &population[rng.gen_range(0..size)];
        let mother = &population[rng.gen_range(0..size)];
        offspring.push(father.crossover(
            mother,
            options.crossover_points,
            options.crossover_probability,
            rng,
        ));
        offspring.push(mother.crossover(
            father,
            options.crossover_points,
            options.crossover_probability,
            rng,
        ));
        produced += 2;
    }
    offspring
}

/// Pair the population with a random shuffle and produce two children per pair.
pub(crate) fn shuffled_pair_crossing(
    population: &[Schedule],
    options: &SearchOptions,
    rng: &mut dyn RngCore,
) -> Vec<Schedule> {
    let size = population.len();
    let mut order: Vec<usize> = (0..size).collect();
    order.shuffle(rng);

    let mut offspring = Vec::with_capacity(size);
    for pair in 0..size / 2 {
        let parent0 = &population[order[2 * pair]];
        let parent1 = &population[order[2 * pair + 1]];
        offspring.push(parent0.crossover(
            parent1,
            options.crossover_points,
            options.crossover_probability,
            rng,
        ));
        offspring.push(parent1.crossover(
            parent0,
            options.crossover_points,
            options.crossover_probability,
            rng,
        ));
    }
    offspring
}

#[cfg(test)]
mod test {
    use std::sync::atomic::Ordering;

    use crate::algorithms::{Algorithm, NsgaII, SearchOptions};
    use crate::core::test_utils::{prototype_from, SINGLE_CLASS_CONFIG, TWO_CLASS_CONFIG};
    use crate::core::Configuration;
    use std::sync::Arc;

    use super::{random_population, shuffled_pair_crossing};
    use crate::utils::get_rng;

    #[test]
    /// Parallel and sequential population construction produce valid chromosomes.
    fn test_random_population() {
        let prototype = prototype_from(TWO_CLASS_CONFIG);
        let mut rng = get_rng(Some(11));
        for parallel in [false, true] {
            let population = random_population(&prototype, 10, parallel, &mut rng);
            assert_eq!(population.len(), 10);
            for chromosome in &population {
                assert_eq!(chromosome.class_count(), 2);
                assert!(chromosome.fitness() > 0.0);
            }
        }
    }

    #[test]
    /// Shuffled pairing produces as many children as parents.
    fn test_shuffled_pair_crossing() {
        let prototype = prototype_from(TWO_CLASS_CONFIG);
        let mut rng = get_rng(Some(13));
        let population = random_population(&prototype, 8, false, &mut rng);
        let offspring = shuffled_pair_crossing(&population, &SearchOptions::default(), &mut rng);
        assert_eq!(offspring.len(), 8);
    }

    #[test]
    /// A raised cancellation flag stops the search at the first generation boundary.
    fn test_cancellation() {
        let configuration = Arc::new(Configuration::from_json(SINGLE_CLASS_CONFIG).unwrap());
        let options = SearchOptions {
            population_size: 10,
            seed: Some(3),
            parallel: false,
            ..SearchOptions::default()
        };
        let mut algorithm = NsgaII::new(configuration, options).unwrap();
        algorithm.cancellation().store(true, Ordering::Relaxed);
        let best = algorithm.run().unwrap();
        assert_eq!(algorithm.state().generation, 0);
        assert_eq!(best.class_count(), 1);
    }
}
