use std::collections::{HashMap, HashSet};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use ordered_float::OrderedFloat;

use crate::algorithms::algorithm::{
    mutate_offspring, random_population, shuffled_pair_crossing, Algorithm, SearchOptions,
    SearchState,
};
use crate::core::{Configuration, SError, Schedule};
use crate::utils::fast_non_dominated_sort;

/// The Non-dominated Sorting Genetic Algorithm.
///
/// Implemented based on:
/// > K. Deb, A. Pratap, S. Agarwal and T. Meyarivan, "A fast and elitist multi-objective genetic
/// > algorithm: NSGA-II," in IEEE Transactions on Evolutionary Computation, vol. 6, no. 2, pp.
/// > 182-197, April 2002, doi: 10.1109/4235.996017.
///
/// Chromosomes are ranked by their strict scalar fitness; ties inside a front are broken by a
/// crowding distance measured on the criteria difference between fitness neighbours. An elite
/// population is merged with the freshly selected one every generation so the best front is
/// never lost.
pub struct NsgaII {
    pub(crate) prototype: Schedule,
    pub(crate) options: SearchOptions,
    pub(crate) state: SearchState,
    /// The best front carried across generations.
    elite: Vec<Schedule>,
}

impl NsgaII {
    /// Initialise the NSGA-II algorithm for a timetable configuration.
    ///
    /// # Arguments
    ///
    /// * `configuration`: The parsed configuration.
    /// * `options`: The search options.
    ///
    /// returns: `Result<NsgaII, SError>`
    pub fn new(configuration: Arc<Configuration>, mut options: SearchOptions) -> Result<Self, SError> {
        // there should be at least 2 chromosomes in the population
        options.population_size = options.population_size.max(2);
        let seed = options.seed;
        Ok(Self {
            prototype: Schedule::from_configuration(configuration)?,
            options,
            state: SearchState::new(seed),
            elite: vec![],
        })
    }

    /// Sort a combined population into fronts by strict-fitness domination.
    pub(crate) fn non_dominated_sorting(population: &[Schedule]) -> Vec<Vec<usize>> {
        fast_non_dominated_sort(population, |a, b| a.strict_fitness() > b.strict_fitness())
    }

    /// Calculate the crowding distance of a front. Individuals are keyed by distinct fitness
    /// values; the two extreme representatives get an infinite distance and the inner ones
    /// accumulate the criteria difference between their fitness neighbours, normalised by the
    /// extreme-to-extreme difference.
    ///
    /// # Arguments
    ///
    /// * `front`: The indices of the front members.
    /// * `population`: The combined population the indices refer to.
    ///
    /// returns: `HashMap<usize, f64>`. The distance of every front member.
    pub(crate) fn crowding_distance(
        front: &[usize],
        population: &[Schedule],
    ) -> HashMap<usize, f64> {
        let mut distance: HashMap<usize, f64> = front.iter().map(|&i| (i, 0.0)).collect();

        // one representative per distinct fitness value, in first-seen order
        let mut seen: HashSet<OrderedFloat<f64>> = HashSet::new();
        let mut representatives: Vec<usize> = vec![];
        for &member in front {
            if seen.insert(OrderedFloat(population[member].strict_fitness())) {
                representatives.push(member);
            }
        }
        representatives.sort_by(|&a, &b| {
            population[a]
                .strict_fitness()
                .total_cmp(&population[b].strict_fitness())
        });

        let size = representatives.len();
        distance.insert(representatives[0], f64::MAX);
        distance.insert(representatives[size - 1], f64::MAX);

        if size > 1 {
            let span =
                population[representatives[size - 1]].difference(&population[representatives[0]]);
            if span > 0 {
                for i in 1..size - 1 {
                    let delta = population[representatives[i + 1]]
                        .difference(&population[representatives[i - 1]])
                        as f64
                        / span as f64;
                    *distance.get_mut(&representatives[i]).unwrap() += delta;
                }
            }
        }
        distance
    }

    /// Select the next population: whole fronts are taken while they fit and the first
    /// overflowing front is filtered by descending crowding distance.
    pub(crate) fn selection(
        target: usize,
        fronts: &[Vec<usize>],
        population: &[Schedule],
    ) -> Vec<Schedule> {
        let mut selected: Vec<usize> = vec![];
        for front in fronts {
            if selected.len() + front.len() > target {
                let distance = Self::crowding_distance(front, population);
                let mut by_distance = front.to_vec();
                by_distance.sort_by(|a, b| distance[b].total_cmp(&distance[a]));
                for member in by_distance {
                    if selected.len() >= target {
                        break;
                    }
                    selected.push(member);
                }
                break;
            }
            selected.extend(front.iter().copied());
            if selected.len() == target {
                break;
            }
        }
        selected
            .into_iter()
            .map(|member| population[member].clone())
            .collect()
    }
}

impl Display for NsgaII {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "NSGA II")
    }
}

impl Algorithm for NsgaII {
    fn name(&self) -> &'static str {
        "NSGA-II"
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

    fn initialise(&mut self) -> Result<(), SError> {
        self.state.population = random_population(
            &self.prototype,
            self.options.population_size,
            self.options.parallel,
            self.state.rng.as_mut(),
        );
        self.state.best = Some(self.state.population[0].clone());
        Ok(())
    }

    fn evolve(&mut self) -> Result<(), SError> {
        let mut offspring =
            shuffled_pair_crossing(&self.state.population, &self.options, self.state.rng.as_mut());
        mutate_offspring(&mut offspring, &self.options, self.state.rng.as_mut());

        let mut combined = std::mem::take(&mut self.state.population);
        combined.extend(offspring);

        let fronts = Self::non_dominated_sorting(&combined);
        if fronts.is_empty() || fronts[0].is_empty() {
            return Err(SError::SearchDegenerate(
                "the non-dominated front is empty".to_string(),
            ));
        }
        let population = Self::selection(self.options.population_size, &fronts, &combined);

        if self.state.generation == 0 {
            self.elite = population.clone();
        } else {
            // merge the elite with the new population and keep the best of both
            let mut pool = population.clone();
            pool.extend(self.elite.iter().cloned());
            let fronts = Self::non_dominated_sorting(&pool);
            if fronts.is_empty() || fronts[0].is_empty() {
                return Err(SError::SearchDegenerate(
                    "the non-dominated front is empty".to_string(),
                ));
            }
            self.elite = Self::selection(self.options.population_size, &fronts, &pool);
        }

        let candidate = self.elite[0].clone();
        self.track_best(candidate);
        self.state.population = population;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use float_cmp::assert_approx_eq;

    use crate::algorithms::{Algorithm, SearchOptions};
    use crate::core::test_utils::{
        prototype_from, SAME_PROFESSOR_CONFIG, SINGLE_CLASS_CONFIG, TWO_CLASS_CONFIG,
    };
    use crate::core::{Configuration, Reservation};
    use crate::utils::get_rng;

    use super::NsgaII;

    fn small_options(seed: u64) -> SearchOptions {
        SearchOptions {
            population_size: 20,
            max_generations: 50,
            seed: Some(seed),
            parallel: false,
            ..SearchOptions::default()
        }
    }

    #[test]
    /// The extreme fitness representatives of a front get an infinite crowding distance.
    fn test_crowding_distance_extremes() {
        let prototype = prototype_from(TWO_CLASS_CONFIG);
        let mut rng = get_rng(Some(7));
        let population: Vec<_> = (0..6)
            .map(|_| prototype.new_from_prototype(&mut rng, None))
            .collect();
        let front: Vec<usize> = (0..population.len()).collect();
        let distance = NsgaII::crowding_distance(&front, &population);

        assert_eq!(distance.len(), population.len());
        let infinite = distance.values().filter(|&&d| d == f64::MAX).count();
        assert!(infinite >= 1);
        assert!(distance.values().all(|&d| d >= 0.0));
    }

    #[test]
    /// Selection never exceeds the target population size.
    fn test_selection_size() {
        let prototype = prototype_from(TWO_CLASS_CONFIG);
        let mut rng = get_rng(Some(19));
        let population: Vec<_> = (0..30)
            .map(|_| prototype.new_from_prototype(&mut rng, None))
            .collect();
        let fronts = NsgaII::non_dominated_sorting(&population);
        let selected = NsgaII::selection(10, &fronts, &population);
        assert_eq!(selected.len(), 10);
    }

    #[test]
    /// A single class with a fitting laboratory reaches a perfect fitness within a few
    /// generations.
    fn test_single_class_optimum() {
        let configuration = Arc::new(Configuration::from_json(SINGLE_CLASS_CONFIG).unwrap());
        let mut options = small_options(5);
        options.max_generations = 10;
        let mut algorithm = NsgaII::new(configuration, options).unwrap();
        let best = algorithm.run().unwrap();

        assert_approx_eq!(f64, best.strict_fitness(), 1.0);
        assert!(best.criteria().iter().all(|&flag| flag));
    }

    #[test]
    /// Two classes of the same professor with a single room must end up on distinct
    /// `(day, time)` pairs in the optimum.
    fn test_same_professor_classes_are_separated() {
        let configuration = Arc::new(Configuration::from_json(SAME_PROFESSOR_CONFIG).unwrap());
        let mut algorithm = NsgaII::new(configuration, small_options(9)).unwrap();
        let best = algorithm.run().unwrap();

        assert_approx_eq!(f64, best.strict_fitness(), 1.0);
        let rooms = best.configuration().number_of_rooms();
        let first = Reservation::parse(best.class_table()[0].unwrap(), rooms);
        let second = Reservation::parse(best.class_table()[1].unwrap(), rooms);
        assert!(first.day != second.day || first.time != second.time);
    }

    #[test]
    /// An empty configuration stops after a single generation with a defined fitness.
    fn test_empty_configuration() {
        let configuration = Arc::new(Configuration::from_json("[]").unwrap());
        let mut algorithm = NsgaII::new(configuration, small_options(3)).unwrap();
        let best = algorithm.run().unwrap();

        assert_eq!(algorithm.state().generation, 1);
        assert_eq!(best.class_count(), 0);
        assert_approx_eq!(f64, best.strict_fitness(), 0.0);
    }
}
