use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::algorithms::algorithm::{
    mutate_offspring, random_pair_crossing, Algorithm, SearchOptions, SearchState,
};
use crate::algorithms::nsga3::NsgaIii;
use crate::core::{Configuration, SError, Schedule, CRITERIA_NUM};

/// How many stagnant generations switch the dual control strategy to population growth.
const GROWTH_STAGNATION: usize = 15;

/// Adaptive-population NSGA-III with a dual control strategy.
///
/// Implemented based on:
/// > Wu, M.; Yang, D.; Zhou, B.; Yang, Z.; Liu, T.; Li, L.; Wang, Z.; Hu, K. Adaptive Population
/// > NSGA-III with Dual Control Strategy for Flexible Job Shop Scheduling Problem with the
/// > Consideration of Energy Consumption and Weight. Machines 2021, 9, 344.
/// > <https://doi.org/10.3390/machines9120344>
///
/// Each generation runs the NSGA-III replacement, sorts the survivors by weighted fitness and
/// then challenges every member with a mutated clone; dominated members are replaced and, while
/// the search stagnates, promising clones grow the population up to one and a half times its
/// nominal size before an expansion-based cut shrinks it back.
pub struct ApNsgaIii {
    base: NsgaIii,
    /// The weakest member of the latest population, used by the expansion measure.
    worst: Option<Schedule>,
}

impl ApNsgaIii {
    /// Initialise the APNsgaIII algorithm for a timetable configuration.
    ///
    /// # Arguments
    ///
    /// * `configuration`: The parsed configuration.
    /// * `options`: The search options.
    ///
    /// returns: `Result<ApNsgaIii, SError>`
    pub fn new(configuration: Arc<Configuration>, options: SearchOptions) -> Result<Self, SError> {
        Ok(Self {
            base: NsgaIii::new(configuration, options)?,
            worst: None,
        })
    }

    /// The expansion measure of a chromosome: its objective distance from the best, scaled by
    /// the worst-to-best spread. Values above one half mark members pulling the population away
    /// from the front.
    fn expansion(&self, chromosome: &Schedule) -> f64 {
        let (Some(best), Some(worst)) = (self.base.state.best.as_ref(), self.worst.as_ref())
        else {
            return 0.0;
        };
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for objective in 0..CRITERIA_NUM {
            numerator += chromosome.objectives()[objective] - best.objectives()[objective];
            denominator += worst.objectives()[objective] - best.objectives()[objective];
        }
        (numerator + 1.0) / (denominator + 1.0)
    }

    /// Shrink an overgrown population by dropping expanded members outside the protected top
    /// ranks.
    fn population_decrease(&mut self, population: &mut Vec<Schedule>) {
        let target = self.base.options.population_size;
        if population.len() <= target {
            return;
        }

        let protected = (0.3 * target as f64) as usize;
        let mut member = 0;
        while member < population.len() && population.len() > target {
            if member > protected && self.expansion(&population[member]) > 0.5 {
                population.remove(member);
            } else {
                member += 1;
            }
        }
    }

    /// The tumor-clone challenge of the dual control strategy: every member fights a mutated
    /// clone of itself; winning clones replace their originals and, under stagnation, losing
    /// but non-dominated clones are admitted until the population reaches `growth_cap`.
    fn dual_control_strategy(&mut self, population: &mut Vec<Schedule>) {
        let growth_cap = (1.5 * self.base.options.population_size as f64) as usize;
        let initial_size = population.len();
        let mutation_size = self.base.options.mutation_size;
        let mutation_probability = self.base.options.mutation_probability;

        for member in 0..initial_size {
            let mut tumor = population[member].clone();
            tumor.mutate(mutation_size, mutation_probability, self.base.state.rng.as_mut());

            self.worst = population.last().cloned();
            if tumor.dominates(&population[member]) {
                population[member] = tumor.clone();
                let beats_best = self
                    .base
                    .state
                    .best
                    .as_ref()
                    .map(|best| tumor.dominates(best))
                    .unwrap_or(true);
                if beats_best {
                    self.track_best(tumor);
                }
            } else if self.base.state.best_not_enhance >= GROWTH_STAGNATION
                && population.len() < growth_cap
            {
                let worst_dominates = self
                    .worst
                    .as_ref()
                    .map(|worst| worst.dominates(&tumor))
                    .unwrap_or(false);
                if worst_dominates {
                    population.push(tumor.clone());
                    self.worst = Some(tumor);
                } else {
                    let before_last = population.len().saturating_sub(1);
                    population.insert(before_last, tumor);
                }
            }
        }

        self.population_decrease(population);
    }
}

impl Display for ApNsgaIii {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Adaptive Population NSGA-III with Dual Control Strategy (APNsgaIII)"
        )
    }
}

impl Algorithm for ApNsgaIii {
    fn name(&self) -> &'static str {
        "APNsgaIII"
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
        self.base.initialise()
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

        let mut next = self.base.replacement(combined)?;
        next.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));

        let candidate = if next[0].dominates(&previous_first) {
            next[0].clone()
        } else {
            previous_first
        };
        self.track_best(candidate);

        self.dual_control_strategy(&mut next);
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

    use super::ApNsgaIii;

    #[test]
    /// The dual control strategy still converges on a satisfiable configuration.
    fn test_single_class_optimum() {
        let configuration = Arc::new(Configuration::from_json(SINGLE_CLASS_CONFIG).unwrap());
        let options = SearchOptions {
            population_size: 16,
            max_generations: 15,
            seed: Some(8),
            parallel: false,
            ..SearchOptions::default()
        };
        let mut algorithm = ApNsgaIii::new(configuration, options).unwrap();
        let best = algorithm.run().unwrap();
        assert_approx_eq!(f64, best.fitness(), 1.0);
    }

    #[test]
    /// The population never grows beyond one and a half times its nominal size.
    fn test_population_growth_is_bounded() {
        let configuration = Arc::new(
            Configuration::from_json(crate::core::test_utils::STUCK_CONFIG).unwrap(),
        );
        let options = SearchOptions {
            population_size: 10,
            max_generations: 25,
            max_repeat: 1000,
            seed: Some(14),
            parallel: false,
            ..SearchOptions::default()
        };
        let mut algorithm = ApNsgaIii::new(configuration, options).unwrap();
        algorithm.run().unwrap();
        assert!(algorithm.state().population.len() <= 15);
    }
}
