use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use rand::Rng;

use crate::algorithms::algorithm::{random_population, Algorithm, SearchOptions, SearchState};
use crate::core::{Configuration, SError, Schedule};

/// A pairwise criteria distance between two archive members, ordered by distance first and by
/// the member indices to break ties deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct DistanceEntry {
    distance: usize,
    index1: usize,
    index2: usize,
}

/// The archive-based micro genetic algorithm.
///
/// Implemented based on:
/// > S. Tiwari, G. Fadel, and K. Deb, "AMGA2: Improving the performance of the archive-based
/// > micro-genetic algorithm for multi-objective optimization," Eng. Optim., vol. 43, no. 4,
/// > pp. 371-401, 2011.
///
/// Each generation peels ranked fronts off the archive to form the parents (topping up from the
/// overfilled front by diversity), breeds one offspring per parent with the differential
/// crossover against three distinct archive members, mutates them with a rank-scaled
/// probability and folds them back into the bounded archive, pruning overflow with the
/// efficient nearest-neighbour selection.
pub struct Amga2 {
    prototype: Schedule,
    options: SearchOptions,
    state: SearchState,
    /// Scale factor of the differential blend.
    eta_cross: f64,
    archive: Vec<Schedule>,
    parents: Vec<Schedule>,
    offspring: Vec<Schedule>,
}

impl Amga2 {
    /// Initialise the AMGA2 algorithm for a timetable configuration.
    ///
    /// # Arguments
    ///
    /// * `configuration`: The parsed configuration.
    /// * `options`: The search options.
    ///
    /// returns: `Result<Amga2, SError>`
    pub fn new(configuration: Arc<Configuration>, mut options: SearchOptions) -> Result<Self, SError> {
        options.population_size = options.population_size.max(2);
        let seed = options.seed;
        Ok(Self {
            prototype: Schedule::from_configuration(configuration)?,
            options,
            state: SearchState::new(seed),
            eta_cross: 0.35,
            archive: vec![],
            parents: vec![],
            offspring: vec![],
        })
    }

    /// Compare two chromosomes by strict fitness; the greater one dominates.
    fn check_domination(a: &Schedule, b: &Schedule) -> Ordering {
        a.strict_fitness().total_cmp(&b.strict_fitness())
    }

    /// Move the best-rank members of `pool` into `elite`, pushing everything they dominate back
    /// into the pool. Returns false when the pool was already empty.
    fn extract_best_rank(
        population: &[Schedule],
        pool: &mut VecDeque<usize>,
        elite: &mut Vec<usize>,
    ) -> bool {
        let Some(first) = pool.pop_front() else {
            return false;
        };
        let mut remains: VecDeque<usize> = VecDeque::new();
        elite.push(first);

        while let Some(candidate) = pool.pop_front() {
            let mut dominated = false;
            let mut position = 0;
            while position < elite.len() {
                match Self::check_domination(&population[candidate], &population[elite[position]])
                {
                    Ordering::Greater => {
                        remains.push_back(elite.remove(position));
                    }
                    Ordering::Less => {
                        dominated = true;
                        break;
                    }
                    Ordering::Equal => position += 1,
                }
            }
            if dominated {
                remains.push_back(candidate);
            } else {
                elite.push(candidate);
            }
        }

        pool.clear();
        pool.extend(remains);
        true
    }

    fn assign_infinite_diversity(population: &mut [Schedule], elite: &[usize]) {
        for &member in elite {
            population[member].set_diversity(f64::INFINITY);
        }
    }

    /// The unique elite indices ordered by ascending strict fitness.
    fn extract_distinct_individuals(population: &[Schedule], elite: &[usize]) -> Vec<usize> {
        let mut seen: HashSet<usize> = HashSet::new();
        let mut distinct: Vec<usize> = elite
            .iter()
            .copied()
            .filter(|&member| seen.insert(member))
            .collect();
        distinct.sort_by(|&a, &b| {
            population[a]
                .strict_fitness()
                .total_cmp(&population[b].strict_fitness())
        });
        distinct
    }

    /// Assign the crowding diversity of an elite set: each member accumulates the squared (or
    /// mixed) normalised criteria gaps toward its fitness neighbours; sets too small to measure
    /// get an infinite diversity.
    fn assign_diversity_metric(population: &mut [Schedule], elite: &[usize]) {
        if elite.len() <= 2 {
            Self::assign_infinite_diversity(population, elite);
            return;
        }
        let distinct = Self::extract_distinct_individuals(population, elite);
        if distinct.len() <= 2 {
            Self::assign_infinite_diversity(population, elite);
            return;
        }

        let size = distinct.len();
        for &member in &distinct {
            population[member].set_diversity(0.0);
        }
        let span = population[distinct[size - 1]].difference(&population[distinct[0]]);
        if span == 0 {
            return;
        }

        for position in 0..size {
            let contribution = if position == 0 {
                let right = population[distinct[1]].difference(&population[distinct[0]]) as f64
                    / span as f64;
                right * right
            } else if position == size - 1 {
                let left = population[distinct[position]]
                    .difference(&population[distinct[position - 1]]) as f64
                    / span as f64;
                left * left
            } else {
                let left = population[distinct[position]]
                    .difference(&population[distinct[position - 1]]) as f64
                    / span as f64;
                let right = population[distinct[position + 1]]
                    .difference(&population[distinct[position]]) as f64
                    / span as f64;
                left * right
            };
            let updated = population[distinct[position]].diversity() + contribution;
            population[distinct[position]].set_diversity(updated);
        }
    }

    /// Efficient nearest-neighbour selection: repeatedly inspect the closest pair and evict the
    /// member whose nearest other neighbour is closer, protecting members with an infinite
    /// diversity. Returns the surviving indices in their original order.
    fn extract_enns(population: &[Schedule], pool: &[usize], desired: usize) -> Vec<usize> {
        let infinite: Vec<usize> = pool
            .iter()
            .copied()
            .filter(|&member| population[member].diversity() == f64::INFINITY)
            .collect();
        if desired <= infinite.len() {
            return infinite[..desired].to_vec();
        }

        // de-duplicate the pool preserving order
        let mut seen: HashSet<usize> = HashSet::new();
        let elite: Vec<usize> = pool
            .iter()
            .copied()
            .filter(|&member| seen.insert(member))
            .collect();
        if elite.len() <= desired {
            return elite;
        }

        let pool_size = elite.len();
        // position of each population index inside `elite`; evicted members are reset
        let mut position_of = vec![usize::MAX; population.len()];
        for (position, &member) in elite.iter().enumerate() {
            position_of[member] = position;
        }

        let mut distance = vec![vec![0usize; pool_size]; pool_size];
        let mut entries: Vec<DistanceEntry> = Vec::with_capacity(pool_size * (pool_size - 1) / 2);
        for a in 0..pool_size {
            for b in (a + 1)..pool_size {
                let gap = population[elite[a]].difference(&population[elite[b]]);
                distance[a][b] = gap;
                distance[b][a] = gap;
                entries.push(DistanceEntry {
                    distance: gap,
                    index1: elite[a],
                    index2: elite[b],
                });
            }
        }
        entries.sort_unstable();

        let mut alive = pool_size;
        let mut cursor = 0;
        while alive > desired && cursor < entries.len() {
            let entry = entries[cursor];
            cursor += 1;
            let position1 = position_of[entry.index1];
            let position2 = position_of[entry.index2];
            if position1 == usize::MAX || position2 == usize::MAX {
                continue;
            }

            let infinite1 = population[entry.index1].diversity() == f64::INFINITY;
            let infinite2 = population[entry.index2].diversity() == f64::INFINITY;
            let evicted = if infinite1 && infinite2 {
                continue;
            } else if infinite1 {
                entry.index2
            } else if infinite2 {
                entry.index1
            } else {
                // evict the member with the closer remaining neighbour
                let mut nearest1 = usize::MAX;
                let mut nearest2 = usize::MAX;
                for (other, &member) in elite.iter().enumerate() {
                    if position_of[member] == usize::MAX
                        || other == position1
                        || other == position2
                    {
                        continue;
                    }
                    nearest1 = nearest1.min(distance[position1][other]);
                    nearest2 = nearest2.min(distance[position2][other]);
                }
                if nearest1 < nearest2 {
                    entry.index1
                } else {
                    entry.index2
                }
            };

            position_of[evicted] = usize::MAX;
            alive -= 1;
        }

        let mut survivors: Vec<usize> = elite
            .into_iter()
            .filter(|&member| position_of[member] != usize::MAX)
            .collect();
        while survivors.len() > desired {
            survivors.remove(0);
        }
        survivors
    }

    /// Keep the `target` best members of a mixed population: whole ranked fronts first, the
    /// overflowing front pruned by nearest-neighbour selection. The first front is protected
    /// with an infinite diversity.
    fn fill_best_population(mixed: &mut [Schedule], target: usize) -> Vec<usize> {
        let mut pool: VecDeque<usize> = (0..mixed.len()).collect();
        let mut elite: Vec<usize> = vec![];
        let mut filled: Vec<usize> = vec![];
        let mut rank = 1;

        for member in mixed.iter_mut() {
            member.set_diversity(0.0);
        }

        while filled.len() < target {
            if !Self::extract_best_rank(mixed, &mut pool, &mut elite) {
                break;
            }
            for &member in &elite {
                mixed[member].set_rank(rank);
            }
            if rank == 1 {
                Self::assign_infinite_diversity(mixed, &elite);
            }
            rank += 1;

            if elite.len() + filled.len() < target {
                filled.append(&mut elite);
            } else {
                let kept = Self::extract_enns(mixed, &elite, target - filled.len());
                filled.extend(kept);
                elite.clear();
                break;
            }
        }
        filled
    }

    /// Peel ranked fronts off the archive into the parent population, topping up from the
    /// overfilled front by descending diversity.
    fn create_parent_population(&mut self) {
        let target = self.options.population_size;
        let mut pool: VecDeque<usize> = (0..self.archive.len()).collect();
        let mut elite: Vec<usize> = vec![];
        let mut parents: Vec<Schedule> = Vec::with_capacity(target);
        let mut rank = 1;

        while parents.len() < target {
            if !Self::extract_best_rank(&self.archive, &mut pool, &mut elite) {
                break;
            }
            for &member in &elite {
                self.archive[member].set_rank(rank);
            }

            if parents.len() + elite.len() <= target {
                parents.extend(elite.iter().map(|&member| self.archive[member].clone()));
            } else {
                Self::assign_diversity_metric(&mut self.archive, &elite);
                let mut by_diversity = elite.clone();
                by_diversity.sort_by(|&a, &b| {
                    self.archive[b]
                        .diversity()
                        .total_cmp(&self.archive[a].diversity())
                });
                for &member in &by_diversity {
                    if parents.len() >= target {
                        break;
                    }
                    parents.push(self.archive[member].clone());
                }
            }
            elite.clear();
            rank += 1;
        }
        self.parents = parents;
    }

    /// Breed one offspring per parent with the differential crossover against three distinct
    /// archive members, inheriting the parent rank for the rank-based mutation.
    fn create_offspring_population(&mut self) {
        let archive_size = self.archive.len();
        let mut offspring = Vec::with_capacity(self.parents.len());

        for (member, parent) in self.parents.iter().enumerate() {
            if archive_size < 4 {
                offspring.push(parent.clone());
                continue;
            }

            let mut picks: Vec<usize> = Vec::with_capacity(3);
            while picks.len() < 3 {
                let candidate = self.state.rng.gen_range(0..archive_size);
                if candidate != member && !picks.contains(&candidate) {
                    picks.push(candidate);
                }
            }

            let mut child = self.prototype.differential_crossover(
                parent,
                &self.archive[picks[0]],
                &self.archive[picks[1]],
                &self.archive[picks[2]],
                self.eta_cross,
                self.options.crossover_probability,
                self.state.rng.as_mut(),
            );
            child.set_rank(parent.rank());
            offspring.push(child);
        }
        self.offspring = offspring;
    }

    /// Rank-based mutation: low ranks keep the nominal probability, the worst rank mutates
    /// almost surely.
    fn mutate_offspring_population(&mut self) {
        let archive_size = self.archive.len().max(2);
        let nominal = self.options.mutation_probability / 100.0;

        for child in &mut self.offspring {
            let ratio = child.rank().saturating_sub(1) as f64 / (archive_size - 1) as f64;
            let probability = (nominal + (1.0 - nominal) * ratio) * 100.0;
            child.mutate(self.options.mutation_size, probability, self.state.rng.as_mut());
        }
    }

    /// Fold the offspring into the bounded archive, pruning overflow with the best-rank and
    /// nearest-neighbour machinery.
    fn update_archive_population(&mut self) {
        let capacity = self.options.population_size;
        if self.archive.len() + self.offspring.len() <= capacity {
            self.archive.extend(self.offspring.iter().cloned());
        } else {
            let mut mixed: Vec<Schedule> = std::mem::take(&mut self.archive);
            mixed.extend(self.offspring.iter().cloned());
            let filled = Self::fill_best_population(&mut mixed, capacity);
            self.archive = filled.into_iter().map(|member| mixed[member].clone()).collect();
        }

        for member in &mut self.archive {
            member.set_diversity(0.0);
        }
    }
}

impl Display for Amga2 {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Archive-based Micro Genetic Algorithm (AMGA2)")
    }
}

impl Algorithm for Amga2 {
    fn name(&self) -> &'static str {
        "AMGA2"
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
        let size = self.options.population_size;
        self.archive = random_population(
            &self.prototype,
            size,
            self.options.parallel,
            self.state.rng.as_mut(),
        );
        self.parents = random_population(
            &self.prototype,
            size,
            self.options.parallel,
            self.state.rng.as_mut(),
        );
        self.offspring = vec![];
        self.state.population = self.archive.clone();
        self.state.best = Some(self.archive[0].clone());
        Ok(())
    }

    fn evolve(&mut self) -> Result<(), SError> {
        if self.archive.is_empty() {
            return Err(SError::SearchDegenerate("the archive is empty".to_string()));
        }

        self.create_parent_population();
        self.create_offspring_population();
        self.mutate_offspring_population();
        self.update_archive_population();

        let candidate = self.archive[0].clone();
        self.track_best(candidate);
        self.state.population = self.archive.clone();
        Ok(())
    }

    /// Bound the final archive to the best-rank front before reporting the result.
    fn finalise(&mut self) -> Result<(), SError> {
        if self.archive.is_empty() {
            return Ok(());
        }

        let mut pool: VecDeque<usize> = (0..self.archive.len()).collect();
        let mut elite: Vec<usize> = vec![];
        if Self::extract_best_rank(&self.archive, &mut pool, &mut elite) {
            if elite.len() > self.options.population_size {
                for &member in &elite {
                    self.archive[member].set_diversity(0.0);
                }
                Self::assign_diversity_metric(&mut self.archive, &elite);
                elite = Self::extract_enns(&self.archive, &elite, self.options.population_size);
            }
            let survivors: Vec<Schedule> =
                elite.iter().map(|&member| self.archive[member].clone()).collect();
            if let Some(first) = survivors.first() {
                self.track_best(first.clone());
            }
            self.state.population = survivors;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use float_cmp::assert_approx_eq;

    use crate::algorithms::{Algorithm, SearchOptions};
    use crate::core::test_utils::{prototype_from, SINGLE_CLASS_CONFIG, TWO_CLASS_CONFIG};
    use crate::core::Configuration;
    use crate::utils::get_rng;

    use super::Amga2;

    #[test]
    /// Small or degenerate elite sets get an infinite diversity.
    fn test_diversity_small_sets() {
        let prototype = prototype_from(TWO_CLASS_CONFIG);
        let mut rng = get_rng(Some(40));
        let mut population: Vec<_> = (0..2)
            .map(|_| prototype.new_from_prototype(&mut rng, None))
            .collect();
        Amga2::assign_diversity_metric(&mut population, &[0, 1]);
        assert_eq!(population[0].diversity(), f64::INFINITY);
        assert_eq!(population[1].diversity(), f64::INFINITY);
    }

    #[test]
    /// Nearest-neighbour pruning keeps the requested count and protects infinite diversity.
    fn test_enns_pruning() {
        let prototype = prototype_from(TWO_CLASS_CONFIG);
        let mut rng = get_rng(Some(42));
        let mut population: Vec<_> = (0..8)
            .map(|_| prototype.new_from_prototype(&mut rng, None))
            .collect();
        population[3].set_diversity(f64::INFINITY);

        let pool: Vec<usize> = (0..population.len()).collect();
        let kept = Amga2::extract_enns(&population, &pool, 4);
        assert_eq!(kept.len(), 4);
        assert!(kept.contains(&3));
    }

    #[test]
    /// The archive search converges on a satisfiable single-class configuration.
    fn test_single_class_optimum() {
        let configuration = Arc::new(Configuration::from_json(SINGLE_CLASS_CONFIG).unwrap());
        let options = SearchOptions {
            population_size: 10,
            max_generations: 20,
            seed: Some(44),
            parallel: false,
            ..SearchOptions::default()
        };
        let mut algorithm = Amga2::new(configuration, options).unwrap();
        let best = algorithm.run().unwrap();
        assert_approx_eq!(f64, best.strict_fitness(), 1.0);
    }
}
