use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use rand::prelude::SliceRandom;
use rand::RngCore;

use crate::algorithms::algorithm::{
    mutate_offspring, random_pair_crossing, random_population, Algorithm, SearchOptions,
    SearchState,
};
use crate::core::{Configuration, SError, Schedule, CRITERIA_NUM};
use crate::utils::{
    das_dennis_points, fast_non_dominated_sort, perpendicular_distance, solve_linear_system,
};

/// A reference direction on the unit simplex together with its association bookkeeping: the
/// number of selected individuals already linked to it and the boundary-front candidates that
/// could still be.
pub(crate) struct ReferencePoint {
    member_count: usize,
    position: Vec<f64>,
    /// Candidate individuals from the boundary front, with their perpendicular distance.
    potential_members: HashMap<usize, f64>,
}

impl ReferencePoint {
    /// Generate the reference points for the given objective count, one layer per divisions
    /// entry (the inside layer shrunk toward the centroid).
    pub(crate) fn generate(
        number_of_objectives: usize,
        divisions: &[usize],
    ) -> Vec<ReferencePoint> {
        das_dennis_points(number_of_objectives, divisions)
            .into_iter()
            .map(|position| ReferencePoint {
                member_count: 0,
                position,
                potential_members: HashMap::new(),
            })
            .collect()
    }

    fn add_member(&mut self) {
        self.member_count += 1;
    }

    fn add_potential_member(&mut self, member: usize, distance: f64) {
        let entry = self.potential_members.entry(member).or_insert(distance);
        if distance < *entry {
            *entry = distance;
        }
    }

    fn has_potential_member(&self) -> bool {
        !self.potential_members.is_empty()
    }

    fn find_closest_member(&self) -> Option<usize> {
        self.potential_members
            .iter()
            .min_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(&member, _)| member)
    }

    fn random_member(&self, rng: &mut dyn RngCore) -> Option<usize> {
        let mut members: Vec<usize> = self.potential_members.keys().copied().collect();
        members.sort_unstable();
        members.choose(rng).copied()
    }

    fn remove_potential_member(&mut self, member: usize) {
        self.potential_members.remove(&member);
    }
}

/// The reference-point based many-objective evolutionary algorithm.
///
/// Implemented based on:
/// > K. Deb and H. Jain, "An Evolutionary Many-Objective Optimization Algorithm Using
/// > Reference-Point-Based Nondominated Sorting Approach, Part I: Solving Problems With Box
/// > Constraints," in IEEE Transactions on Evolutionary Computation, vol. 18, no. 4, pp.
/// > 577-601, 2014, doi: 10.1109/TEVC.2013.2281535.
///
/// Selection works on the per-criterion violation counts: the combined population is sorted by
/// Pareto domination, the collected objectives are translated by the ideal point and normalised
/// by the intercepts of the extreme-point hyperplane, and the boundary front is niched over the
/// Das-Dennis reference directions.
pub struct NsgaIii {
    pub(crate) prototype: Schedule,
    pub(crate) options: SearchOptions,
    pub(crate) state: SearchState,
    /// Das-Dennis divisions per layer; two shrunk layers are used for many objectives.
    obj_division: Vec<usize>,
}

impl NsgaIii {
    /// Initialise the NSGA-III algorithm for a timetable configuration.
    ///
    /// # Arguments
    ///
    /// * `configuration`: The parsed configuration.
    /// * `options`: The search options.
    ///
    /// returns: `Result<NsgaIii, SError>`
    pub fn new(configuration: Arc<Configuration>, mut options: SearchOptions) -> Result<Self, SError> {
        options.population_size = options.population_size.max(2);
        let seed = options.seed;
        let obj_division = if CRITERIA_NUM < 8 { vec![6] } else { vec![3, 2] };
        Ok(Self {
            prototype: Schedule::from_configuration(configuration)?,
            options,
            state: SearchState::new(seed),
            obj_division,
        })
    }

    /// Achievement Scalarisation Function: the largest objective-to-weight ratio.
    fn asf(objectives: &[f64], weight: &[f64]) -> f64 {
        objectives
            .iter()
            .zip(weight)
            .map(|(objective, w)| objective / w.max(1e-6))
            .fold(f64::MIN, f64::max)
    }

    /// Subtract the per-objective ideal point (the minimum over the first front) from the
    /// objectives of every collected individual, storing the result in their converted
    /// objectives.
    fn translate_objectives(population: &mut [Schedule], fronts: &[Vec<usize>]) -> Vec<f64> {
        for front in fronts {
            for &member in front {
                population[member].resize_converted_objectives(CRITERIA_NUM);
            }
        }

        let mut ideal_point = Vec::with_capacity(CRITERIA_NUM);
        for objective in 0..CRITERIA_NUM {
            // the minimum appears in the first front
            let min_value = fronts[0]
                .iter()
                .map(|&member| population[member].objectives()[objective])
                .fold(f64::MAX, f64::min);
            ideal_point.push(min_value);

            for front in fronts {
                for &member in front {
                    let translated = population[member].objectives()[objective] - min_value;
                    population[member].converted_objectives_mut()[objective] = translated;
                }
            }
        }
        ideal_point
    }

    /// Find the first-front member minimising the ASF along each objective axis.
    fn find_extreme_points(population: &[Schedule], fronts: &[Vec<usize>]) -> Vec<usize> {
        let mut extreme_points = Vec::with_capacity(CRITERIA_NUM);
        for objective in 0..CRITERIA_NUM {
            let mut weight = [1e-6; CRITERIA_NUM];
            weight[objective] = 1.0;

            let best = fronts[0]
                .iter()
                .copied()
                .min_by(|&a, &b| {
                    Self::asf(population[a].converted_objectives(), &weight)
                        .total_cmp(&Self::asf(population[b].converted_objectives(), &weight))
                })
                .expect("the first front is never empty");
            extreme_points.push(best);
        }
        extreme_points
    }

    /// The per-objective maximum over the whole collected population, used when the hyperplane
    /// cannot be constructed.
    fn find_max_objectives(population: &[Schedule], fronts: &[Vec<usize>]) -> Vec<f64> {
        let mut max_point = vec![f64::MIN; CRITERIA_NUM];
        for front in fronts {
            for &member in front {
                for (objective, value) in max_point.iter_mut().enumerate() {
                    *value = value.max(population[member].objectives()[objective]);
                }
            }
        }
        max_point
    }

    /// Build the hyperplane through the extreme points and return its intercepts. Duplicate
    /// extreme points, a singular system or a negative solution component make the construction
    /// degenerate; the per-objective maxima are used instead (the method of Yuan et al., GECCO
    /// 2015).
    fn construct_hyperplane(
        population: &[Schedule],
        fronts: &[Vec<usize>],
        extreme_points: &[usize],
    ) -> Vec<f64> {
        let duplicate = extreme_points
            .iter()
            .enumerate()
            .any(|(i, a)| extreme_points[i + 1..].contains(a));

        if !duplicate {
            let coefficients: Vec<Vec<f64>> = extreme_points
                .iter()
                .map(|&member| population[member].converted_objectives().to_vec())
                .collect();
            let ones = vec![1.0; CRITERIA_NUM];
            if let Some(solution) = solve_linear_system(&coefficients, &ones) {
                if solution.iter().all(|&value| value >= 0.0) {
                    return solution.iter().map(|&value| 1.0 / value).collect();
                }
            }
        }
        Self::find_max_objectives(population, fronts)
    }

    /// Normalise the converted objectives by the hyperplane intercepts.
    fn normalize_objectives(
        population: &mut [Schedule],
        fronts: &[Vec<usize>],
        intercepts: &[f64],
        ideal_point: &[f64],
    ) {
        for front in fronts {
            for &member in front {
                for objective in 0..CRITERIA_NUM {
                    let denominator =
                        intercepts[objective] - ideal_point[objective] + f64::EPSILON;
                    population[member].converted_objectives_mut()[objective] /= denominator;
                }
            }
        }
    }

    /// Associate every collected individual with its nearest reference direction by
    /// perpendicular distance. Members of closed fronts count as members; boundary-front ones
    /// are only potential.
    fn associate(
        reference_points: &mut [ReferencePoint],
        population: &[Schedule],
        fronts: &[Vec<usize>],
    ) {
        for (depth, front) in fronts.iter().enumerate() {
            for &member in front {
                let mut closest = reference_points.len() - 1;
                let mut min_distance = f64::MAX;
                for (index, reference_point) in reference_points.iter().enumerate() {
                    let distance = perpendicular_distance(
                        &reference_point.position,
                        population[member].converted_objectives(),
                    );
                    if distance < min_distance {
                        closest = index;
                        min_distance = distance;
                    }
                }

                if depth + 1 != fronts.len() {
                    reference_points[closest].add_member();
                } else {
                    reference_points[closest].add_potential_member(member, min_distance);
                }
            }
        }
    }

    /// A random reference point among those with the smallest member count.
    fn find_niche_reference_point(
        reference_points: &[ReferencePoint],
        rng: &mut dyn RngCore,
    ) -> usize {
        let min_size = reference_points
            .iter()
            .map(|reference_point| reference_point.member_count)
            .min()
            .unwrap_or(0);
        let smallest: Vec<usize> = reference_points
            .iter()
            .enumerate()
            .filter_map(|(index, reference_point)| {
                (reference_point.member_count == min_size).then_some(index)
            })
            .collect();
        *smallest.choose(rng).unwrap()
    }

    /// Pick the next individual for a reference point: the closest potential when the point has
    /// no member yet, a random potential otherwise, or `None` when the point has no candidates.
    fn select_cluster_member(
        reference_point: &ReferencePoint,
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        if !reference_point.has_potential_member() {
            return None;
        }
        if reference_point.member_count == 0 {
            reference_point.find_closest_member()
        } else {
            reference_point.random_member(rng)
        }
    }

    /// Environmental selection of the next population from a combined one.
    fn selection(
        &mut self,
        mut population: Vec<Schedule>,
        mut reference_points: Vec<ReferencePoint>,
    ) -> Result<Vec<Schedule>, SError> {
        let target = self.options.population_size;
        let fronts = fast_non_dominated_sort(&population, |a, b| a.dominates(b));
        if fronts.is_empty() || fronts[0].is_empty() {
            return Err(SError::SearchDegenerate(
                "the non-dominated front is empty".to_string(),
            ));
        }

        // keep whole fronts until the target size is crossed
        let mut last = 0;
        let mut collected = 0;
        while collected < target && last < fronts.len() {
            collected += fronts[last].len();
            last += 1;
        }
        let fronts = &fronts[..last];

        let mut next: Vec<usize> = fronts[..fronts.len() - 1].concat();
        if next.len() == target || collected <= target {
            // the collected fronts fit exactly, or the whole population is needed
            if next.len() != target {
                next = fronts.concat();
            }
            return Ok(next
                .into_iter()
                .map(|member| population[member].clone())
                .collect());
        }

        let ideal_point = Self::translate_objectives(&mut population, fronts);
        let extreme_points = Self::find_extreme_points(&population, fronts);
        let intercepts = Self::construct_hyperplane(&population, fronts, &extreme_points);
        Self::normalize_objectives(&mut population, fronts, &intercepts, &ideal_point);
        Self::associate(&mut reference_points, &population, fronts);

        while next.len() < target && !reference_points.is_empty() {
            let niche =
                Self::find_niche_reference_point(&reference_points, self.state.rng.as_mut());
            match Self::select_cluster_member(&reference_points[niche], self.state.rng.as_mut()) {
                None => {
                    // no candidate is associated with this point at this evolution
                    reference_points.remove(niche);
                }
                Some(member) => {
                    reference_points[niche].add_member();
                    reference_points[niche].remove_potential_member(member);
                    next.push(member);
                }
            }
        }

        Ok(next
            .into_iter()
            .map(|member| population[member].clone())
            .collect())
    }

    /// Select the next population from a combined one against a fresh set of reference points.
    pub(crate) fn replacement(
        &mut self,
        population: Vec<Schedule>,
    ) -> Result<Vec<Schedule>, SError> {
        let reference_points = ReferencePoint::generate(CRITERIA_NUM, &self.obj_division);
        self.selection(population, reference_points)
    }

    /// One plain NSGA-III generation: pairwise crossover, mutation and reference-point
    /// replacement over the combined population.
    pub(crate) fn evolve_generation(&mut self) -> Result<(), SError> {
        let mut offspring =
            random_pair_crossing(&self.state.population, &self.options, self.state.rng.as_mut());
        mutate_offspring(&mut offspring, &self.options, self.state.rng.as_mut());

        let previous_first = self.state.population[0].clone();
        let mut combined = std::mem::take(&mut self.state.population);
        combined.extend(offspring);

        let next = self.replacement(combined)?;
        let candidate = if next[0].dominates(&previous_first) {
            next[0].clone()
        } else {
            previous_first
        };
        self.track_best(candidate);
        self.state.population = next;
        Ok(())
    }
}

impl Display for NsgaIii {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "NSGA III")
    }
}

impl Algorithm for NsgaIii {
    fn name(&self) -> &'static str {
        "NSGA-III"
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
        self.evolve_generation()
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use float_cmp::assert_approx_eq;

    use crate::algorithms::{Algorithm, SearchOptions};
    use crate::core::test_utils::{prototype_from, SINGLE_CLASS_CONFIG, STUCK_CONFIG, TWO_CLASS_CONFIG};
    use crate::core::{Configuration, CRITERIA_NUM};
    use crate::utils::get_rng;

    use super::{NsgaIii, ReferencePoint};

    #[test]
    /// One layer of six divisions on five objectives gives 210 simplex points.
    fn test_reference_point_generation() {
        let points = ReferencePoint::generate(CRITERIA_NUM, &[6]);
        assert_eq!(points.len(), 210);
        for point in &points {
            assert_approx_eq!(f64, point.position.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    /// Replacement halves a combined population back to the target size.
    fn test_replacement_size() {
        let configuration = Arc::new(Configuration::from_json(TWO_CLASS_CONFIG).unwrap());
        let options = SearchOptions {
            population_size: 10,
            seed: Some(21),
            parallel: false,
            ..SearchOptions::default()
        };
        let mut algorithm = NsgaIii::new(configuration, options).unwrap();
        let prototype = prototype_from(TWO_CLASS_CONFIG);
        let mut rng = get_rng(Some(22));
        let combined: Vec<_> = (0..20)
            .map(|_| prototype.new_from_prototype(&mut rng, None))
            .collect();
        let next = algorithm.replacement(combined).unwrap();
        assert_eq!(next.len(), 10);
    }

    #[test]
    /// A single satisfiable class converges to a perfect fitness.
    fn test_single_class_optimum() {
        let configuration = Arc::new(Configuration::from_json(SINGLE_CLASS_CONFIG).unwrap());
        let options = SearchOptions {
            population_size: 20,
            max_generations: 10,
            seed: Some(4),
            parallel: false,
            ..SearchOptions::default()
        };
        let mut algorithm = NsgaIii::new(configuration, options).unwrap();
        let best = algorithm.run().unwrap();
        assert_approx_eq!(f64, best.fitness(), 1.0);
    }

    #[test]
    /// A stagnating search reforms and raises the crossover probability.
    fn test_reform_raises_crossover_probability() {
        let configuration = Arc::new(Configuration::from_json(STUCK_CONFIG).unwrap());
        let options = SearchOptions {
            population_size: 10,
            max_generations: 12,
            max_repeat: 100,
            seed: Some(6),
            parallel: false,
            ..SearchOptions::default()
        };
        let mut algorithm = NsgaIii::new(configuration, options).unwrap();
        algorithm.run().unwrap();

        // the fitness is capped at 0.9, so after a few stagnant generations the crossover
        // probability must have been bumped at least once
        assert!(algorithm.options().crossover_probability >= 81.0);
    }
}
