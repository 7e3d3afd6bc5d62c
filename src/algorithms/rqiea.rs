use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use rand::Rng;

use crate::algorithms::algorithm::{
    mutate_offspring, random_pair_crossing, Algorithm, SearchOptions, SearchState,
};
use crate::algorithms::nsga3::NsgaIii;
use crate::core::{Configuration, SError, Schedule};

/// Real-observation quantum-inspired evolutionary algorithm, layered over the NSGA-III
/// replacement.
///
/// Implemented based on:
/// > Zhang, G.X., Rong, H.N., Real-observation quantum-inspired evolutionary algorithm for a
/// > class of numerical optimization problems. In: Lecture Notes in Computer Science,
/// > vol. 4490, pp. 989-996 (2007).
///
/// Every member carries one qubit amplitude pair per continuous dimension. Observation squares
/// one of the amplitudes and scales it into the dimension bound; once the search stagnates, the
/// qubits are rotated toward the best member's angles by a lookup table and random segments are
/// recombined between members.
pub struct Rqiea {
    base: NsgaIii,
    /// Qubit amplitude pairs, flattened as `[alpha, beta]` per (member, dimension).
    quantum: Vec<f64>,
    /// The observed classical positions, flattened per member.
    observed: Vec<f64>,
    /// Per-dimension `(lower, upper)` bounds.
    bounds: Vec<(f64, f64)>,
    chrom_len: usize,
    /// Probability of re-materialising a member on observation.
    catastrophe: f64,
    /// Stagnation cap beyond which the quantum phases kick in.
    quantum_stagnation: usize,
    best_position: Vec<f64>,
    best_quantum: Vec<(f64, f64)>,
}

impl Rqiea {
    /// Initialise the rQIEA algorithm for a timetable configuration.
    ///
    /// # Arguments
    ///
    /// * `configuration`: The parsed configuration.
    /// * `options`: The search options.
    ///
    /// returns: `Result<Rqiea, SError>`
    pub fn new(configuration: Arc<Configuration>, options: SearchOptions) -> Result<Self, SError> {
        let catastrophe = options.mutation_probability;
        let quantum_stagnation = 15.min(options.max_generations / 2).max(1);
        Ok(Self {
            base: NsgaIii::new(configuration, options)?,
            quantum: vec![],
            observed: vec![],
            bounds: vec![],
            chrom_len: 0,
            catastrophe,
            quantum_stagnation,
            best_position: vec![],
            best_quantum: vec![],
        })
    }

    fn sign(value: f64) -> f64 {
        if value > 0.0 {
            1.0
        } else if value < 0.0 {
            -1.0
        } else {
            0.0
        }
    }

    /// The rotation direction lookup table comparing the current qubit angle with the best
    /// member's one.
    fn lookup(
        alpha: f64,
        beta: f64,
        alpha_best: f64,
        beta_best: f64,
        rng: &mut dyn rand::RngCore,
    ) -> f64 {
        const EPS: f64 = 1e-5;
        let angle = (beta / (alpha + EPS)).atan();
        let angle_best = (beta_best / (alpha_best + EPS)).atan();

        if angle_best.abs() < EPS
            || angle.abs() < EPS
            || (angle_best - FRAC_PI_2).abs() < EPS
            || (angle - FRAC_PI_2).abs() < EPS
            || (angle_best + FRAC_PI_2).abs() < EPS
            || (angle + FRAC_PI_2).abs() < EPS
        {
            return if rng.gen_range(0..2) == 0 { 1.0 } else { -1.0 };
        }

        if angle_best > 0.0 && angle > 0.0 {
            return if angle_best >= angle { 1.0 } else { -1.0 };
        }
        if angle_best > 0.0 && angle < 0.0 {
            return Self::sign(alpha * alpha_best);
        }
        if angle_best < 0.0 && angle > 0.0 {
            return -Self::sign(alpha * alpha_best);
        }
        if angle_best < 0.0 && angle < 0.0 {
            return if angle_best >= angle { 1.0 } else { -1.0 };
        }
        Self::sign(angle_best)
    }

    /// Observe the quantum population: one squared amplitude per dimension is scaled into the
    /// bound and either adopted by the chromosome or, on a catastrophe draw or an unfit member,
    /// materialised into a fresh one.
    fn observe(&mut self, population: &mut [Schedule]) {
        let size = population.len();
        for member in 0..size {
            for j in 0..self.chrom_len {
                let pij = member * self.chrom_len + j;
                let qij = 2 * pij;
                let collapse: f64 = self.base.state.rng.gen();
                let amplitude = if collapse <= 0.5 {
                    self.quantum[qij]
                } else {
                    self.quantum[qij + 1]
                };
                let (lower, upper) = self.bounds[j];
                self.observed[pij] = amplitude * amplitude * (upper - lower) + lower;
            }

            let start = member * self.chrom_len;
            let mut row = self.observed[start..start + self.chrom_len].to_vec();
            let doomed = population[member].fitness() <= 0.0
                || (self.base.state.rng.gen_range(0..100) as f64) <= self.catastrophe;
            if doomed {
                let mut chromosome = self.base.prototype.empty_from_prototype(None);
                chromosome.update_positions(&mut row, self.base.state.rng.as_mut());
                population[member] = chromosome;
            } else {
                population[member].extract_positions(&mut row);
            }
            self.observed[start..start + self.chrom_len].copy_from_slice(&row);
        }
    }

    /// Remember the dominating member, its observed position and its qubits.
    fn store_best(&mut self, population: &[Schedule]) {
        let mut best_member = 0;
        for member in 1..population.len() {
            if population[member].dominates(&population[best_member]) {
                best_member = member;
            }
        }

        if self.base.state.best.is_none() || best_member > 0 {
            self.track_best(population[best_member].clone());

            let start = best_member * self.chrom_len;
            self.best_position
                .copy_from_slice(&self.observed[start..start + self.chrom_len]);
            for j in 0..self.chrom_len {
                let qij = 2 * (start + j);
                self.best_quantum[j] = (self.quantum[qij], self.quantum[qij + 1]);
            }
        }
    }

    /// Rotate every qubit toward the best member's angles.
    fn update_quantum(&mut self) {
        let size = self.base.options.population_size;
        let generation = self.base.state.generation;
        let gain = PI / (100 + generation % 100) as f64;

        for member in 0..size {
            for j in 0..self.chrom_len {
                let qij = 2 * (member * self.chrom_len + j);
                let (alpha_best, beta_best) = self.best_quantum[j];
                let direction = Self::lookup(
                    self.quantum[qij],
                    self.quantum[qij + 1],
                    alpha_best,
                    beta_best,
                    self.base.state.rng.as_mut(),
                );
                let theta = gain * direction;

                let alpha = self.quantum[qij];
                let beta = self.quantum[qij + 1];
                self.quantum[qij] = alpha * theta.cos() - beta * theta.sin();
                self.quantum[qij + 1] = alpha * theta.sin() + beta * theta.cos();
            }
        }
    }

    /// Swap a random qubit segment between two random members.
    fn recombine(&mut self) {
        let size = self.base.options.population_size;
        if size < 2 || self.chrom_len == 0 {
            return;
        }

        let first = self.base.state.rng.gen_range(0..size);
        let mut second = self.base.state.rng.gen_range(0..size);
        while first == second {
            second = self.base.state.rng.gen_range(0..size);
        }

        let from = self.base.state.rng.gen_range(0..self.chrom_len);
        let to = self.base.state.rng.gen_range(from..self.chrom_len);

        for j in from..=to {
            let q1 = 2 * (first * self.chrom_len + j);
            let q2 = 2 * (second * self.chrom_len + j);
            self.quantum.swap(q1, q2);
            self.quantum.swap(q1 + 1, q2 + 1);
        }
    }
}

impl Display for Rqiea {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Real observation QIEA (rQIEA)")
    }
}

impl Algorithm for Rqiea {
    fn name(&self) -> &'static str {
        "rQIEA"
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
        let mut bounds = vec![];
        let mut population = Vec::with_capacity(size);
        for member in 0..size {
            if member == 0 {
                population.push(self.base.prototype.empty_from_prototype(Some(&mut bounds)));
                self.chrom_len = bounds.len();
                self.quantum = vec![0.0; size * self.chrom_len * 2];
                self.observed = vec![0.0; size * self.chrom_len];
                self.bounds = bounds.iter().map(|&upper| (0.0, upper)).collect();
                self.best_position = vec![0.0; self.chrom_len];
                self.best_quantum = vec![(0.0, 0.0); self.chrom_len];
            } else {
                population.push(self.base.prototype.empty_from_prototype(None));
            }

            for j in 0..self.chrom_len {
                let qij = (member * self.chrom_len + j) * 2;
                let alpha: f64 = 2.0 * self.base.state.rng.gen::<f64>() - 1.0;
                let direction = if self.base.state.rng.gen_range(0..2) == 0 {
                    1.0
                } else {
                    -1.0
                };
                self.quantum[qij] = alpha;
                self.quantum[qij + 1] = (1.0 - alpha * alpha).sqrt() * direction;
            }
        }

        self.observe(&mut population);
        self.store_best(&population);
        if self.base.state.best.is_none() {
            self.base.state.best = Some(population[0].clone());
        }
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

        let mut next = self.base.replacement(combined)?;
        let candidate = if next[0].dominates(&previous_first) {
            next[0].clone()
        } else {
            previous_first
        };
        self.track_best(candidate);

        // once thoroughly stuck, fall back to the quantum machinery every fourth generation
        if self.base.state.best_not_enhance >= self.quantum_stagnation
            && self.base.state.generation % 4 == 0
        {
            let size = self.base.options.population_size.min(next.len());
            for member in 0..size {
                let start = member * self.chrom_len;
                let mut row = vec![0.0; self.chrom_len];
                next[member].extract_positions(&mut row);
                self.observed[start..start + self.chrom_len].copy_from_slice(&row);
            }
            self.observe(&mut next[..size]);
            self.store_best(&next[..size]);
            self.update_quantum();
            self.recombine();
        }

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
    use crate::utils::get_rng;

    use super::Rqiea;

    #[test]
    /// Observation scales squared amplitudes into the dimension bounds.
    fn test_observation_in_bounds() {
        let configuration = Arc::new(Configuration::from_json(SINGLE_CLASS_CONFIG).unwrap());
        let options = SearchOptions {
            population_size: 6,
            seed: Some(60),
            parallel: false,
            ..SearchOptions::default()
        };
        let mut algorithm = Rqiea::new(configuration, options).unwrap();
        algorithm.initialise().unwrap();

        for (j, &value) in algorithm.observed.iter().enumerate() {
            let (lower, upper) = algorithm.bounds[j % algorithm.chrom_len];
            assert!(value >= lower && value <= upper + 1e-9);
        }
    }

    #[test]
    /// The lookup table always returns a direction of unit magnitude or zero.
    fn test_lookup_direction() {
        let mut rng = get_rng(Some(62));
        for _ in 0..100 {
            let direction = Rqiea::lookup(0.3, 0.7, -0.5, 0.4, rng.as_mut());
            assert!(direction == 1.0 || direction == -1.0 || direction == 0.0);
        }
    }

    #[test]
    /// The quantum search converges on a satisfiable single-class configuration.
    fn test_single_class_optimum() {
        let configuration = Arc::new(Configuration::from_json(SINGLE_CLASS_CONFIG).unwrap());
        let options = SearchOptions {
            population_size: 10,
            max_generations: 20,
            seed: Some(64),
            parallel: false,
            ..SearchOptions::default()
        };
        let mut algorithm = Rqiea::new(configuration, options).unwrap();
        let best = algorithm.run().unwrap();
        assert_approx_eq!(f64, best.fitness(), 1.0);
    }
}
