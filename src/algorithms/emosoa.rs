use std::f64::consts::TAU;
use std::fmt::{Display, Formatter};
use std::sync::Arc;

use rand::Rng;

use crate::algorithms::algorithm::{Algorithm, SearchOptions, SearchState};
use crate::algorithms::nsga2::NsgaII;
use crate::core::{Configuration, SError, Schedule};

/// Evolutionary multi-objective seagull optimisation, layered over NSGA-II.
///
/// Implemented based on:
/// > Dhiman, Gaurav & Singh, Krishna & Slowik, Adam & Chang, Victor & Yildiz, Ali & Kaur,
/// > Amandeep & Garg, Meenakshi. (2021). EMoSOA: A New Evolutionary Multi-objective Seagull
/// > Optimization Algorithm for Global Optimization. International Journal of Machine Learning
/// > and Cybernetics. 12. doi: 10.1007/s13042-020-01189-1.
///
/// The flock spirals around the global best position with an attack radius that shrinks as the
/// generations pass, then the adjusted population goes through the regular NSGA-II variation
/// and selection.
pub struct Emosoa {
    base: NsgaII,
    best_score: Vec<f64>,
    global_best_score: f64,
    global_best: Vec<f64>,
    current_position: Vec<Vec<f64>>,
    chrom_len: usize,
}

impl Emosoa {
    /// Initialise the EMoSOA algorithm for a timetable configuration.
    ///
    /// # Arguments
    ///
    /// * `configuration`: The parsed configuration.
    /// * `options`: The search options.
    ///
    /// returns: `Result<Emosoa, SError>`
    pub fn new(configuration: Arc<Configuration>, options: SearchOptions) -> Result<Self, SError> {
        Ok(Self {
            base: NsgaII::new(configuration, options)?,
            best_score: vec![],
            global_best_score: 0.0,
            global_best: vec![],
            current_position: vec![],
            chrom_len: 0,
        })
    }

    /// Refresh the per-member and global best memories against the current population.
    fn update_memories(&mut self) {
        let size = self.base.state.population.len();
        let climax = 0.9;
        let repeat_ratio = self.base.state.repeat_ratio;

        for member in 0..size {
            let mut fitness = self.base.state.population[member].strict_fitness();
            if fitness < self.best_score[member] {
                self.base.state.population[member].update_positions(
                    &mut self.current_position[member],
                    self.base.state.rng.as_mut(),
                );
                fitness = self.base.state.population[member].strict_fitness();
            }

            if fitness > self.best_score[member] {
                self.best_score[member] = fitness;
                self.base.state.population[member]
                    .extract_positions(&mut self.current_position[member]);
            }
            if fitness > self.global_best_score {
                self.global_best_score = fitness;
                self.base.state.population[member]
                    .extract_positions(&mut self.current_position[member]);
                self.global_best = self.current_position[member].clone();
            }

            if repeat_ratio > climax
                && self.global_best_score > climax
                && member as f64 > size as f64 * repeat_ratio
            {
                self.base.state.population[member].update_positions(
                    &mut self.current_position[member],
                    self.base.state.rng.as_mut(),
                );
            }
        }
    }

    /// The attack spiral around the global best, with the migration coefficient decaying
    /// linearly over the run.
    fn exploitation(&mut self) {
        let max_generations = self.base.options.max_generations as f64;
        let attack = 2.0 - self.base.state.generation as f64 * (2.0 / max_generations);

        for member in 0..self.current_position.len() {
            for j in 0..self.chrom_len {
                let rng = self.base.state.rng.as_mut();
                let balance = (2.0 * attack * attack) * rng.gen::<f64>();
                let collision = attack * self.current_position[member][j];
                let migration =
                    balance * (self.global_best[j] - self.current_position[member][j]);
                let distance = (collision + migration).abs();

                let theta = self.base.state.rng.gen_range(0.0..TAU);
                let radius = theta.exp();
                let x = radius * theta.cos();
                let y = radius * theta.sin();
                let z = radius * theta;
                self.current_position[member][j] = distance * x * y * z + self.global_best[j];
            }
        }
    }
}

impl Display for Emosoa {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Evolutionary multi-objective seagull optimization algorithm (EMoSOA)"
        )
    }
}

impl Algorithm for Emosoa {
    fn name(&self) -> &'static str {
        "EMoSOA"
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

    fn fitness_of(&self, schedule: &Schedule) -> f64 {
        schedule.strict_fitness()
    }

    fn stagnation_limit(&self) -> f64 {
        self.base.options.max_repeat as f64 / 100.0
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
                self.current_position = vec![vec![0.0; self.chrom_len]; size];
                self.global_best = vec![0.0; self.chrom_len];
                self.best_score = vec![0.0; size];
            }
            self.best_score[member] = chromosome.strict_fitness();
            self.current_position[member] = positions;
            population.push(chromosome);
        }
        self.base.state.best = Some(population[0].clone());
        self.base.state.population = population;
        Ok(())
    }

    fn evolve(&mut self) -> Result<(), SError> {
        self.update_memories();
        self.exploitation();
        self.base.evolve()
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use float_cmp::assert_approx_eq;

    use crate::algorithms::{Algorithm, SearchOptions};
    use crate::core::test_utils::SINGLE_CLASS_CONFIG;
    use crate::core::Configuration;

    use super::Emosoa;

    #[test]
    /// The seagull flock converges on a satisfiable single-class configuration.
    fn test_single_class_optimum() {
        let configuration = Arc::new(Configuration::from_json(SINGLE_CLASS_CONFIG).unwrap());
        let options = SearchOptions {
            population_size: 10,
            max_generations: 15,
            seed: Some(34),
            parallel: false,
            ..SearchOptions::default()
        };
        let mut algorithm = Emosoa::new(configuration, options).unwrap();
        let best = algorithm.run().unwrap();
        assert_approx_eq!(f64, best.strict_fitness(), 1.0);
    }
}
