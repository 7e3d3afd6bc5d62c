use std::fmt::{Display, Formatter};
use std::sync::Arc;

use rand::Rng;

use crate::algorithms::algorithm::{Algorithm, SearchOptions, SearchState};
use crate::algorithms::nsga2::NsgaII;
use crate::core::{Configuration, SError, Schedule};

/// Hybrid genetic algorithm and sperm swarm optimisation, layered over NSGA-II.
///
/// Implemented based on:
/// > Shehadeh, Hisham & Mustafa, Hossam & Tubishat, Mohammad. (2022). A Hybrid Genetic
/// > Algorithm and Sperm Swarm Optimization (HGASSO) for Multimodal Functions. International
/// > Journal of Applied Metaheuristic Computing. 13. doi: 10.4018/IJAMC.292507.
///
/// Every generation the swarm memories are refreshed (with a decline applied while the search
/// stagnates), the motile members get a velocity update mixing `log10` scaled random
/// coefficients, and the adjusted population then goes through the regular NSGA-II variation
/// and selection.
pub struct Hgasso {
    base: NsgaII,
    /// Score decline applied to stagnating personal bests.
    decline: f64,
    personal_best_score: Vec<f64>,
    personal_best: Vec<Vec<f64>>,
    global_best_score: f64,
    global_best: Vec<f64>,
    current_position: Vec<Vec<f64>>,
    velocity: Vec<Vec<f64>>,
    /// Whether a member position changed and its velocity must be refreshed.
    motility: Vec<bool>,
    chrom_len: usize,
}

impl Hgasso {
    /// Initialise the HGASSO algorithm for a timetable configuration.
    ///
    /// # Arguments
    ///
    /// * `configuration`: The parsed configuration.
    /// * `options`: The search options.
    ///
    /// returns: `Result<Hgasso, SError>`
    pub fn new(configuration: Arc<Configuration>, options: SearchOptions) -> Result<Self, SError> {
        Ok(Self {
            base: NsgaII::new(configuration, options)?,
            decline: 0.25,
            personal_best_score: vec![],
            personal_best: vec![],
            global_best_score: 0.0,
            global_best: vec![],
            current_position: vec![],
            velocity: vec![],
            motility: vec![],
            chrom_len: 0,
        })
    }

    /// Refresh the swarm memories against the current population, declining stagnating
    /// personal bests and re-materialising members whose stored position beats them.
    fn update_swarm(&mut self) {
        let size = self.base.state.population.len();
        let climax = 1.0 - self.decline;
        let repeat_ratio = self.base.state.repeat_ratio;

        for member in 0..size {
            let mut fitness = self.base.state.population[member].strict_fitness();
            if fitness < self.personal_best_score[member] {
                self.base.state.population[member].update_positions(
                    &mut self.current_position[member],
                    self.base.state.rng.as_mut(),
                );
                fitness = self.base.state.population[member].strict_fitness();
                self.motility[member] = true;
            }

            if fitness > self.personal_best_score[member] {
                self.personal_best_score[member] = fitness;
                self.base.state.population[member]
                    .extract_positions(&mut self.current_position[member]);
                self.personal_best[member] = self.current_position[member].clone();
            }
            if fitness > self.global_best_score {
                self.global_best_score = fitness;
                self.base.state.population[member]
                    .extract_positions(&mut self.current_position[member]);
                self.global_best = self.current_position[member].clone();
            }

            if repeat_ratio > self.personal_best_score[member] {
                self.personal_best_score[member] -= repeat_ratio * self.decline;
            }
            if repeat_ratio > climax
                && self.global_best_score > climax
                && member as f64 > size as f64 * self.global_best_score
            {
                self.base.state.population[member].update_positions(
                    &mut self.current_position[member],
                    self.base.state.rng.as_mut(),
                );
                self.motility[member] = true;
            }
        }
    }

    /// The sperm-swarm velocity rule over the motile members.
    fn update_velocities(&mut self) {
        if !self.motility.iter().any(|&moved| moved) {
            return;
        }

        for member in 0..self.velocity.len() {
            if !self.motility[member] {
                continue;
            }
            for j in 0..self.chrom_len {
                let rng = self.base.state.rng.as_mut();
                let inertia: f64 =
                    rng.gen::<f64>() * rng.gen_range(7.0..14.0_f64).log10() * self.velocity[member][j];
                let personal_pull = rng.gen_range(7.0..14.0_f64).log10()
                    * rng.gen_range(35.5..38.5_f64).log10()
                    * (self.personal_best[member][j] - self.current_position[member][j]);
                let global_pull = rng.gen_range(7.0..14.0_f64).log10()
                    * rng.gen_range(35.5..38.5_f64).log10()
                    * (self.global_best[j] - self.current_position[member][j]);
                self.velocity[member][j] = inertia + personal_pull + global_pull;
                self.current_position[member][j] += self.velocity[member][j];
            }
        }
    }
}

impl Display for Hgasso {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Hybrid Genetic Algorithm and Sperm Swarm Optimization (HGASSO)"
        )
    }
}

impl Algorithm for Hgasso {
    fn name(&self) -> &'static str {
        "HGASSO"
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
                self.velocity = vec![vec![0.0; self.chrom_len]; size];
                self.personal_best = vec![vec![0.0; self.chrom_len]; size];
                self.personal_best_score = vec![0.0; size];
                self.global_best = vec![0.0; self.chrom_len];
                self.motility = vec![false; size];
            }
            self.personal_best_score[member] = chromosome.strict_fitness();
            self.current_position[member] = positions;
            for j in 0..self.chrom_len {
                self.velocity[member][j] =
                    self.base.state.rng.gen_range(-0.6464..0.7157) / 3.0;
            }
            population.push(chromosome);
        }
        self.base.state.best = Some(population[0].clone());
        self.base.state.population = population;
        Ok(())
    }

    fn evolve(&mut self) -> Result<(), SError> {
        self.update_swarm();
        self.update_velocities();
        self.motility.iter_mut().for_each(|moved| *moved = false);
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

    use super::Hgasso;

    #[test]
    /// The sperm-swarm hybrid converges on a satisfiable single-class configuration.
    fn test_single_class_optimum() {
        let configuration = Arc::new(Configuration::from_json(SINGLE_CLASS_CONFIG).unwrap());
        let options = SearchOptions {
            population_size: 10,
            max_generations: 15,
            seed: Some(32),
            parallel: false,
            ..SearchOptions::default()
        };
        let mut algorithm = Hgasso::new(configuration, options).unwrap();
        let best = algorithm.run().unwrap();
        assert_approx_eq!(f64, best.strict_fitness(), 1.0);
    }
}
