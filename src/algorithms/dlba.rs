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

/// Bat algorithm with a differential operator and Lévy flight trajectories, layered over the
/// NSGA-III replacement.
///
/// Implemented based on:
/// > Xie, Jian & Chen, Huan. (2013). A Novel Bat Algorithm Based on Differential Operator and
/// > Lévy Flights Trajectory. Computational Intelligence and Neuroscience. 2013. 453812.
/// > doi: 10.1155/2013/453812.
///
/// Bats carry a frequency, a velocity, a pulse rate and a loudness; the swarm first drifts with
/// a Lévy flight toward the best position, then each bat echolocates around it. An accepted
/// improvement decays the loudness by `alpha` and sharpens the pulse rate.
pub struct Dlba {
    base: NsgaIii,
    levy: LevyFlights,
    /// Loudness decay factor.
    alpha: f64,
    /// Discovery probability raised by reform instead of the mutation rate.
    pa: f64,
    min_value: f64,
    max_values: Vec<f64>,
    frequency: Vec<f64>,
    loudness: Vec<f64>,
    rate: Vec<f64>,
    position: Vec<Vec<f64>>,
    velocity: Vec<Vec<f64>>,
    global_best: Option<Vec<f64>>,
}

impl Dlba {
    /// Initialise the DLBA algorithm for a timetable configuration.
    ///
    /// # Arguments
    ///
    /// * `configuration`: The parsed configuration.
    /// * `options`: The search options.
    ///
    /// returns: `Result<Dlba, SError>`
    pub fn new(configuration: Arc<Configuration>, options: SearchOptions) -> Result<Self, SError> {
        Ok(Self {
            base: NsgaIii::new(configuration, options)?,
            levy: LevyFlights::new(0),
            alpha: 0.9,
            pa: 0.25,
            min_value: 0.0,
            max_values: vec![],
            frequency: vec![],
            loudness: vec![],
            rate: vec![],
            position: vec![],
            velocity: vec![],
            global_best: None,
        })
    }

    fn clamp_coordinate(&self, value: f64, dimension: usize) -> (f64, bool) {
        if value > self.max_values[dimension] {
            (self.max_values[dimension], true)
        } else if value < self.min_value {
            (self.min_value, true)
        } else {
            (value, false)
        }
    }

    /// The echolocation pass: frequencies are refreshed from the dimension bounds, velocities
    /// chase the best position and loud bats probe a narrow band around it.
    fn update_bat_positions(&mut self, population: &mut [Schedule]) {
        let levy = self.levy;
        let chrom_len = levy.chrom_len();
        let size = population.len();
        let generation = self.base.state.generation as f64;
        let mean_loudness = if self.loudness.is_empty() {
            0.0
        } else {
            self.loudness.iter().sum::<f64>() / self.loudness.len() as f64
        };

        let best_position = match self.global_best.as_ref() {
            Some(best) => best.clone(),
            None => return,
        };
        let mut global_best = self.base.prototype.empty_from_prototype(None);
        {
            let mut buffer = best_position.clone();
            global_best.update_positions(&mut buffer, self.base.state.rng.as_mut());
        }
        let mut local_best = self
            .base
            .prototype
            .new_from_prototype(self.base.state.rng.as_mut(), None);

        for member in 0..size {
            let beta: f64 = self.base.state.rng.gen();
            let pulse: f64 = self.base.state.rng.gen();
            let draw: f64 = self.base.state.rng.gen_range(-1.0..1.0);

            for j in 0..chrom_len {
                self.frequency[j] =
                    ((self.max_values[j] - self.min_value) * generation / draw + self.min_value)
                        * beta;
                self.velocity[member][j] +=
                    (self.position[member][j] - best_position[j]) * self.frequency[j];

                if pulse > self.rate[member] {
                    let moved = self.position[member][j] + self.velocity[member][j];
                    let (clamped, saturated) = self.clamp_coordinate(moved, j);
                    self.position[member][j] = clamped;
                    if saturated {
                        self.velocity[member][j] = self.min_value;
                    }
                }
            }

            let mut probe = self.base.prototype.empty_from_prototype(None);
            let mut buffer = self.position[member].clone();
            probe.update_positions(&mut buffer, self.base.state.rng.as_mut());
            if probe.dominates(&local_best) {
                local_best = probe;
            }
        }

        for member in 0..size {
            let echo: f64 = self.base.state.rng.gen();
            if echo < self.loudness[member] {
                let draw: f64 = self.base.state.rng.gen_range(-1.0..1.0);
                let mut temporary = self.position[member].clone();
                for (j, value) in temporary.iter_mut().enumerate() {
                    let (clamped, saturated) =
                        self.clamp_coordinate(best_position[j] + draw * mean_loudness, j);
                    *value = clamped;
                    if saturated {
                        self.velocity[member][j] = self.min_value;
                    }
                }

                if global_best.dominates(&local_best) {
                    self.position[member] = temporary;
                    self.rate[member] *= (generation / draw).powi(3);
                    self.loudness[member] *= self.alpha;
                }
            }

            self.position[member] = levy.optimum(
                &self.position[member],
                &mut population[member],
                self.base.state.rng.as_mut(),
            );
        }
    }
}

impl Display for Dlba {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Bat algorithm with differential operator and Levy flights trajectory (DLBA)"
        )
    }
}

impl Algorithm for Dlba {
    fn name(&self) -> &'static str {
        "DLBA"
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
        let mut bounds = vec![];
        let _ = self.base.prototype.empty_from_prototype(Some(&mut bounds));
        self.max_values = bounds;

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
                self.frequency = vec![0.0; chrom_len];
                self.loudness = vec![0.0; size];
                self.rate = vec![0.0; size];
                self.position = vec![vec![0.0; chrom_len]; size];
                self.velocity = vec![vec![0.0; chrom_len]; size];
            }
            self.rate[member] = self.base.state.rng.gen();
            self.loudness[member] = self.base.state.rng.gen::<f64>() + 1.0;
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
        let best = self.levy.update_velocities(
            &mut combined[..swarm],
            &mut self.position,
            self.global_best.take(),
            self.base.state.rng.as_mut(),
        );
        self.global_best = Some(best);
        self.update_bat_positions(&mut combined[..swarm]);

        for member in 0..swarm {
            let mut chromosome = self.base.prototype.empty_from_prototype(None);
            chromosome
                .update_positions(&mut self.position[member], self.base.state.rng.as_mut());
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

    use super::Dlba;

    #[test]
    /// The bat search converges on a satisfiable single-class configuration.
    fn test_single_class_optimum() {
        let configuration = Arc::new(Configuration::from_json(SINGLE_CLASS_CONFIG).unwrap());
        let options = SearchOptions {
            population_size: 10,
            max_generations: 15,
            seed: Some(28),
            parallel: false,
            ..SearchOptions::default()
        };
        let mut algorithm = Dlba::new(configuration, options).unwrap();
        let best = algorithm.run().unwrap();
        assert_approx_eq!(f64, best.fitness(), 1.0);
    }
}
