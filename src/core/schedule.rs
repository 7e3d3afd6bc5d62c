use std::sync::Arc;

use rand::{Rng, RngCore};

use crate::core::config::Configuration;
use crate::core::criteria::{self, CRITERIA_NUM};
use crate::core::error::SError;
use crate::core::reservation::{Reservation, DAYS_NUM, DAY_HOURS};

/// A timetable chromosome: the assignment of every course class to a starting
/// `(day, time, room)` slot, together with the criterion flags and the fitness values derived
/// from it.
///
/// The encoding keeps two synchronised views of the assignment:
///
/// * `slots` is the flat time-space grid (`DAYS_NUM * DAY_HOURS * number_of_rooms` cells); each
///   cell holds the multiset of class ids occupying that hour in that room,
/// * `class_table` maps each class (in configuration order) to the canonical index of its
///   starting cell.
///
/// A class of duration `d` starting at index `i` occupies the cells `i..i + d` and no others.
/// Class iteration always follows the configuration order so that two chromosomes built from
/// the same prototype stay index-aligned, which the crossover operators rely on.
#[derive(Debug, Clone)]
pub struct Schedule {
    configuration: Arc<Configuration>,
    /// The time-space grid; one entry per hour-room cell.
    slots: Vec<Vec<usize>>,
    /// The starting slot index of each class, in configuration order. `None` until the class is
    /// placed.
    class_table: Vec<Option<usize>>,
    /// One satisfaction flag per (class, criterion) pair.
    criteria: Vec<bool>,
    /// Per-criterion violation counts, used for Pareto domination.
    objectives: Vec<f64>,
    /// Working copy of the objectives used by the reference-point normalisation.
    converted_objectives: Vec<f64>,
    /// Scalar fitness where passed criteria add one and violations cost their weight.
    fitness: f64,
    /// Scalar fitness where any hard violation resets the running score to zero and soft
    /// violations halve it.
    strict_fitness: f64,
    diversity: f64,
    rank: usize,
}

impl Schedule {
    /// Build the prototype chromosome for a configuration. The prototype is empty; populations
    /// are seeded by cloning it through [`Schedule::new_from_prototype`]. This returns an error
    /// when the configuration cannot produce a valid timetable: a class duration outside
    /// `1..DAY_HOURS`, classes but no rooms, or a class whose seat requirement exceeds every
    /// room.
    ///
    /// # Arguments
    ///
    /// * `configuration`: The parsed configuration.
    ///
    /// returns: `Result<Schedule, SError>`
    pub fn from_configuration(configuration: Arc<Configuration>) -> Result<Self, SError> {
        let max_seats = configuration.rooms().iter().map(|r| r.seats()).max();
        for class in configuration.course_classes() {
            if class.duration() == 0 || class.duration() >= DAY_HOURS {
                return Err(SError::DomainInvariant(format!(
                    "class {} has a duration of {} hours which does not fit a {} hour day",
                    class.id(),
                    class.duration(),
                    DAY_HOURS
                )));
            }
            match max_seats {
                None => {
                    return Err(SError::DomainInvariant(
                        "the configuration has classes but no rooms".to_string(),
                    ))
                }
                Some(seats) if class.seats_required() > seats => {
                    return Err(SError::DomainInvariant(format!(
                        "class {} requires {} seats but the largest room has {}",
                        class.id(),
                        class.seats_required(),
                        seats
                    )))
                }
                _ => {}
            }
        }
        Ok(Self::setup(configuration))
    }

    /// An empty chromosome sharing the prototype setup.
    fn setup(configuration: Arc<Configuration>) -> Self {
        let slots_length = DAYS_NUM * DAY_HOURS * configuration.number_of_rooms();
        let class_count = configuration.number_of_course_classes();
        Self {
            slots: vec![vec![]; slots_length],
            class_table: vec![None; class_count],
            criteria: vec![false; class_count * CRITERIA_NUM],
            objectives: vec![],
            converted_objectives: vec![],
            fitness: 0.0,
            strict_fitness: 0.0,
            diversity: 0.0,
            rank: 0,
            configuration,
        }
    }

    /// Make a new chromosome with the same setup and a uniformly random reservation for every
    /// class, then evaluate it. When `positions` is given, the `(day, room, time)` triple of
    /// every class is appended to it in configuration order, for the continuous-position
    /// optimisers.
    ///
    /// # Arguments
    ///
    /// * `rng`: The random number generator.
    /// * `positions`: Optional buffer collecting the continuous view of the assignment.
    ///
    /// returns: `Schedule`
    pub fn new_from_prototype(
        &self,
        rng: &mut dyn RngCore,
        mut positions: Option<&mut Vec<f64>>,
    ) -> Schedule {
        let mut chromosome = Self::setup(self.configuration.clone());
        let number_of_rooms = self.configuration.number_of_rooms();

        for (class_id, class) in self.configuration.course_classes().iter().enumerate() {
            let reservation = Reservation::random(number_of_rooms, class.duration(), rng);
            if let Some(buffer) = positions.as_deref_mut() {
                buffer.push(reservation.day as f64);
                buffer.push(reservation.room as f64);
                buffer.push(reservation.time as f64);
            }
            chromosome.place(class_id, reservation.index(number_of_rooms));
        }
        chromosome.calculate_fitness();
        chromosome
    }

    /// Make a new unplaced chromosome with the same setup. When `bounds` is given, the upper
    /// bound of each continuous dimension (`day`, `room`, `time` per class) is appended to it.
    ///
    /// # Arguments
    ///
    /// * `bounds`: Optional buffer collecting the per-dimension upper bounds.
    ///
    /// returns: `Schedule`
    pub fn empty_from_prototype(&self, bounds: Option<&mut Vec<f64>>) -> Schedule {
        let chromosome = Self::setup(self.configuration.clone());
        if let Some(buffer) = bounds {
            let number_of_rooms = self.configuration.number_of_rooms();
            for class in self.configuration.course_classes() {
                buffer.push((DAYS_NUM - 1) as f64);
                buffer.push(number_of_rooms.saturating_sub(1) as f64);
                buffer.push((DAY_HOURS - 1 - class.duration()) as f64);
            }
        }
        chromosome
    }

    /// Write a class into its slot cells and record its starting index.
    fn place(&mut self, class_id: usize, index: usize) {
        let duration = self.configuration.course_classes()[class_id].duration();
        for cell in &mut self.slots[index..index + duration] {
            cell.push(class_id);
        }
        self.class_table[class_id] = Some(index);
    }

    /// Multi-point crossover with another chromosome. With probability
    /// `1 - probability / 100` this returns a plain copy of `self`; otherwise `number_of_points`
    /// distinct class indices are drawn, a fair coin picks the starting parent and the source
    /// parent is toggled at every crossover point while the classes are walked in configuration
    /// order. The child is evaluated before it is returned.
    ///
    /// # Arguments
    ///
    /// * `parent`: The second parent.
    /// * `number_of_points`: The number of crossover points.
    /// * `probability`: The crossover probability in percent.
    /// * `rng`: The random number generator.
    ///
    /// returns: `Schedule`
    pub fn crossover(
        &self,
        parent: &Schedule,
        number_of_points: usize,
        probability: f64,
        rng: &mut dyn RngCore,
    ) -> Schedule {
        if rng.gen_range(0..100) as f64 > probability {
            return self.clone();
        }

        let mut child = Self::setup(self.configuration.clone());
        let size = self.class_table.len();
        if size == 0 {
            child.calculate_fitness();
            return child;
        }

        // draw distinct crossover points by rejection
        let mut crossover_points = vec![false; size];
        for _ in 0..number_of_points.min(size) {
            loop {
                let p = rng.gen_range(0..size);
                if !crossover_points[p] {
                    crossover_points[p] = true;
                    break;
                }
            }
        }

        let mut take_from_self = rng.gen_range(0..2) == 0;
        for class_id in 0..size {
            let source = if take_from_self { self } else { parent };
            if let Some(index) = source.class_table[class_id] {
                child.place(class_id, index);
            }
            if crossover_points[class_id] {
                take_from_self = !take_from_self;
            }
        }

        child.calculate_fitness();
        child
    }

    /// Differential crossover used by the archive-based optimisers. One random class index
    /// `jrand` is always recombined; every other class keeps the parent gene when the percent
    /// draw exceeds `probability`. Recombined genes are built axis-wise from three archive
    /// members as `r3 + eta_cross * (r1 - r2)`, truncated and clamped to the grid.
    ///
    /// # Arguments
    ///
    /// * `parent`: The parent providing the inherited genes.
    /// * `r1`, `r2`, `r3`: The archive members driving the differential blend.
    /// * `eta_cross`: The blend scale factor.
    /// * `probability`: The crossover probability in percent.
    /// * `rng`: The random number generator.
    ///
    /// returns: `Schedule`
    pub fn differential_crossover(
        &self,
        parent: &Schedule,
        r1: &Schedule,
        r2: &Schedule,
        r3: &Schedule,
        eta_cross: f64,
        probability: f64,
        rng: &mut dyn RngCore,
    ) -> Schedule {
        let mut child = Self::setup(self.configuration.clone());
        let size = self.class_table.len();
        if size == 0 {
            child.calculate_fitness();
            return child;
        }

        let number_of_rooms = self.configuration.number_of_rooms();
        let jrand = rng.gen_range(0..size);

        for class_id in 0..size {
            if rng.gen_range(0..100) as f64 > probability && class_id != jrand {
                if let Some(index) = parent.class_table[class_id] {
                    child.place(class_id, index);
                }
                continue;
            }

            let duration = self.configuration.course_classes()[class_id].duration();
            let reservation1 = Self::parse_gene(r1, class_id, number_of_rooms);
            let reservation2 = Self::parse_gene(r2, class_id, number_of_rooms);
            let reservation3 = Self::parse_gene(r3, class_id, number_of_rooms);

            let blend = |base: f64, a: f64, b: f64, max: f64| -> usize {
                ((base + eta_cross * (a - b)) as i64).clamp(0, max as i64) as usize
            };
            let day = blend(
                reservation3.day as f64,
                reservation1.day as f64,
                reservation2.day as f64,
                (DAYS_NUM - 1) as f64,
            );
            let room = blend(
                reservation3.room as f64,
                reservation1.room as f64,
                reservation2.room as f64,
                (number_of_rooms - 1) as f64,
            );
            let time = blend(
                reservation3.time as f64,
                reservation1.time as f64,
                reservation2.time as f64,
                (DAY_HOURS - 1 - duration) as f64,
            );

            let reservation = Reservation::new(day, time, room);
            child.place(class_id, reservation.index(number_of_rooms));
        }

        child.calculate_fitness();
        child
    }

    fn parse_gene(chromosome: &Schedule, class_id: usize, number_of_rooms: usize) -> Reservation {
        let index = chromosome.class_table[class_id].unwrap_or(0);
        Reservation::parse(index, number_of_rooms)
    }

    /// Mutate the chromosome in place: with probability `probability / 100`, relocate
    /// `mutation_size` randomly chosen classes to fresh random reservations and re-evaluate.
    ///
    /// # Arguments
    ///
    /// * `mutation_size`: The number of random relocations.
    /// * `probability`: The mutation probability in percent.
    /// * `rng`: The random number generator.
    pub fn mutate(&mut self, mutation_size: usize, probability: f64, rng: &mut dyn RngCore) {
        if rng.gen_range(0..100) as f64 > probability {
            return;
        }
        let size = self.class_table.len();
        if size == 0 {
            return;
        }

        for _ in 0..mutation_size {
            let class_id = rng.gen_range(0..size);
            let current = self.class_table[class_id];
            self.repair(class_id, current, None, rng);
        }
        self.calculate_fitness();
    }

    /// Move a class to a new reservation, keeping `slots` and `class_table` consistent. All the
    /// occurrences of the class are removed from its previous cells (the operation is
    /// idempotent), the target cells gain the class and the class table points at the new index.
    /// A missing or out-of-bounds target is replaced with a uniformly random in-bounds one.
    ///
    /// # Arguments
    ///
    /// * `class_id`: The class to relocate.
    /// * `current_index`: The starting slot index currently held by the class, if any.
    /// * `target`: The destination reservation, or `None` to draw one.
    /// * `rng`: The random number generator.
    pub fn repair(
        &mut self,
        class_id: usize,
        current_index: Option<usize>,
        target: Option<Reservation>,
        rng: &mut dyn RngCore,
    ) {
        let number_of_rooms = self.configuration.number_of_rooms();
        let duration = self.configuration.course_classes()[class_id].duration();

        if let Some(index) = current_index {
            for cell in &mut self.slots[index..index + duration] {
                cell.retain(|&occupant| occupant != class_id);
            }
        }

        let reservation = target
            .filter(|r| r.is_in_bounds(number_of_rooms, duration))
            .unwrap_or_else(|| Reservation::random(number_of_rooms, duration, rng));

        self.place(class_id, reservation.index(number_of_rooms));
    }

    /// Evaluate the five criteria of every scheduled class and refresh both fitness scalars and
    /// the objective vector in a single pass.
    ///
    /// The strict scalar accumulates one point per passed criterion, is reset to zero by any
    /// hard violation (room, professor or group overlap) and halved by a soft one (seats or
    /// laboratory). The weighted scalar adds one point per pass and the criterion weight per
    /// violation, while `objectives[k]` counts violations (doubled for hard criteria).
    pub fn calculate_fitness(&mut self) {
        let configuration = self.configuration.clone();
        let number_of_rooms = configuration.number_of_rooms();
        let weights = configuration.weights().values();
        let day_size = DAY_HOURS * number_of_rooms;

        self.objectives = vec![0.0; CRITERIA_NUM];
        let mut strict_score = 0.0_f64;
        let mut weighted_score = 0.0_f64;

        for (class_id, entry) in self.class_table.iter().enumerate() {
            let Some(index) = *entry else {
                continue;
            };
            let class = &configuration.course_classes()[class_id];
            let reservation = Reservation::parse(index, number_of_rooms);
            let base = class_id * CRITERIA_NUM;

            let overlapped = criteria::room_overlapped(&self.slots, index, class.duration());
            self.criteria[base] = !overlapped;
            strict_score = if overlapped { 0.0 } else { strict_score + 1.0 };

            let room = configuration.room(reservation.room);
            self.criteria[base + 1] = criteria::seats_enough(room, class);
            strict_score = if self.criteria[base + 1] {
                strict_score + 1.0
            } else {
                strict_score / 2.0
            };

            self.criteria[base + 2] = criteria::lab_satisfied(room, class);
            strict_score = if self.criteria[base + 2] {
                strict_score + 1.0
            } else {
                strict_score / 2.0
            };

            let time_id = reservation.day * day_size + reservation.time;
            let (professor_overlap, group_overlap) = criteria::professor_and_groups_overlapped(
                &self.slots,
                &configuration,
                class_id,
                time_id,
            );
            self.criteria[base + 3] = !professor_overlap;
            strict_score = if professor_overlap {
                0.0
            } else {
                strict_score + 1.0
            };
            self.criteria[base + 4] = !group_overlap;
            strict_score = if group_overlap { 0.0 } else { strict_score + 1.0 };

            for (k, weight) in weights.iter().enumerate() {
                if self.criteria[base + k] {
                    weighted_score += 1.0;
                } else {
                    weighted_score += weight;
                    self.objectives[k] += if *weight > 0.0 { 1.0 } else { 2.0 };
                }
            }
        }

        let denominator = self.criteria.len() as f64;
        if denominator > 0.0 {
            self.fitness = weighted_score / denominator;
            self.strict_fitness = strict_score / denominator;
        } else {
            // an empty timetable scores zero
            self.fitness = 0.0;
            self.strict_fitness = 0.0;
        }
    }

    /// Write the continuous view of the assignment into `positions`: the `(day, room, time)`
    /// triple of every class in configuration order.
    ///
    /// # Arguments
    ///
    /// * `positions`: A buffer of at least `3 * number_of_classes` entries.
    pub fn extract_positions(&self, positions: &mut [f64]) {
        let number_of_rooms = self.configuration.number_of_rooms();
        for (class_id, entry) in self.class_table.iter().enumerate() {
            if let Some(index) = *entry {
                let reservation = Reservation::parse(index, number_of_rooms);
                positions[3 * class_id] = reservation.day as f64;
                positions[3 * class_id + 1] = reservation.room as f64;
                positions[3 * class_id + 2] = reservation.time as f64;
            }
        }
    }

    /// Re-read the continuous view of the assignment, fold every coordinate back into its valid
    /// range (`|x| mod bound`), relocate every class accordingly and re-evaluate. The buffer is
    /// rewritten with the canonical values actually applied.
    ///
    /// # Arguments
    ///
    /// * `positions`: The continuous positions, `(day, room, time)` per class.
    /// * `rng`: The random number generator used when a relocation must be redrawn.
    pub fn update_positions(&mut self, positions: &mut [f64], rng: &mut dyn RngCore) {
        let number_of_rooms = self.configuration.number_of_rooms();
        for class_id in 0..self.class_table.len() {
            let duration = self.configuration.course_classes()[class_id].duration();
            let day = (positions[3 * class_id] as i64).unsigned_abs() as usize % DAYS_NUM;
            let room =
                (positions[3 * class_id + 1] as i64).unsigned_abs() as usize % number_of_rooms;
            let time = (positions[3 * class_id + 2] as i64).unsigned_abs() as usize
                % (DAY_HOURS - duration);

            let reservation = Reservation::new(day, time, room);
            let current = self.class_table[class_id];
            self.repair(class_id, current, Some(reservation), rng);

            positions[3 * class_id] = day as f64;
            positions[3 * class_id + 1] = room as f64;
            positions[3 * class_id + 2] = time as f64;
        }
        self.calculate_fitness();
    }

    /// Pareto domination on the objective vector: `self` dominates `other` when it is no worse
    /// on every objective and strictly better on at least one.
    pub fn dominates(&self, other: &Schedule) -> bool {
        let mut better = false;
        for (own, others) in self.objectives.iter().zip(&other.objectives) {
            if own > others {
                return false;
            }
            if own < others {
                better = true;
            }
        }
        better
    }

    /// Hamming distance between the criterion flag vectors of two chromosomes.
    pub fn difference(&self, other: &Schedule) -> usize {
        self.criteria
            .iter()
            .zip(&other.criteria)
            .filter(|(own, others)| own != others)
            .count()
    }

    pub fn configuration(&self) -> &Arc<Configuration> {
        &self.configuration
    }

    pub fn class_count(&self) -> usize {
        self.class_table.len()
    }

    /// The starting slot index of each class, in configuration order.
    pub fn class_table(&self) -> &[Option<usize>] {
        &self.class_table
    }

    pub fn slots(&self) -> &[Vec<usize>] {
        &self.slots
    }

    pub fn criteria(&self) -> &[bool] {
        &self.criteria
    }

    pub fn objectives(&self) -> &[f64] {
        &self.objectives
    }

    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    pub fn strict_fitness(&self) -> f64 {
        self.strict_fitness
    }

    pub fn diversity(&self) -> f64 {
        self.diversity
    }

    pub fn set_diversity(&mut self, diversity: f64) {
        self.diversity = diversity;
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn set_rank(&mut self, rank: usize) {
        self.rank = rank;
    }

    pub fn converted_objectives(&self) -> &[f64] {
        &self.converted_objectives
    }

    pub fn converted_objectives_mut(&mut self) -> &mut [f64] {
        &mut self.converted_objectives
    }

    /// Reset the normalisation working vector to zeros of the given length.
    pub fn resize_converted_objectives(&mut self, number_of_objectives: usize) {
        self.converted_objectives = vec![0.0; number_of_objectives];
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use float_cmp::assert_approx_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::core::config::Configuration;
    use crate::core::criteria::CRITERIA_NUM;
    use crate::core::reservation::{Reservation, DAY_HOURS};
    use crate::core::test_utils::{schedule_config, TWO_CLASS_CONFIG};

    use super::Schedule;

    fn prototype(content: &str) -> Schedule {
        Schedule::from_configuration(Arc::new(Configuration::from_json(content).unwrap())).unwrap()
    }

    /// Check that slots and class table agree: each class occupies exactly its `duration` cells
    /// starting at its recorded index and appears nowhere else.
    fn assert_occupancy_consistent(schedule: &Schedule) {
        let configuration = schedule.configuration();
        for (class_id, entry) in schedule.class_table().iter().enumerate() {
            let index = entry.expect("class must be placed");
            let duration = configuration.course_classes()[class_id].duration();
            let occurrences: usize = schedule
                .slots()
                .iter()
                .map(|cell| cell.iter().filter(|&&c| c == class_id).count())
                .sum();
            assert_eq!(occurrences, duration);
            for offset in 0..duration {
                assert!(schedule.slots()[index + offset].contains(&class_id));
            }
        }
    }

    #[test]
    /// Random construction respects the reservation bounds and occupancy invariants.
    fn test_random_construction() {
        let prototype = prototype(TWO_CLASS_CONFIG);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..50 {
            let schedule = prototype.new_from_prototype(&mut rng, None);
            assert_occupancy_consistent(&schedule);
            let number_of_rooms = schedule.configuration().number_of_rooms();
            for (class_id, entry) in schedule.class_table().iter().enumerate() {
                let reservation = Reservation::parse(entry.unwrap(), number_of_rooms);
                let duration = schedule.configuration().course_classes()[class_id].duration();
                assert!(reservation.time + duration <= DAY_HOURS);
            }
        }
    }

    #[test]
    /// A four hour class can only start at hours 0 to 7, through construction, mutation and
    /// position updates alike.
    fn test_long_class_start_bounds() {
        let prototype = prototype(&schedule_config(4, 2));
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..30 {
            let mut schedule = prototype.new_from_prototype(&mut rng, None);
            schedule.mutate(2, 100.0, &mut rng);
            let mut positions = vec![0.0; 3 * schedule.class_count()];
            schedule.extract_positions(&mut positions);
            for value in positions.iter_mut() {
                *value += 17.0;
            }
            schedule.update_positions(&mut positions, &mut rng);

            let number_of_rooms = schedule.configuration().number_of_rooms();
            for entry in schedule.class_table() {
                let reservation = Reservation::parse(entry.unwrap(), number_of_rooms);
                assert!(reservation.time <= DAY_HOURS - 4 - 1);
            }
        }
    }

    #[test]
    /// Evaluating twice yields identical criteria, objectives and fitness.
    fn test_fitness_deterministic() {
        let prototype = prototype(TWO_CLASS_CONFIG);
        let mut rng = ChaCha8Rng::seed_from_u64(17);
        let mut schedule = prototype.new_from_prototype(&mut rng, None);

        let criteria = schedule.criteria().to_vec();
        let objectives = schedule.objectives().to_vec();
        let fitness = schedule.fitness();
        let strict = schedule.strict_fitness();

        schedule.calculate_fitness();
        assert_eq!(schedule.criteria(), criteria.as_slice());
        assert_eq!(schedule.objectives(), objectives.as_slice());
        assert_approx_eq!(f64, schedule.fitness(), fitness);
        assert_approx_eq!(f64, schedule.strict_fitness(), strict);
    }

    #[test]
    /// A conflict-free single class in a fitting laboratory scores a perfect fitness on both
    /// scales, while a missing laboratory is charged on the third criterion only.
    fn test_fitness_values() {
        let perfect = prototype(
            r#"[
                {"prof": {"id": 1, "name": "Ada"}},
                {"course": {"id": 1, "name": "Numerical methods"}},
                {"room": {"name": "Lab", "lab": true, "size": 30}},
                {"group": {"id": 1, "name": "G1", "size": 25}},
                {"class": {"professor": 1, "course": 1, "lab": true, "group": 1}}
            ]"#,
        );
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let schedule = perfect.new_from_prototype(&mut rng, None);
        assert_approx_eq!(f64, schedule.fitness(), 1.0);
        assert_approx_eq!(f64, schedule.strict_fitness(), 1.0);
        assert!(schedule.criteria().iter().all(|&flag| flag));
        assert!(schedule.objectives().iter().all(|&count| count == 0.0));

        let no_lab = prototype(
            r#"[
                {"prof": {"id": 1, "name": "Ada"}},
                {"course": {"id": 1, "name": "Numerical methods"}},
                {"room": {"name": "R1", "size": 30}},
                {"group": {"id": 1, "name": "G1", "size": 25}},
                {"class": {"professor": 1, "course": 1, "lab": true, "group": 1}}
            ]"#,
        );
        let schedule = no_lab.new_from_prototype(&mut rng, None);
        // four passes plus the 0.5 weight of the failed laboratory criterion
        assert_approx_eq!(f64, schedule.fitness(), 4.5 / 5.0);
        // two passes, a halving, then two more passes
        assert_approx_eq!(f64, schedule.strict_fitness(), 3.0 / 5.0);
        assert_eq!(schedule.objectives(), &[0.0, 0.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    /// A crossover forced at 100% probability produces a valid child whose genes all come from
    /// one of the two parents.
    fn test_crossover_closure() {
        let prototype = prototype(TWO_CLASS_CONFIG);
        let mut rng = ChaCha8Rng::seed_from_u64(23);
        let a = prototype.new_from_prototype(&mut rng, None);
        let b = prototype.new_from_prototype(&mut rng, None);

        for _ in 0..20 {
            let child = a.crossover(&b, 2, 100.0, &mut rng);
            assert_eq!(child.class_count(), a.class_count());
            assert_occupancy_consistent(&child);
            for (class_id, entry) in child.class_table().iter().enumerate() {
                let gene = entry.unwrap();
                assert!(
                    gene == a.class_table()[class_id].unwrap()
                        || gene == b.class_table()[class_id].unwrap()
                );
            }
        }
    }

    #[test]
    /// Mutation at 100% probability relocates at most `mutation_size` classes.
    fn test_mutation_bound() {
        let prototype = prototype(TWO_CLASS_CONFIG);
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        for mutation_size in 1..3 {
            let original = prototype.new_from_prototype(&mut rng, None);
            let mut mutated = original.clone();
            mutated.mutate(mutation_size, 100.0, &mut rng);
            assert_occupancy_consistent(&mutated);

            let changed = original
                .class_table()
                .iter()
                .zip(mutated.class_table())
                .filter(|(before, after)| before != after)
                .count();
            assert!(changed <= mutation_size);
        }
    }

    #[test]
    /// Repairing a class onto its own reservation leaves the chromosome unchanged.
    fn test_repair_idempotent() {
        let prototype = prototype(TWO_CLASS_CONFIG);
        let mut rng = ChaCha8Rng::seed_from_u64(37);
        let mut schedule = prototype.new_from_prototype(&mut rng, None);
        let reference = schedule.clone();

        let number_of_rooms = schedule.configuration().number_of_rooms();
        let index = schedule.class_table()[0].unwrap();
        let same = Reservation::parse(index, number_of_rooms);
        schedule.repair(0, Some(index), Some(same), &mut rng);
        schedule.calculate_fitness();

        assert_eq!(schedule.class_table(), reference.class_table());
        assert_eq!(schedule.slots(), reference.slots());
        assert_approx_eq!(f64, schedule.fitness(), reference.fitness());
    }

    #[test]
    /// Domination is antisymmetric and irreflexive.
    fn test_domination() {
        let prototype = prototype(TWO_CLASS_CONFIG);
        let mut rng = ChaCha8Rng::seed_from_u64(41);
        let a = prototype.new_from_prototype(&mut rng, None);
        let b = prototype.new_from_prototype(&mut rng, None);

        assert!(!a.dominates(&a));
        if a.dominates(&b) {
            assert!(!b.dominates(&a));
        }
    }

    #[test]
    /// Extracting then re-applying the positions buffer preserves every reservation.
    fn test_positions_round_trip() {
        let prototype = prototype(TWO_CLASS_CONFIG);
        let mut rng = ChaCha8Rng::seed_from_u64(43);
        let mut schedule = prototype.new_from_prototype(&mut rng, None);
        let reference = schedule.class_table().to_vec();

        let mut positions = vec![0.0; 3 * schedule.class_count()];
        schedule.extract_positions(&mut positions);
        schedule.update_positions(&mut positions, &mut rng);

        assert_eq!(schedule.class_table(), reference.as_slice());
        assert_occupancy_consistent(&schedule);
    }

    #[test]
    /// The criteria Hamming distance counts differing flags.
    fn test_difference() {
        let prototype = prototype(TWO_CLASS_CONFIG);
        let mut rng = ChaCha8Rng::seed_from_u64(47);
        let a = prototype.new_from_prototype(&mut rng, None);
        assert_eq!(a.difference(&a), 0);

        let b = prototype.new_from_prototype(&mut rng, None);
        let expected = a
            .criteria()
            .iter()
            .zip(b.criteria())
            .filter(|(x, y)| x != y)
            .count();
        assert_eq!(a.difference(&b), expected);
        assert!(a.difference(&b) <= a.class_count() * CRITERIA_NUM);
    }

    #[test]
    /// Oversized durations and impossible seat requirements are rejected at prototype
    /// construction.
    fn test_domain_invariants() {
        let configuration = Configuration::from_json(
            r#"[
                {"prof": {"id": 1, "name": "Ada"}},
                {"course": {"id": 1, "name": "Numerical methods"}},
                {"room": {"name": "R1", "size": 10}},
                {"class": {"professor": 1, "course": 1, "duration": 12}}
            ]"#,
        )
        .unwrap();
        assert!(Schedule::from_configuration(Arc::new(configuration)).is_err());

        let configuration = Configuration::from_json(
            r#"[
                {"prof": {"id": 1, "name": "Ada"}},
                {"course": {"id": 1, "name": "Numerical methods"}},
                {"room": {"name": "R1", "size": 10}},
                {"group": {"id": 1, "name": "G1", "size": 50}},
                {"class": {"professor": 1, "course": 1, "group": 1}}
            ]"#,
        )
        .unwrap();
        assert!(Schedule::from_configuration(Arc::new(configuration)).is_err());
    }
}
