use rand::{Rng, RngCore};

/// Number of teaching days in a week.
pub const DAYS_NUM: usize = 5;

/// Number of teaching hours in a day (working hours are 9 to 21).
pub const DAY_HOURS: usize = 12;

/// The starting time-space slot of a course class on the weekly grid. A reservation maps to a
/// canonical index into the slot array of a [`crate::core::Schedule`] and two reservations are
/// equal if and only if their indices are equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reservation {
    /// The day of the week, between 0 and [`DAYS_NUM`] - 1.
    pub day: usize,
    /// The starting hour, between 0 and [`DAY_HOURS`] - duration.
    pub time: usize,
    /// The room id.
    pub room: usize,
}

impl Reservation {
    /// Create a new reservation.
    ///
    /// # Arguments
    ///
    /// * `day`: The day of the week.
    /// * `time`: The starting hour.
    /// * `room`: The room id.
    ///
    /// returns: `Reservation`
    pub fn new(day: usize, time: usize, room: usize) -> Self {
        Self { day, time, room }
    }

    /// Calculate the canonical slot index of the reservation.
    ///
    /// # Arguments
    ///
    /// * `number_of_rooms`: The total number of rooms on the grid.
    ///
    /// returns: `usize`
    pub fn index(&self, number_of_rooms: usize) -> usize {
        self.day * number_of_rooms * DAY_HOURS + self.room * DAY_HOURS + self.time
    }

    /// Recover the `(day, time, room)` triple from a canonical slot index.
    ///
    /// # Arguments
    ///
    /// * `index`: The canonical slot index.
    /// * `number_of_rooms`: The total number of rooms on the grid.
    ///
    /// returns: `Reservation`
    pub fn parse(index: usize, number_of_rooms: usize) -> Self {
        let day_size = DAY_HOURS * number_of_rooms;
        let day = index / day_size;
        let remainder = index - day * day_size;
        Self {
            day,
            time: remainder % DAY_HOURS,
            room: remainder / DAY_HOURS,
        }
    }

    /// Draw a uniformly random in-bounds reservation for a class of the given duration.
    ///
    /// # Arguments
    ///
    /// * `number_of_rooms`: The total number of rooms on the grid.
    /// * `duration`: The class duration in hours.
    /// * `rng`: The random number generator.
    ///
    /// returns: `Reservation`
    pub fn random(number_of_rooms: usize, duration: usize, rng: &mut dyn RngCore) -> Self {
        Self {
            day: rng.gen_range(0..DAYS_NUM),
            time: rng.gen_range(0..DAY_HOURS - duration),
            room: rng.gen_range(0..number_of_rooms),
        }
    }

    /// Whether the reservation keeps a class of the given duration inside the day and room
    /// boundaries.
    pub fn is_in_bounds(&self, number_of_rooms: usize, duration: usize) -> bool {
        self.day < DAYS_NUM && self.room < number_of_rooms && self.time + duration <= DAY_HOURS
    }
}

#[cfg(test)]
mod test {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{Reservation, DAYS_NUM, DAY_HOURS};

    #[test]
    /// The canonical index must round-trip through parse for every cell of the grid.
    fn test_index_round_trip() {
        let number_of_rooms = 3;
        for day in 0..DAYS_NUM {
            for room in 0..number_of_rooms {
                for time in 0..DAY_HOURS {
                    let reservation = Reservation::new(day, time, room);
                    let index = reservation.index(number_of_rooms);
                    assert_eq!(Reservation::parse(index, number_of_rooms), reservation);
                }
            }
        }
    }

    #[test]
    /// Indices are dense and ordered day-major, room-second, hour-last.
    fn test_index_layout() {
        let number_of_rooms = 2;
        assert_eq!(Reservation::new(0, 0, 0).index(number_of_rooms), 0);
        assert_eq!(Reservation::new(0, 1, 0).index(number_of_rooms), 1);
        assert_eq!(Reservation::new(0, 0, 1).index(number_of_rooms), DAY_HOURS);
        assert_eq!(
            Reservation::new(1, 0, 0).index(number_of_rooms),
            DAY_HOURS * number_of_rooms
        );
    }

    #[test]
    /// Random draws stay inside the grid for a multi-hour class.
    fn test_random_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(12);
        for _ in 0..200 {
            let reservation = Reservation::random(2, 4, &mut rng);
            assert!(reservation.day < DAYS_NUM);
            assert!(reservation.room < 2);
            // a 4-hour class may start at hour 7 at the latest
            assert!(reservation.time <= DAY_HOURS - 4 - 1);
            assert!(reservation.is_in_bounds(2, 4));
        }
    }
}
