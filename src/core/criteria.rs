use crate::core::config::Configuration;
use crate::core::domain::{CourseClass, Room};
use crate::core::reservation::DAY_HOURS;

/// Number of criteria evaluated per scheduled class.
pub const CRITERIA_NUM: usize = 5;

/// The objective weight of each criterion, in evaluation order: room overlap, seats, laboratory,
/// professor overlap, group overlap. A zero weight marks a hard constraint that must not be
/// violated; a positive weight marks a soft one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriteriaWeights {
    values: [f64; CRITERIA_NUM],
}

impl Default for CriteriaWeights {
    fn default() -> Self {
        Self {
            values: [0.0, 0.5, 0.5, 0.0, 0.0],
        }
    }
}

impl CriteriaWeights {
    pub fn new(values: [f64; CRITERIA_NUM]) -> Self {
        Self { values }
    }

    pub fn values(&self) -> &[f64; CRITERIA_NUM] {
        &self.values
    }
}

/// Whether any hour-room cell occupied by a class starting at `index` holds more than one class.
///
/// # Arguments
///
/// * `slots`: The time-space slot array; each entry is the multiset of class ids in that cell.
/// * `index`: The canonical slot index of the class reservation.
/// * `duration`: The class duration in hours.
///
/// returns: `bool`
pub fn room_overlapped(slots: &[Vec<usize>], index: usize, duration: usize) -> bool {
    slots[index..index + duration].iter().any(|s| s.len() > 1)
}

/// Whether the room has enough seats for all the student groups attending the class.
pub fn seats_enough(room: &Room, class: &CourseClass) -> bool {
    room.seats() >= class.seats_required()
}

/// Whether the room is a laboratory when the class requires one.
pub fn lab_satisfied(room: &Room, class: &CourseClass) -> bool {
    !class.lab_required() || room.is_lab()
}

/// Scan all the rooms over the hours occupied by a class and report whether another class taught
/// by the same professor, or attended by an overlapping student group, is scheduled at the same
/// time. The scan stops as soon as both overlap kinds are found.
///
/// # Arguments
///
/// * `slots`: The time-space slot array.
/// * `configuration`: The parsed configuration, used to resolve class ids.
/// * `class_id`: The id of the class being checked.
/// * `time_id`: The slot index of the class hour in the first room, i.e.
///   `day * DAY_HOURS * number_of_rooms + time`.
///
/// returns: `(bool, bool)`. The professor-overlap and group-overlap flags.
pub fn professor_and_groups_overlapped(
    slots: &[Vec<usize>],
    configuration: &Configuration,
    class_id: usize,
    time_id: usize,
) -> (bool, bool) {
    let class = &configuration.course_classes()[class_id];
    let duration = class.duration();
    let mut professor_overlap = false;
    let mut group_overlap = false;

    let mut cell = time_id;
    for _ in 0..configuration.number_of_rooms() {
        for slot in &slots[cell..cell + duration] {
            for &other_id in slot {
                if other_id == class_id {
                    continue;
                }
                let other = &configuration.course_classes()[other_id];
                if !professor_overlap && class.professor_overlaps(other) {
                    professor_overlap = true;
                }
                if !group_overlap && class.groups_overlap(other) {
                    group_overlap = true;
                }
                if professor_overlap && group_overlap {
                    return (professor_overlap, group_overlap);
                }
            }
        }
        cell += DAY_HOURS;
    }
    (professor_overlap, group_overlap)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::domain::Room;

    #[test]
    fn test_room_overlapped() {
        let slots = vec![vec![0], vec![0, 1], vec![], vec![2]];
        assert!(room_overlapped(&slots, 0, 2));
        assert!(!room_overlapped(&slots, 2, 2));
        assert!(!room_overlapped(&slots, 3, 1));
    }

    #[test]
    fn test_seats_and_lab() {
        let room = Room::new(0, "A", false, 30);
        let lab = Room::new(1, "B", true, 10);
        let class = crate::core::domain::CourseClass::new(
            0,
            1,
            1,
            true,
            2,
            [1].into_iter().collect(),
            25,
        );
        assert!(seats_enough(&room, &class));
        assert!(!seats_enough(&lab, &class));
        assert!(!lab_satisfied(&room, &class));
        assert!(lab_satisfied(&lab, &class));
    }

    #[test]
    fn test_default_weights() {
        let weights = CriteriaWeights::default();
        assert_eq!(weights.values(), &[0.0, 0.5, 0.5, 0.0, 0.0]);
    }
}
