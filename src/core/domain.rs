use std::collections::BTreeSet;

/// A professor teaching one or more course classes. Two professors are the same entity when
/// their ids match.
#[derive(Debug, Clone)]
pub struct Professor {
    id: u32,
    name: String,
    /// Ids of the course classes taught by the professor.
    class_ids: Vec<usize>,
}

impl Professor {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            class_ids: vec![],
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_ids(&self) -> &[usize] {
        &self.class_ids
    }

    /// Bind a course class to the professor.
    pub(crate) fn add_class(&mut self, class_id: usize) {
        self.class_ids.push(class_id);
    }
}

/// A group of students attending classes together.
#[derive(Debug, Clone)]
pub struct StudentsGroup {
    id: u32,
    name: String,
    /// Number of students in the group.
    size: usize,
    /// Ids of the course classes attended by the group.
    class_ids: Vec<usize>,
}

impl StudentsGroup {
    pub fn new(id: u32, name: &str, size: usize) -> Self {
        Self {
            id,
            name: name.to_string(),
            size,
            class_ids: vec![],
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn class_ids(&self) -> &[usize] {
        &self.class_ids
    }

    /// Bind a course class to the group.
    pub(crate) fn add_class(&mut self, class_id: usize) {
        self.class_ids.push(class_id);
    }
}

/// A course taught at the university.
#[derive(Debug, Clone)]
pub struct Course {
    id: u32,
    name: String,
}

impl Course {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// A classroom. Room ids are assigned monotonically in input order, starting at zero, by the
/// configuration parser.
#[derive(Debug, Clone)]
pub struct Room {
    id: usize,
    name: String,
    /// Whether the room is equipped as a laboratory.
    lab: bool,
    seats: usize,
}

impl Room {
    pub fn new(id: usize, name: &str, lab: bool, seats: usize) -> Self {
        Self {
            id,
            name: name.to_string(),
            lab,
            seats,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_lab(&self) -> bool {
        self.lab
    }

    pub fn seats(&self) -> usize {
        self.seats
    }
}

/// An indivisible unit of teaching: a professor holding a course for a set of student groups
/// over a number of consecutive hours. Class ids are assigned monotonically in input order by
/// the configuration parser; on construction the class registers itself with its professor and
/// its groups, and its seat requirement is the sum of the group sizes.
#[derive(Debug, Clone)]
pub struct CourseClass {
    id: usize,
    professor_id: u32,
    course_id: u32,
    /// Whether the class must be scheduled in a laboratory room.
    lab_required: bool,
    /// Duration in hours.
    duration: usize,
    /// Ids of the student groups attending the class.
    group_ids: BTreeSet<u32>,
    /// Total number of seats required, i.e. the sum of the attending group sizes.
    seats_required: usize,
}

impl CourseClass {
    pub fn new(
        id: usize,
        professor_id: u32,
        course_id: u32,
        lab_required: bool,
        duration: usize,
        group_ids: BTreeSet<u32>,
        seats_required: usize,
    ) -> Self {
        Self {
            id,
            professor_id,
            course_id,
            lab_required,
            duration,
            group_ids,
            seats_required,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn professor_id(&self) -> u32 {
        self.professor_id
    }

    pub fn course_id(&self) -> u32 {
        self.course_id
    }

    pub fn lab_required(&self) -> bool {
        self.lab_required
    }

    pub fn duration(&self) -> usize {
        self.duration
    }

    pub fn group_ids(&self) -> &BTreeSet<u32> {
        &self.group_ids
    }

    pub fn seats_required(&self) -> usize {
        self.seats_required
    }

    /// Whether another class is taught by the same professor.
    pub fn professor_overlaps(&self, other: &CourseClass) -> bool {
        self.professor_id == other.professor_id
    }

    /// Whether another class shares at least one student group with this one.
    pub fn groups_overlap(&self, other: &CourseClass) -> bool {
        self.group_ids
            .intersection(&other.group_ids)
            .next()
            .is_some()
    }
}

#[cfg(test)]
mod test {
    use std::collections::BTreeSet;

    use super::CourseClass;

    fn class_with(professor_id: u32, group_ids: &[u32]) -> CourseClass {
        CourseClass::new(
            0,
            professor_id,
            1,
            false,
            1,
            group_ids.iter().copied().collect::<BTreeSet<u32>>(),
            0,
        )
    }

    #[test]
    fn test_professor_overlaps() {
        let a = class_with(1, &[1]);
        let b = class_with(1, &[2]);
        let c = class_with(2, &[1]);
        assert!(a.professor_overlaps(&b));
        assert!(!a.professor_overlaps(&c));
    }

    #[test]
    fn test_groups_overlap() {
        let a = class_with(1, &[1, 2]);
        let b = class_with(2, &[2, 3]);
        let c = class_with(3, &[4]);
        assert!(a.groups_overlap(&b));
        assert!(!a.groups_overlap(&c));
        assert!(!a.groups_overlap(&class_with(4, &[])));
    }
}
