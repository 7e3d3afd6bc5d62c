use std::collections::HashMap;
use std::fs;
use std::path::Path;

use log::debug;
use serde::Deserialize;

use crate::core::criteria::CriteriaWeights;
use crate::core::domain::{Course, CourseClass, Professor, Room, StudentsGroup};
use crate::core::error::SError;

/// One or many student group ids attached to a class entry.
#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum GroupRef {
    One(u32),
    Many(Vec<u32>),
}

impl Default for GroupRef {
    fn default() -> Self {
        GroupRef::Many(vec![])
    }
}

impl GroupRef {
    fn ids(&self) -> Vec<u32> {
        match self {
            GroupRef::One(id) => vec![*id],
            GroupRef::Many(ids) => ids.clone(),
        }
    }
}

#[derive(Deserialize, Debug)]
struct ProfessorEntry {
    id: u32,
    name: String,
}

#[derive(Deserialize, Debug)]
struct CourseEntry {
    id: u32,
    name: String,
}

#[derive(Deserialize, Debug)]
struct RoomEntry {
    name: String,
    #[serde(default)]
    lab: bool,
    size: usize,
}

#[derive(Deserialize, Debug)]
struct GroupEntry {
    id: u32,
    name: String,
    size: usize,
}

fn default_duration() -> usize {
    1
}

#[derive(Deserialize, Debug)]
struct ClassEntry {
    professor: u32,
    course: u32,
    #[serde(default = "default_duration")]
    duration: usize,
    #[serde(default)]
    lab: bool,
    #[serde(default, alias = "groups")]
    group: GroupRef,
}

/// A single-key object of the configuration sequence.
#[derive(Deserialize, Debug)]
enum ConfigEntry {
    #[serde(rename = "prof")]
    Professor(ProfessorEntry),
    #[serde(rename = "course")]
    Course(CourseEntry),
    #[serde(rename = "room")]
    Room(RoomEntry),
    #[serde(rename = "group")]
    Group(GroupEntry),
    #[serde(rename = "class")]
    Class(ClassEntry),
}

/// The immutable domain built from a configuration file: professors, student groups, courses,
/// rooms and course classes, plus the criteria weights used when scoring a timetable.
///
/// Room and class ids are assigned by the parser in input order starting at zero, so re-parsing
/// a file always restarts the id sequences.
#[derive(Debug)]
pub struct Configuration {
    professors: HashMap<u32, Professor>,
    student_groups: HashMap<u32, StudentsGroup>,
    courses: HashMap<u32, Course>,
    rooms: Vec<Room>,
    course_classes: Vec<CourseClass>,
    weights: CriteriaWeights,
}

impl Configuration {
    /// Parse a configuration from a JSON file.
    ///
    /// # Arguments
    ///
    /// * `path`: The path to the JSON file.
    ///
    /// returns: `Result<Configuration, SError>`
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| SError::ReadFile(path.display().to_string(), e.to_string()))?;
        Self::from_json(&content)
    }

    /// Parse a configuration from a JSON string. The top level must be a sequence of single-key
    /// objects keyed by `prof`, `course`, `room`, `group` or `class`; entries with missing
    /// required ids and classes referencing unknown professors, courses or groups are rejected.
    ///
    /// # Arguments
    ///
    /// * `content`: The JSON document.
    ///
    /// returns: `Result<Configuration, SError>`
    pub fn from_json(content: &str) -> Result<Self, SError> {
        let entries: Vec<ConfigEntry> =
            serde_json::from_str(content).map_err(|e| SError::ConfigParse(e.to_string()))?;

        let mut configuration = Configuration {
            professors: HashMap::new(),
            student_groups: HashMap::new(),
            courses: HashMap::new(),
            rooms: vec![],
            course_classes: vec![],
            weights: CriteriaWeights::default(),
        };

        for entry in entries {
            match entry {
                ConfigEntry::Professor(e) => {
                    if e.id == 0 {
                        return Err(SError::ConfigParse(format!(
                            "the professor '{}' has no valid id",
                            e.name
                        )));
                    }
                    configuration
                        .professors
                        .insert(e.id, Professor::new(e.id, &e.name));
                }
                ConfigEntry::Course(e) => {
                    if e.id == 0 {
                        return Err(SError::ConfigParse(format!(
                            "the course '{}' has no valid id",
                            e.name
                        )));
                    }
                    configuration.courses.insert(e.id, Course::new(e.id, &e.name));
                }
                ConfigEntry::Room(e) => {
                    let id = configuration.rooms.len();
                    configuration.rooms.push(Room::new(id, &e.name, e.lab, e.size));
                }
                ConfigEntry::Group(e) => {
                    if e.id == 0 {
                        return Err(SError::ConfigParse(format!(
                            "the student group '{}' has no valid id",
                            e.name
                        )));
                    }
                    configuration
                        .student_groups
                        .insert(e.id, StudentsGroup::new(e.id, &e.name, e.size));
                }
                ConfigEntry::Class(e) => configuration.add_class(e)?,
            }
        }

        debug!(
            "Parsed {} professors, {} groups, {} courses, {} rooms and {} classes",
            configuration.professors.len(),
            configuration.student_groups.len(),
            configuration.courses.len(),
            configuration.rooms.len(),
            configuration.course_classes.len()
        );
        Ok(configuration)
    }

    /// Build a course class from its entry, resolve its references and register it with its
    /// professor and student groups.
    fn add_class(&mut self, entry: ClassEntry) -> Result<(), SError> {
        if !self.professors.contains_key(&entry.professor) {
            return Err(SError::NonExistingId("professor".to_string(), entry.professor));
        }
        if !self.courses.contains_key(&entry.course) {
            return Err(SError::NonExistingId("course".to_string(), entry.course));
        }

        let class_id = self.course_classes.len();
        let mut seats_required = 0;
        let group_ids = entry.group.ids();
        for group_id in &group_ids {
            let group = self
                .student_groups
                .get_mut(group_id)
                .ok_or_else(|| SError::NonExistingId("student group".to_string(), *group_id))?;
            seats_required += group.size();
            group.add_class(class_id);
        }
        if let Some(professor) = self.professors.get_mut(&entry.professor) {
            professor.add_class(class_id);
        }

        self.course_classes.push(CourseClass::new(
            class_id,
            entry.professor,
            entry.course,
            entry.lab,
            entry.duration,
            group_ids.into_iter().collect(),
            seats_required,
        ));
        Ok(())
    }

    pub fn professor(&self, id: u32) -> Option<&Professor> {
        self.professors.get(&id)
    }

    pub fn number_of_professors(&self) -> usize {
        self.professors.len()
    }

    pub fn students_group(&self, id: u32) -> Option<&StudentsGroup> {
        self.student_groups.get(&id)
    }

    pub fn number_of_student_groups(&self) -> usize {
        self.student_groups.len()
    }

    pub fn course(&self, id: u32) -> Option<&Course> {
        self.courses.get(&id)
    }

    pub fn room(&self, id: usize) -> &Room {
        &self.rooms[id]
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn number_of_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn course_classes(&self) -> &[CourseClass] {
        &self.course_classes
    }

    pub fn number_of_course_classes(&self) -> usize {
        self.course_classes.len()
    }

    pub fn weights(&self) -> &CriteriaWeights {
        &self.weights
    }

    /// Replace the criteria weights. This changes the objective space but not the criterion
    /// semantics.
    pub fn set_weights(&mut self, weights: CriteriaWeights) {
        self.weights = weights;
    }
}

#[cfg(test)]
mod test {
    use super::Configuration;

    pub(crate) const SMALL_CONFIG: &str = r#"[
        {"prof": {"id": 1, "name": "Ada"}},
        {"prof": {"id": 2, "name": "Grace"}},
        {"course": {"id": 1, "name": "Numerical methods"}},
        {"course": {"id": 2, "name": "Compilers"}},
        {"room": {"name": "R1", "lab": true, "size": 40}},
        {"room": {"name": "R2", "size": 25}},
        {"group": {"id": 1, "name": "G1", "size": 20}},
        {"group": {"id": 2, "name": "G2", "size": 15}},
        {"class": {"professor": 1, "course": 1, "duration": 2, "lab": true, "group": 1}},
        {"class": {"professor": 2, "course": 2, "groups": [1, 2]}}
    ]"#;

    #[test]
    fn test_parse_small_config() {
        let configuration = Configuration::from_json(SMALL_CONFIG).unwrap();
        assert_eq!(configuration.number_of_professors(), 2);
        assert_eq!(configuration.number_of_student_groups(), 2);
        assert_eq!(configuration.number_of_rooms(), 2);
        assert_eq!(configuration.number_of_course_classes(), 2);

        // room ids follow input order
        assert_eq!(configuration.room(0).name(), "R1");
        assert!(configuration.room(0).is_lab());
        assert_eq!(configuration.room(1).name(), "R2");

        // the first class is bound to one group, the second to both
        let first = &configuration.course_classes()[0];
        assert_eq!(first.duration(), 2);
        assert!(first.lab_required());
        assert_eq!(first.seats_required(), 20);
        let second = &configuration.course_classes()[1];
        assert_eq!(second.duration(), 1);
        assert_eq!(second.seats_required(), 35);

        // back references are registered on the entities
        assert_eq!(configuration.professor(1).unwrap().class_ids(), &[0]);
        assert_eq!(configuration.students_group(1).unwrap().class_ids(), &[0, 1]);
    }

    #[test]
    fn test_missing_id_is_rejected() {
        let result = Configuration::from_json(r#"[{"prof": {"name": "NoId"}}]"#);
        assert!(result.is_err());

        let result = Configuration::from_json(r#"[{"prof": {"id": 0, "name": "Zero"}}]"#);
        assert!(result.unwrap_err().to_string().contains("no valid id"));
    }

    #[test]
    fn test_unknown_reference_is_rejected() {
        let result = Configuration::from_json(
            r#"[
                {"prof": {"id": 1, "name": "Ada"}},
                {"class": {"professor": 1, "course": 9}}
            ]"#,
        );
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("course with id 9 does not exist"));
    }

    #[test]
    fn test_empty_config() {
        let configuration = Configuration::from_json("[]").unwrap();
        assert_eq!(configuration.number_of_course_classes(), 0);
        assert_eq!(configuration.number_of_rooms(), 0);
    }
}
