use std::sync::Arc;

use crate::core::config::Configuration;
use crate::core::schedule::Schedule;

/// Two one-hour classes held by different professors for different groups, with two rooms.
pub(crate) const TWO_CLASS_CONFIG: &str = r#"[
    {"prof": {"id": 1, "name": "Ada"}},
    {"prof": {"id": 2, "name": "Grace"}},
    {"course": {"id": 1, "name": "Numerical methods"}},
    {"course": {"id": 2, "name": "Compilers"}},
    {"room": {"name": "R1", "lab": true, "size": 40}},
    {"room": {"name": "R2", "size": 25}},
    {"group": {"id": 1, "name": "G1", "size": 20}},
    {"group": {"id": 2, "name": "G2", "size": 15}},
    {"class": {"professor": 1, "course": 1, "duration": 2, "group": 1}},
    {"class": {"professor": 2, "course": 2, "group": 2}}
]"#;

/// A single class fitting a single laboratory room; the optimum has fitness 1.
pub(crate) const SINGLE_CLASS_CONFIG: &str = r#"[
    {"prof": {"id": 1, "name": "Ada"}},
    {"course": {"id": 1, "name": "Numerical methods"}},
    {"room": {"name": "Lab", "lab": true, "size": 30}},
    {"group": {"id": 1, "name": "G1", "size": 25}},
    {"class": {"professor": 1, "course": 1, "lab": true, "group": 1}}
]"#;

/// Two one-hour classes of the same professor with a single room: the optimum must separate
/// their `(day, time)` pairs.
pub(crate) const SAME_PROFESSOR_CONFIG: &str = r#"[
    {"prof": {"id": 1, "name": "Ada"}},
    {"course": {"id": 1, "name": "Numerical methods"}},
    {"course": {"id": 2, "name": "Compilers"}},
    {"room": {"name": "R1", "size": 30}},
    {"group": {"id": 1, "name": "G1", "size": 10}},
    {"group": {"id": 2, "name": "G2", "size": 10}},
    {"class": {"professor": 1, "course": 1, "group": 1}},
    {"class": {"professor": 1, "course": 2, "group": 2}}
]"#;

/// A class requiring a laboratory with no laboratory room available: the weighted fitness is
/// capped at 0.9, so the search stagnates and keeps reforming.
pub(crate) const STUCK_CONFIG: &str = r#"[
    {"prof": {"id": 1, "name": "Ada"}},
    {"course": {"id": 1, "name": "Numerical methods"}},
    {"room": {"name": "R1", "size": 30}},
    {"group": {"id": 1, "name": "G1", "size": 10}},
    {"class": {"professor": 1, "course": 1, "lab": true, "group": 1}}
]"#;

/// A configuration with one class of the given duration and the given number of rooms.
pub(crate) fn schedule_config(duration: usize, rooms: usize) -> String {
    let mut entries = vec![
        r#"{"prof": {"id": 1, "name": "Ada"}}"#.to_string(),
        r#"{"course": {"id": 1, "name": "Numerical methods"}}"#.to_string(),
        r#"{"group": {"id": 1, "name": "G1", "size": 10}}"#.to_string(),
    ];
    for room in 0..rooms {
        entries.push(format!(r#"{{"room": {{"name": "R{room}", "size": 30}}}}"#));
    }
    entries.push(format!(
        r#"{{"class": {{"professor": 1, "course": 1, "duration": {duration}, "group": 1}}}}"#
    ));
    format!("[{}]", entries.join(","))
}

/// Build the prototype chromosome for a JSON configuration.
pub(crate) fn prototype_from(content: &str) -> Schedule {
    let configuration = Configuration::from_json(content).unwrap();
    Schedule::from_configuration(Arc::new(configuration)).unwrap()
}
