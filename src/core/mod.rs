pub use config::Configuration;
pub use criteria::{CriteriaWeights, CRITERIA_NUM};
pub use domain::{Course, CourseClass, Professor, Room, StudentsGroup};
pub use error::SError;
pub use reservation::{Reservation, DAYS_NUM, DAY_HOURS};
pub use schedule::Schedule;

mod config;
pub mod criteria;
mod domain;
mod error;
mod reservation;
mod schedule;
#[cfg(test)]
pub(crate) mod test_utils;
