//! `schedustic` builds feasible weekly university class timetables with a family of
//! population-based multi-objective metaheuristics.
//!
//! A parsed [`core::Configuration`] describes professors, student groups, courses, rooms and
//! course classes; a [`core::Schedule`] chromosome assigns every class a `(day, time, room)`
//! starting slot on the weekly grid and scores it against five criteria (room overlap, seats,
//! laboratory, professor clash, student-group clash). The optimisers in [`algorithms`] share
//! one driver loop and chromosome representation and differ in how they select survivors:
//!
//! * [`algorithms::NsgaII`] and [`algorithms::NsgaIii`] use non-dominated sorting, with
//!   crowding-distance and reference-point niching tie-breaks respectively;
//! * [`algorithms::ApNsgaIii`] adds an adaptive population with a dual control strategy;
//! * [`algorithms::Amga2`] maintains a bounded archive pruned by nearest-neighbour selection;
//! * [`algorithms::Cso`], [`algorithms::Fpa`], [`algorithms::Dlba`], [`algorithms::GaQpso`],
//!   [`algorithms::Hgasso`], [`algorithms::Emosoa`] and [`algorithms::Rqiea`] layer
//!   continuous-position swarm updates on top of the evolutionary scaffold;
//! * [`algorithms::GeneticAlgorithm`] is the plain elitist baseline.
//!
//! The solved timetable is rendered to HTML by [`report`].
//!
//! # Example
//! ```no_run
//! use std::sync::Arc;
//! use schedustic::algorithms::{Algorithm, NsgaII, SearchOptions};
//! use schedustic::core::Configuration;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let configuration = Arc::new(Configuration::from_file("GaSchedule.json")?);
//!     let mut algorithm = NsgaII::new(configuration, SearchOptions::default())?;
//!     let best = algorithm.run()?;
//!     println!("{}", schedustic::report::render(&best));
//!     Ok(())
//! }
//! ```

pub mod algorithms;
pub mod core;
pub mod report;
pub mod utils;
