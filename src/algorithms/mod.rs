pub use algorithm::{Algorithm, SearchOptions, SearchState};
pub use amga2::Amga2;
pub use apnsga3::ApNsgaIii;
pub use cso::Cso;
pub use dlba::Dlba;
pub use emosoa::Emosoa;
pub use fpa::Fpa;
pub use gaqpso::GaQpso;
pub use genetic::GeneticAlgorithm;
pub use hgasso::Hgasso;
pub use nsga2::NsgaII;
pub use nsga3::NsgaIii;
pub use rqiea::Rqiea;

mod algorithm;
mod amga2;
mod apnsga3;
mod cso;
mod dlba;
mod emosoa;
mod fpa;
mod gaqpso;
mod genetic;
mod hgasso;
mod levy;
mod nsga2;
mod nsga3;
mod rqiea;
