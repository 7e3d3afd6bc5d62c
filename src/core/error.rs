use thiserror::Error;

/// The errors returned while parsing a timetable configuration or running an optimiser.
#[derive(Error, Debug)]
pub enum SError {
    #[error("Cannot read the file '{0}' because: {1}")]
    ReadFile(String, String),
    #[error("Cannot parse the configuration because: {0}")]
    ConfigParse(String),
    #[error("The {0} with id {1} does not exist")]
    NonExistingId(String, u32),
    #[error("The configuration breaks a domain invariant: {0}")]
    DomainInvariant(String),
    #[error("Cannot initialise the {0} algorithm because: {1}")]
    AlgorithmInit(String, String),
    #[error("An error occurred while running the {0} algorithm: {1}")]
    AlgorithmRun(String, String),
    #[error("The search became degenerate: {0}")]
    SearchDegenerate(String),
    #[error("{0}")]
    Generic(String),
}
