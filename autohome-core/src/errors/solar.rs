#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SolarError {
    #[error("the sun never rises at this location on the given date")]
    NeverRises,

    #[error("the sun never sets at this location on the given date")]
    NeverSets,

    #[error("sunset falls outside the supported calendar range")]
    InvalidDate,
}
