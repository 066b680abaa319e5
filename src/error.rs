use thiserror::Error;

/// Errors surfaced by link selection, realignment and alignment queries.
///
/// Evaluating a frame outside its bounding domain is not an error; it yields NaN.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AlignError {
    #[error("'{0}' is not a valid align_by value, expected 'pixels' or 'wcs'")]
    InvalidMode(String),

    #[error("'{0}' has no celestial WCS and wcs_fallback_scheme is None")]
    UnlinkableDataset(String),

    #[error("align_by can only be changed after existing subsets are deleted ({} present)", .0.join(", "))]
    AlignmentChangeBlocked(Vec<String>),

    #[error("{0} not found in data collection external links")]
    NotFound(String),

    #[error("No reference data for link look-up")]
    NoReferenceData,

    #[error("'{0}' is already in use")]
    DuplicateLabel(String),

    #[error("invalid coordinate frame: {0}")]
    InvalidFrame(String),
}

pub type AlignResult<T> = std::result::Result<T, AlignError>;
