use thiserror::Error;

use crate::model::{PitchError, PositionError, TuningError, ZoneFormatError};
use crate::progressive::ProgressiveError;
use crate::shapes::ShapeError;

/// Any failure raised by this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Position(#[from] PositionError),
    #[error(transparent)]
    Pitch(#[from] PitchError),
    #[error(transparent)]
    Tuning(#[from] TuningError),
    #[error(transparent)]
    ZoneFormat(#[from] ZoneFormatError),
    #[error(transparent)]
    Shape(#[from] ShapeError),
    #[error(transparent)]
    Progressive(#[from] ProgressiveError),
}
