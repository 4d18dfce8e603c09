use std::{error, fmt};

use model::route::Route;
use utility::id::Id;

use crate::backend::BackendError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The draft name is empty after trimming.
    InvalidName,
    InsufficientPoints { found: usize },
}

impl error::Error for CaptureError {}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidName => write!(f, "route name must not be empty"),
            Self::InsufficientPoints { found } => {
                write!(f, "a route needs at least 2 points, got {}", found)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackError {
    InsufficientPoints { found: usize },
}

impl error::Error for PlaybackError {}

impl fmt::Display for PlaybackError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InsufficientPoints { found } => {
                write!(f, "can not play a path of {} point(s)", found)
            }
        }
    }
}

#[derive(Debug)]
pub enum ViewError {
    Capture(CaptureError),
    Playback(PlaybackError),
    Backend(BackendError),
    UnknownRoute(Id<Route>),
}

impl error::Error for ViewError {}

impl fmt::Display for ViewError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Capture(why) => write!(f, "{}", why),
            Self::Playback(why) => write!(f, "{}", why),
            Self::Backend(why) => write!(f, "{}", why),
            Self::UnknownRoute(id) => write!(f, "route {} is not loaded", id),
        }
    }
}

impl From<CaptureError> for ViewError {
    fn from(value: CaptureError) -> Self {
        Self::Capture(value)
    }
}

impl From<PlaybackError> for ViewError {
    fn from(value: PlaybackError) -> Self {
        Self::Playback(value)
    }
}

impl From<BackendError> for ViewError {
    fn from(value: BackendError) -> Self {
        Self::Backend(value)
    }
}
