use std::{error::Error, fmt};

pub mod client;
pub mod database;
pub mod memory;
mod password;

#[derive(Debug)]
pub enum RequestError {
    NotFound,
    Conflict(String),
    InvalidInput(String),
    Unauthorized,
    Other(Box<dyn Error + Send + Sync>),
}

impl RequestError {
    pub fn other<T: Error + Send + Sync + 'static>(why: T) -> Self {
        Self::Other(Box::new(why))
    }

    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput(message.into())
    }
}

impl Error for RequestError {}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "the requested item does not exist"),
            Self::Conflict(what) => write!(f, "conflict: {}", what),
            Self::InvalidInput(what) => write!(f, "invalid input: {}", what),
            Self::Unauthorized => write!(f, "invalid credentials"),
            Self::Other(why) => write!(f, "{}", why),
        }
    }
}

impl From<database::DatabaseError> for RequestError {
    fn from(value: database::DatabaseError) -> Self {
        match value {
            database::DatabaseError::NotFound => Self::NotFound,
            database::DatabaseError::Conflict(what) => Self::Conflict(what),
            database::DatabaseError::Other(why) => Self::Other(why),
        }
    }
}

pub type RequestResult<O> = Result<O, RequestError>;

pub fn not_found_to_none<O>(result: RequestResult<O>) -> RequestResult<Option<O>> {
    if let Err(RequestError::NotFound) = result {
        Ok(None)
    } else {
        result.map(Some)
    }
}
