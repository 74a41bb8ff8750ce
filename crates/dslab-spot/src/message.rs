//! Message definition.

use std::fmt::{Error, Formatter};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::GameResult;

/// Represents a message exchanged by workers.
#[derive(Serialize, Deserialize, Clone, Eq, Hash, PartialEq)]
pub struct Message {
    /// Message type.
    pub tip: String,
    /// Message data (payload).
    pub data: String,
}

impl Message {
    /// Creates a message.
    pub fn new<T>(tip: T, data: T) -> Self
    where
        T: Into<String>,
    {
        Self {
            tip: tip.into(),
            data: data.into(),
        }
    }

    /// Creates a message with JSON serialized payload.
    pub fn json<T, S>(tip: T, data: &S) -> GameResult<Self>
    where
        T: Into<String>,
        S: Serialize,
    {
        Ok(Self::new(tip.into(), serde_json::to_string(data)?))
    }

    /// Deserializes the JSON payload.
    pub fn decode<S>(&self) -> GameResult<S>
    where
        S: DeserializeOwned,
    {
        Ok(serde_json::from_str(&self.data)?)
    }
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), Error> {
        write!(f, "{} {}", self.tip, self.data)
    }
}
