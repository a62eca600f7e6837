//! Flat string parameters attached to a job step.
//!
//! Parameters carry step configuration across process and restart
//! boundaries, so every value is a string. Lists are stored through
//! [`list_codec`], which escapes the delimiter so ids containing commas
//! survive a round trip.

pub mod list_codec;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// String key-value parameters of a step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StepParams {
    values: BTreeMap<String, String>,
}

impl StepParams {
    /// Creates an empty parameter map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of a parameter, if set.
    #[must_use]
    pub fn get_param(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Sets a parameter, replacing any previous value.
    pub fn set_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Returns the value of a parameter that the step cannot run without.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PreconditionViolation`] if the parameter is unset.
    pub fn require_param(&self, key: &str) -> Result<&str> {
        self.get_param(key)
            .ok_or_else(|| Error::precondition(format!("missing step parameter: {key}")))
    }

    /// Decodes a list parameter. An unset parameter is an empty list.
    #[must_use]
    pub fn get_list(&self, key: &str) -> Vec<String> {
        list_codec::deserialize(self.get_param(key))
    }

    /// Encodes and stores a list parameter.
    pub fn set_list<S: AsRef<str>>(&mut self, key: impl Into<String>, items: &[S]) {
        self.set_param(key, list_codec::serialize(items));
    }

    /// Iterates parameters in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of parameters set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no parameters are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Serializes the parameters as a JSON object.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if encoding fails.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| Error::Serialization {
            message: format!("failed to encode step params: {e}"),
        })
    }

    /// Parses parameters from a JSON object of strings.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if the input is not a JSON object of
    /// string values.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Serialization {
            message: format!("failed to decode step params: {e}"),
        })
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for StepParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
