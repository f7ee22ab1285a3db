// Copyright 2019 Guillaume Becquin
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! # Noise profiles
//! A profile declares which dataset splits receive token and label noise, and the ordered lists
//! of named noise steps with their parameters. Profiles are JSON documents:
//!
//! ```json
//! {
//!   "scope": {"token_noise": ["test"], "label_noise": ["train"]},
//!   "token_noise": [{"name": "typo_tokens", "params": {"p": 0.1}}],
//!   "label_noise": [{"name": "label_spans_uniform", "params": {"p": 0.2, "to_O_prob": 0.5}}]
//! }
//! ```

use crate::error::NoiseError;
use crate::noise::ProtectionPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

/// # Configuration file loading
/// Implemented by every configuration that can be read from a JSON file.
pub trait Config
where
    for<'de> Self: Deserialize<'de>,
{
    /// Loads a configuration from a JSON file
    ///
    /// # Arguments
    /// - path (`P: AsRef<Path>`): path to the JSON file
    ///
    /// # Returns
    /// - `Self` parsed configuration, or a `ConfigurationError` if the document is malformed
    fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, NoiseError> {
        let f = File::open(&path).map_err(|e| {
            NoiseError::FileNotFound(format!(
                "{} configuration file not found :{}",
                path.as_ref().display(),
                e
            ))
        })?;
        let br = BufReader::new(f);
        let config: Self = serde_json::from_reader(br)?;
        Ok(config)
    }
}

/// # Dataset split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    Train,
    Validation,
    Test,
}

impl FromStr for Split {
    type Err = NoiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "train" => Ok(Split::Train),
            "validation" | "dev" => Ok(Split::Validation),
            "test" => Ok(Split::Test),
            _ => Err(NoiseError::ConfigurationError(format!(
                "unknown split {}, expected train, validation or test",
                s
            ))),
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Split::Train => "train",
            Split::Validation => "validation",
            Split::Test => "test",
        };
        write!(f, "{}", name)
    }
}

/// # Noise scope
/// Splits receiving each class of noise. A missing list means the noise class is never applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scope {
    pub token_noise: Vec<Split>,
    pub label_noise: Vec<Split>,
}

impl Scope {
    pub fn token_noise_applies(&self, split: Split) -> bool {
        self.token_noise.contains(&split)
    }

    pub fn label_noise_applies(&self, split: Split) -> bool {
        self.label_noise.contains(&split)
    }
}

/// # Noise step
/// A registry key and the raw parameters of the operator. Parameters are validated when the step
/// is resolved against the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepConfig {
    pub name: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

impl StepConfig {
    pub fn new(name: &str, params: serde_json::Value) -> StepConfig {
        StepConfig {
            name: name.to_string(),
            params,
        }
    }
}

/// # Noise profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NoiseProfile {
    pub scope: Scope,
    pub token_noise: Vec<StepConfig>,
    pub label_noise: Vec<StepConfig>,
    pub protection: ProtectionPolicy,
}

impl Config for NoiseProfile {}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[test]
    fn test_profile_from_file() -> Result<(), NoiseError> {
        //        Given
        let mut profile_file = tempfile::NamedTempFile::new()?;
        write!(
            profile_file,
            r#"{{
                "scope": {{"token_noise": ["validation", "test"]}},
                "token_noise": [{{"name": "typo_tokens", "params": {{"p": 0.2}}}}],
                "label_noise": [{{"name": "label_spans_uniform"}}],
                "protection": {{"min_length": 3}}
            }}"#
        )?;
        let path = profile_file.into_temp_path();

        //        When
        let profile = NoiseProfile::from_file(&path)?;

        //        Then
        assert!(profile.scope.token_noise_applies(Split::Test));
        assert!(!profile.scope.token_noise_applies(Split::Train));
        assert!(!profile.scope.label_noise_applies(Split::Train));
        assert_eq!(
            profile.token_noise,
            vec![StepConfig::new("typo_tokens", json!({"p": 0.2}))]
        );
        assert_eq!(profile.label_noise[0].params, serde_json::Value::Null);
        assert_eq!(profile.protection.min_length, 3);
        assert!(!profile.protection.protect_digits);
        drop(path);
        Ok(())
    }

    #[test]
    fn test_malformed_profiles() {
        let unknown_field: Result<NoiseProfile, _> =
            serde_json::from_value(json!({"token_noize": []}));
        assert!(unknown_field.is_err());

        let unknown_split: Result<NoiseProfile, _> =
            serde_json::from_value(json!({"scope": {"token_noise": ["holdout"]}}));
        assert!(unknown_split.is_err());

        assert!(matches!(
            NoiseProfile::from_file("/nonexistent/profile.json"),
            Err(NoiseError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_split_parsing() -> Result<(), NoiseError> {
        assert_eq!("train".parse::<Split>()?, Split::Train);
        assert_eq!("Dev".parse::<Split>()?, Split::Validation);
        assert_eq!(Split::Validation.to_string(), "validation");
        assert!("holdout".parse::<Split>().is_err());
        Ok(())
    }
}
