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

use crate::error::NoiseError;
use itertools::Itertools;
use std::collections::HashMap;
use std::fs::File;
use std::hash::Hash;
use std::io::BufReader;
use std::path::Path;

pub(crate) fn swap_key_values<T: Clone, U: Hash + Eq + Copy>(
    input_hashmap: &HashMap<T, U>,
) -> HashMap<U, T> {
    input_hashmap
        .iter()
        .map(|(key, &value)| (value, key.clone()))
        .collect()
}

/// # BIO tag
/// Parsed view over a label string. Anything that is neither `B-<type>` nor `I-<type>`
/// is considered outside of any entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BioTag<'a> {
    /// `O`
    Outside,
    /// `B-<type>`, first token of an entity
    Begin(&'a str),
    /// `I-<type>`, continuation of an entity
    Inside(&'a str),
}

impl<'a> BioTag<'a> {
    pub fn parse(label: &'a str) -> BioTag<'a> {
        if let Some(entity_type) = label.strip_prefix("B-") {
            BioTag::Begin(entity_type)
        } else if let Some(entity_type) = label.strip_prefix("I-") {
            BioTag::Inside(entity_type)
        } else {
            BioTag::Outside
        }
    }

    pub fn entity_type(&self) -> Option<&'a str> {
        match *self {
            BioTag::Outside => None,
            BioTag::Begin(entity_type) | BioTag::Inside(entity_type) => Some(entity_type),
        }
    }

    pub fn is_entity(&self) -> bool {
        !matches!(self, BioTag::Outside)
    }

    /// Returns true if the tag is an `I-<type>` that may follow `previous` within the same span
    pub fn continues(&self, previous: &BioTag) -> bool {
        match (self, previous) {
            (BioTag::Inside(current), BioTag::Begin(previous))
            | (BioTag::Inside(current), BioTag::Inside(previous)) => current == previous,
            _ => false,
        }
    }
}

pub fn begin_label(entity_type: &str) -> String {
    format!("B-{}", entity_type)
}

pub fn inside_label(entity_type: &str) -> String {
    format!("I-{}", entity_type)
}

/// # Label map
/// Bidirectional mapping between label strings and label ids (`label2id` and `id2label`).
/// The label alphabet is expected to contain the outside label `O` and any number of
/// `B-<type>` / `I-<type>` labels.
#[derive(Debug, Clone)]
pub struct LabelMap {
    /// A mapping of labels as strings to ids (`label2id`)
    pub values: HashMap<String, i64>,

    /// A mapping of label ids to strings (`id2label`)
    pub indices: HashMap<i64, String>,

    outside_id: i64,
}

impl LabelMap {
    pub const OUTSIDE: &'static str = "O";

    /// Creates a label map from an `id2label` mapping.
    ///
    /// # Parameters
    /// - indices (`HashMap<i64, String>`): mapping from label ids to label strings
    ///
    /// # Returns
    /// - `LabelMap`, or a `ConfigurationError` if `O` is missing or a label appears under two ids
    pub fn from_id2label(indices: HashMap<i64, String>) -> Result<LabelMap, NoiseError> {
        let values: HashMap<String, i64> = indices
            .iter()
            .map(|(id, label)| (label.clone(), *id))
            .collect();
        if values.len() != indices.len() {
            return Err(NoiseError::ConfigurationError(
                "duplicate label strings in label map".to_string(),
            ));
        }
        Self::from_label2id(values)
    }

    /// Creates a label map from a `label2id` mapping.
    pub fn from_label2id(values: HashMap<String, i64>) -> Result<LabelMap, NoiseError> {
        let indices = swap_key_values(&values);
        if values.len() != indices.len() {
            return Err(NoiseError::ConfigurationError(
                "duplicate label ids in label map".to_string(),
            ));
        }
        let outside_id = *values.get(Self::OUTSIDE).ok_or_else(|| {
            NoiseError::ConfigurationError(format!(
                "label map must contain the outside label `{}`",
                Self::OUTSIDE
            ))
        })?;
        Ok(LabelMap {
            values,
            indices,
            outside_id,
        })
    }

    /// Creates a label map from an ordered list of labels, the id of each label is its position.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Result<LabelMap, NoiseError> {
        let indices: HashMap<i64, String> = labels
            .iter()
            .enumerate()
            .map(|(id, label)| (id as i64, label.as_ref().to_string()))
            .collect();
        Self::from_id2label(indices)
    }

    /// Creates a label map for a set of entity types, following the CoNLL layout:
    /// `O` first, then `B-<type>` and `I-<type>` for every type in the order provided.
    ///
    /// # Example
    ///
    /// ```
    /// use ner_noise::labels::LabelMap;
    ///
    /// let label_map = LabelMap::from_entity_types(&["PER", "LOC"]).unwrap();
    /// assert_eq!(label_map.id("O").unwrap(), 0);
    /// assert_eq!(label_map.id("I-LOC").unwrap(), 4);
    /// ```
    pub fn from_entity_types<S: AsRef<str>>(entity_types: &[S]) -> Result<LabelMap, NoiseError> {
        let mut labels = vec![Self::OUTSIDE.to_string()];
        for entity_type in entity_types {
            labels.push(begin_label(entity_type.as_ref()));
            labels.push(inside_label(entity_type.as_ref()));
        }
        Self::from_labels(&labels)
    }

    /// Reads a label map from a JSON file containing an array of label strings (index = id).
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<LabelMap, NoiseError> {
        let f = File::open(&path).map_err(|e| {
            NoiseError::FileNotFound(format!(
                "{} label file not found :{}",
                path.as_ref().display(),
                e
            ))
        })?;
        let br = BufReader::new(f);
        let labels: Vec<String> = serde_json::from_reader(br)?;
        Self::from_labels(&labels)
    }

    pub fn outside_id(&self) -> i64 {
        self.outside_id
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Converts a label id to its string representation
    pub fn label(&self, id: i64) -> Result<&str, NoiseError> {
        self.indices
            .get(&id)
            .map(String::as_str)
            .ok_or(NoiseError::IndexNotFound(id))
    }

    /// Converts a label string to its id
    pub fn id(&self, label: &str) -> Result<i64, NoiseError> {
        self.values
            .get(label)
            .copied()
            .ok_or_else(|| NoiseError::LabelNotFound(label.to_string()))
    }

    pub fn decode(&self, ids: &[i64]) -> Result<Vec<String>, NoiseError> {
        ids.iter()
            .map(|id| self.label(*id).map(str::to_string))
            .collect()
    }

    pub fn encode<S: AsRef<str>>(&self, labels: &[S]) -> Result<Vec<i64>, NoiseError> {
        labels.iter().map(|label| self.id(label.as_ref())).collect()
    }

    pub fn is_entity(&self, id: i64) -> Result<bool, NoiseError> {
        Ok(BioTag::parse(self.label(id)?).is_entity())
    }

    /// Sorted list of the entity types having a `B-<type>` label in the map
    pub fn entity_types(&self) -> Vec<String> {
        self.values
            .keys()
            .filter_map(|label| match BioTag::parse(label) {
                BioTag::Begin(entity_type) => Some(entity_type.to_string()),
                _ => None,
            })
            .sorted()
            .dedup()
            .collect()
    }
}
