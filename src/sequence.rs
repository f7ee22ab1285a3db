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
use crate::labels::LabelMap;
use serde::{Deserialize, Serialize};

/// # Tagged sequence
/// One example: a sequence of tokens and the aligned sequence of label ids, optionally with
/// Penn Treebank part-of-speech tags. The three sequences always have the same length, structural
/// edits move all of them together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaggedSequence {
    pub tokens: Vec<String>,
    pub labels: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos_tags: Option<Vec<String>>,
}

impl TaggedSequence {
    pub fn new(tokens: Vec<String>, labels: Vec<i64>) -> Result<TaggedSequence, NoiseError> {
        let sequence = TaggedSequence {
            tokens,
            labels,
            pos_tags: None,
        };
        sequence.validate()?;
        Ok(sequence)
    }

    pub fn with_pos_tags(
        tokens: Vec<String>,
        labels: Vec<i64>,
        pos_tags: Vec<String>,
    ) -> Result<TaggedSequence, NoiseError> {
        let sequence = TaggedSequence {
            tokens,
            labels,
            pos_tags: Some(pos_tags),
        };
        sequence.validate()?;
        Ok(sequence)
    }

    /// Builds a sequence from token and label strings, encoding the labels with the label map
    ///
    /// # Example
    ///
    /// ```
    /// use ner_noise::labels::LabelMap;
    /// use ner_noise::TaggedSequence;
    ///
    /// let label_map = LabelMap::from_entity_types(&["PER", "LOC"]).unwrap();
    /// let sequence = TaggedSequence::from_strs(
    ///     &["John", "lives", "in", "Berlin"],
    ///     &["B-PER", "O", "O", "B-LOC"],
    ///     &label_map,
    /// )
    /// .unwrap();
    /// assert_eq!(sequence.labels, vec![1, 0, 0, 3]);
    /// ```
    pub fn from_strs<S: AsRef<str>, L: AsRef<str>>(
        tokens: &[S],
        labels: &[L],
        label_map: &LabelMap,
    ) -> Result<TaggedSequence, NoiseError> {
        Self::new(
            tokens.iter().map(|token| token.as_ref().to_string()).collect(),
            label_map.encode(labels)?,
        )
    }

    pub fn validate(&self) -> Result<(), NoiseError> {
        if self.tokens.len() != self.labels.len() {
            return Err(NoiseError::LengthMismatch(
                self.tokens.len(),
                self.labels.len(),
            ));
        }
        if let Some(pos_tags) = &self.pos_tags {
            if pos_tags.len() != self.tokens.len() {
                return Err(NoiseError::LengthMismatch(self.tokens.len(), pos_tags.len()));
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn label_strings(&self, label_map: &LabelMap) -> Result<Vec<String>, NoiseError> {
        label_map.decode(&self.labels)
    }

    pub fn pos_tag(&self, position: usize) -> Option<&str> {
        self.pos_tags
            .as_ref()
            .and_then(|pos_tags| pos_tags.get(position))
            .map(String::as_str)
    }

    pub(crate) fn insert(&mut self, position: usize, token: String, label: i64) {
        if let Some(pos_tags) = &mut self.pos_tags {
            pos_tags.insert(position, token.clone());
        }
        self.tokens.insert(position, token);
        self.labels.insert(position, label);
    }

    pub(crate) fn remove(&mut self, position: usize) {
        if let Some(pos_tags) = &mut self.pos_tags {
            pos_tags.remove(position);
        }
        self.tokens.remove(position);
        self.labels.remove(position);
    }

    pub(crate) fn swap(&mut self, first: usize, second: usize) {
        if let Some(pos_tags) = &mut self.pos_tags {
            pos_tags.swap(first, second);
        }
        self.tokens.swap(first, second);
        self.labels.swap(first, second);
    }

    /// Appends the token at `position + 1` to the token at `position`, the label and POS tag
    /// of the absorbed token are dropped.
    pub(crate) fn merge_with_next(&mut self, position: usize) {
        let next = self.tokens.remove(position + 1);
        self.tokens[position].push_str(&next);
        self.labels.remove(position + 1);
        if let Some(pos_tags) = &mut self.pos_tags {
            pos_tags.remove(position + 1);
        }
    }

    /// Splits the token at `position` before its `char_index`-th character. The left part keeps
    /// the original label, the right part receives `right_label`.
    pub(crate) fn split(&mut self, position: usize, char_index: usize, right_label: i64) {
        let byte_index = self.tokens[position]
            .char_indices()
            .nth(char_index)
            .map(|(byte_index, _)| byte_index)
            .unwrap_or_else(|| self.tokens[position].len());
        let right = self.tokens[position].split_off(byte_index);
        self.tokens.insert(position + 1, right);
        self.labels.insert(position + 1, right_label);
        if let Some(pos_tags) = &mut self.pos_tags {
            let pos_tag = pos_tags[position].clone();
            pos_tags.insert(position + 1, pos_tag);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn test_length_validation() {
        assert!(TaggedSequence::new(strings(&["a", "b"]), vec![0, 0]).is_ok());
        assert!(matches!(
            TaggedSequence::new(strings(&["a", "b"]), vec![0]),
            Err(NoiseError::LengthMismatch(2, 1))
        ));
        assert!(matches!(
            TaggedSequence::with_pos_tags(strings(&["a"]), vec![0], strings(&["DT", "NN"])),
            Err(NoiseError::LengthMismatch(1, 2))
        ));
    }

    #[test]
    fn test_structural_edits_keep_pos_tags_aligned() -> Result<(), NoiseError> {
        //        Given
        let mut sequence = TaggedSequence::with_pos_tags(
            strings(&["New", "York", "rocks"]),
            vec![1, 2, 0],
            strings(&["NNP", "NNP", "VBZ"]),
        )?;

        //        When
        sequence.merge_with_next(0);
        sequence.insert(1, ",".to_string(), 0);
        sequence.split(0, 3, 2);
        sequence.swap(2, 3);
        sequence.remove(3);

        //        Then
        assert_eq!(sequence.tokens, strings(&["New", "York", "rocks"]));
        assert_eq!(sequence.labels, vec![1, 2, 0]);
        assert_eq!(sequence.pos_tags, Some(strings(&["NNP", "NNP", "VBZ"])));
        sequence.validate()
    }

    #[test]
    fn test_split_on_multibyte_characters() -> Result<(), NoiseError> {
        let mut sequence = TaggedSequence::new(strings(&["Düsseldorf"]), vec![1])?;

        sequence.split(0, 2, 2);

        assert_eq!(sequence.tokens, strings(&["Dü", "sseldorf"]));
        assert_eq!(sequence.labels, vec![1, 2]);
        Ok(())
    }
}
