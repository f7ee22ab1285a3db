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

use crate::labels::label_map::BioTag;

/// # Entity span
/// Contiguous run of tokens labeled `B-<type>` followed by zero or more `I-<type>`.
/// `end` is inclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[allow(clippy::len_without_is_empty)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub entity_type: String,
}

impl Span {
    pub fn new(start: usize, end: usize, entity_type: &str) -> Span {
        Span {
            start,
            end,
            entity_type: entity_type.to_string(),
        }
    }

    /// Number of tokens covered by the span
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn contains(&self, position: usize) -> bool {
        (self.start..=self.end).contains(&position)
    }
}

/// Extracts the entity spans of a BIO label sequence in a single left-to-right scan.
///
/// A span starts at a `B-<type>` and absorbs the `I-<type>` labels that follow it.
/// An `I-<type>` that does not continue a span (malformed input) is leniently treated as
/// the start of a new span of its own type.
///
/// # Parameters
/// - labels (`&[S]`): label strings, one per token
///
/// # Returns
/// - `Vec<Span>` ordered by start position
///
/// # Example
///
/// ```
/// use ner_noise::labels::{extract_spans, Span};
///
/// let labels = ["B-PER", "I-PER", "O", "B-LOC"];
/// let spans = extract_spans(&labels);
/// assert_eq!(spans, vec![Span::new(0, 1, "PER"), Span::new(3, 3, "LOC")]);
/// ```
pub fn extract_spans<S: AsRef<str>>(labels: &[S]) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut i = 0;
    while i < labels.len() {
        match BioTag::parse(labels[i].as_ref()).entity_type() {
            Some(entity_type) => {
                let mut j = i + 1;
                while j < labels.len()
                    && BioTag::parse(labels[j].as_ref()) == BioTag::Inside(entity_type)
                {
                    j += 1;
                }
                spans.push(Span::new(i, j - 1, entity_type));
                i = j;
            }
            None => i += 1,
        }
    }
    spans
}

/// Returns the positions holding an `I-<type>` label that is not preceded by a
/// `B-<type>` or `I-<type>` of the same type.
pub fn find_orphans<S: AsRef<str>>(labels: &[S]) -> Vec<usize> {
    let mut orphans = Vec::new();
    for (position, label) in labels.iter().enumerate() {
        let tag = BioTag::parse(label.as_ref());
        if let BioTag::Inside(_) = tag {
            let continues =
                position > 0 && tag.continues(&BioTag::parse(labels[position - 1].as_ref()));
            if !continues {
                orphans.push(position);
            }
        }
    }
    orphans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_spans() {
        //        Given
        let test_tuples = [
            (vec!["O", "O", "O"], vec![]),
            (
                vec!["B-PER", "O", "O", "B-LOC"],
                vec![Span::new(0, 0, "PER"), Span::new(3, 3, "LOC")],
            ),
            (
                vec!["B-ORG", "I-ORG", "I-ORG", "O"],
                vec![Span::new(0, 2, "ORG")],
            ),
            (
                vec!["B-PER", "B-PER", "I-PER"],
                vec![Span::new(0, 0, "PER"), Span::new(1, 2, "PER")],
            ),
            (
                vec!["B-PER", "I-LOC", "I-LOC"],
                vec![Span::new(0, 0, "PER"), Span::new(1, 2, "LOC")],
            ),
            (
                vec!["I-MISC", "I-MISC", "O", "I-PER"],
                vec![Span::new(0, 1, "MISC"), Span::new(3, 3, "PER")],
            ),
            (vec![], vec![]),
        ];

        //        When & Then
        for (labels, expected) in test_tuples.iter() {
            assert_eq!(&extract_spans(labels), expected);
        }
    }

    #[test]
    fn test_extract_spans_idempotent() {
        let labels = vec!["B-PER", "I-PER", "O", "I-LOC", "B-ORG", "I-ORG"];

        let first = extract_spans(&labels);
        let second = extract_spans(&labels);

        assert_eq!(first, second);
    }

    #[test]
    fn test_span_geometry() {
        let span = Span::new(2, 4, "LOC");

        assert_eq!(span.len(), 3);
        assert!(span.contains(2));
        assert!(span.contains(4));
        assert!(!span.contains(5));
        assert!(!span.contains(1));
    }

    #[test]
    fn test_find_orphans() {
        assert_eq!(find_orphans(&["B-PER", "I-PER", "O"]), Vec::<usize>::new());
        assert_eq!(find_orphans(&["I-PER", "O"]), vec![0]);
        assert_eq!(find_orphans(&["B-PER", "I-LOC", "O", "I-LOC"]), vec![1, 3]);
        assert_eq!(find_orphans(&["B-LOC", "I-LOC", "I-LOC"]), Vec::<usize>::new());
    }
}
