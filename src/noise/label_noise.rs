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

//! Label-only corruption of entity spans. The token sequence and the sequence length are never
//! modified.

use crate::error::NoiseError;
use crate::labels::label_map::{begin_label, inside_label};
use crate::labels::{extract_spans, LabelMap, Span};
use crate::noise::utils::{sample_positions, NoiseContext, ProtectionPolicy};
use crate::TaggedSequence;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// # Span corruption operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LabelOp {
    /// Relabels the last token of a multi-token span `O`
    #[serde(rename = "shorten")]
    Shorten,
    /// Absorbs the unprotected `O` token following the span
    #[serde(rename = "extend")]
    Extend,
    /// Relabels the whole span `O`
    #[serde(rename = "replace_O")]
    ReplaceO,
    /// Retypes the whole span to another entity type
    #[serde(rename = "other_class")]
    OtherClass,
    /// Grows a new entity out of an unprotected background token
    #[serde(rename = "token_to_entity")]
    TokenToEntity,
}

impl LabelOp {
    pub const ALL: [LabelOp; 5] = [
        LabelOp::Shorten,
        LabelOp::Extend,
        LabelOp::ReplaceO,
        LabelOp::OtherClass,
        LabelOp::TokenToEntity,
    ];

    /// Precondition of the operator for `span` given the current labels
    pub fn is_applicable(&self, span: &Span, context: &SpanContext, labels: &[String]) -> bool {
        match self {
            LabelOp::Shorten => span.len() >= 2,
            LabelOp::Extend => {
                let next = span.end + 1;
                next < labels.len()
                    && labels[next] == LabelMap::OUTSIDE
                    && !context.policy.is_protected(&context.tokens[next])
            }
            LabelOp::ReplaceO => true,
            LabelOp::OtherClass => context
                .entity_types
                .iter()
                .any(|entity_type| entity_type != &span.entity_type),
            LabelOp::TokenToEntity => {
                !context.entity_types.is_empty() && !context.background_positions(labels).is_empty()
            }
        }
    }

    /// Applies the operator to `span` if its precondition holds.
    ///
    /// # Returns
    /// - `bool`: true if the labels were modified
    pub fn try_apply<R: Rng + ?Sized>(
        &self,
        span: &Span,
        context: &SpanContext,
        labels: &mut [String],
        rng: &mut R,
    ) -> bool {
        if !self.is_applicable(span, context, labels) {
            return false;
        }
        match self {
            LabelOp::Shorten => {
                labels[span.end] = LabelMap::OUTSIDE.to_string();
            }
            LabelOp::Extend => {
                labels[span.end + 1] = inside_label(&span.entity_type);
            }
            LabelOp::ReplaceO => {
                for label in labels[span.start..=span.end].iter_mut() {
                    *label = LabelMap::OUTSIDE.to_string();
                }
            }
            LabelOp::OtherClass => {
                let choices: Vec<&String> = context
                    .entity_types
                    .iter()
                    .filter(|entity_type| *entity_type != &span.entity_type)
                    .collect();
                let new_type = match choices.choose(rng) {
                    Some(new_type) => new_type.as_str(),
                    None => return false,
                };
                labels[span.start] = begin_label(new_type);
                for label in labels[span.start + 1..=span.end].iter_mut() {
                    *label = inside_label(new_type);
                }
            }
            LabelOp::TokenToEntity => {
                let candidates = context.background_positions(labels);
                let (position, new_type) =
                    match (candidates.choose(rng), context.entity_types.choose(rng)) {
                        (Some(position), Some(new_type)) => (*position, new_type),
                        _ => return false,
                    };
                labels[position] = begin_label(new_type);
                let next = position + 1;
                if next < labels.len()
                    && labels[next] == LabelMap::OUTSIDE
                    && !context.policy.is_protected(&context.tokens[next])
                    && rng.gen_bool(0.5)
                {
                    labels[next] = inside_label(new_type);
                }
            }
        }
        true
    }
}

/// # Span context
/// Everything the label operators read besides the labels themselves
#[derive(Debug, Clone, Copy)]
pub struct SpanContext<'a> {
    pub tokens: &'a [String],
    /// Spans of the label sequence before corruption
    pub spans: &'a [Span],
    /// Sorted entity types of the label alphabet
    pub entity_types: &'a [String],
    pub policy: &'a ProtectionPolicy,
}

impl<'a> SpanContext<'a> {
    /// Positions currently labeled `O`, outside every original span and not protected
    pub fn background_positions(&self, labels: &[String]) -> Vec<usize> {
        (0..labels.len())
            .filter(|&position| {
                labels[position] == LabelMap::OUTSIDE
                    && !self.policy.is_protected(&self.tokens[position])
                    && !self.spans.iter().any(|span| span.contains(position))
            })
            .collect()
    }
}

/// # Label noise configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LabelNoiseConfig {
    /// Fraction of the spans to corrupt
    pub p: f64,
    /// Probability of drawing `replace_O` on each attempt, the other operators sharing the rest
    #[serde(rename = "to_O_prob", alias = "to_o_prob")]
    pub to_o_prob: Option<f64>,
    pub ops: Vec<LabelOp>,
    /// Number of operator draws per span before it is left untouched
    pub max_retries: usize,
}

impl Default for LabelNoiseConfig {
    fn default() -> Self {
        LabelNoiseConfig {
            p: 0.1,
            to_o_prob: None,
            ops: LabelOp::ALL.to_vec(),
            max_retries: 5,
        }
    }
}

impl LabelNoiseConfig {
    fn draw_op<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<LabelOp> {
        match self.to_o_prob {
            Some(to_o_prob) if self.ops.contains(&LabelOp::ReplaceO) => {
                let others: Vec<LabelOp> = self
                    .ops
                    .iter()
                    .copied()
                    .filter(|op| *op != LabelOp::ReplaceO)
                    .collect();
                if others.is_empty() || rng.gen_bool(to_o_prob.max(0.0).min(1.0)) {
                    Some(LabelOp::ReplaceO)
                } else {
                    others.choose(rng).copied()
                }
            }
            _ => self.ops.choose(rng).copied(),
        }
    }
}

/// Number of spans to corrupt: `max(1, round(count * p))` capped at `count`, or none for `p <= 0`
fn spans_to_corrupt(count: usize, p: f64) -> usize {
    if p <= 0.0 || count == 0 {
        return 0;
    }
    ((count as f64 * p).round() as usize).max(1).min(count)
}

/// Corrupts the spans of a label sequence given as strings.
///
/// `max(1, round(len(spans) * p))` spans are sampled without replacement. For each of them up to
/// `max_retries` operators are drawn, the first one whose precondition holds is applied. A span
/// for which every draw fails is left unmodified.
///
/// # Returns
/// - `Vec<String>`: corrupted labels, same length as the input
pub fn corrupt_labels<R: Rng + ?Sized>(
    tokens: &[String],
    labels: &[String],
    entity_types: &[String],
    policy: &ProtectionPolicy,
    config: &LabelNoiseConfig,
    rng: &mut R,
) -> Vec<String> {
    let spans = extract_spans(labels);
    let amount = spans_to_corrupt(spans.len(), config.p);
    if amount == 0 || config.ops.is_empty() {
        return labels.to_vec();
    }
    let context = SpanContext {
        tokens,
        spans: &spans,
        entity_types,
        policy,
    };
    let mut output = labels.to_vec();
    let span_indices: Vec<usize> = (0..spans.len()).collect();
    for span_index in sample_positions(rng, &span_indices, amount) {
        let span = &spans[span_index];
        let mut applied = None;
        for _ in 0..config.max_retries {
            let op = match config.draw_op(rng) {
                Some(op) => op,
                None => break,
            };
            if op.try_apply(span, &context, &mut output, rng) {
                applied = Some(op);
                break;
            }
        }
        match applied {
            Some(op) => debug!(
                start = span.start,
                end = span.end,
                entity_type = %span.entity_type,
                ?op,
                "span corrupted"
            ),
            None => trace!(
                start = span.start,
                end = span.end,
                retries = config.max_retries,
                "no applicable operator, span left unchanged"
            ),
        }
    }
    output
}

/// Corrupts the entity spans of a tagged sequence, see `corrupt_labels`
pub fn corrupt_spans<R: Rng + ?Sized>(
    mut sequence: TaggedSequence,
    context: &NoiseContext,
    config: &LabelNoiseConfig,
    rng: &mut R,
) -> Result<TaggedSequence, NoiseError> {
    let labels = sequence.label_strings(context.label_map)?;
    let entity_types = context.label_map.entity_types();
    let corrupted = corrupt_labels(
        &sequence.tokens,
        &labels,
        &entity_types,
        &context.policy,
        config,
        rng,
    );
    sequence.labels = context.label_map.encode(&corrupted)?;
    Ok(sequence)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::find_orphans;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    fn apply_single(
        op: LabelOp,
        tokens: &[&str],
        labels: &[&str],
        entity_types: &[&str],
        span_index: usize,
        seed: u64,
    ) -> (bool, Vec<String>) {
        let tokens = strings(tokens);
        let mut labels = strings(labels);
        let entity_types = strings(entity_types);
        let spans = extract_spans(&labels);
        let policy = ProtectionPolicy::default();
        let context = SpanContext {
            tokens: &tokens,
            spans: &spans,
            entity_types: &entity_types,
            policy: &policy,
        };
        let applied = op.try_apply(
            &spans[span_index],
            &context,
            &mut labels,
            &mut StdRng::seed_from_u64(seed),
        );
        (applied, labels)
    }

    #[test]
    fn test_replace_o() {
        let (applied, labels) = apply_single(
            LabelOp::ReplaceO,
            &["John", "lives", "in", "Berlin"],
            &["B-PER", "O", "O", "B-LOC"],
            &["LOC", "PER"],
            0,
            0,
        );

        assert!(applied);
        assert_eq!(labels, vec!["O", "O", "O", "B-LOC"]);
    }

    #[test]
    fn test_shorten() {
        let (applied, labels) =
            apply_single(LabelOp::Shorten, &["a", "b"], &["B-LOC", "I-LOC"], &["LOC"], 0, 0);
        assert!(applied);
        assert_eq!(labels, vec!["B-LOC", "O"]);

        let (applied, labels) =
            apply_single(LabelOp::Shorten, &["Paris"], &["B-LOC"], &["LOC"], 0, 0);
        assert!(!applied);
        assert_eq!(labels, vec!["B-LOC"]);
    }

    #[test]
    fn test_extend() {
        let (applied, labels) = apply_single(
            LabelOp::Extend,
            &["Bank", "Austria", "reported"],
            &["B-ORG", "O", "O"],
            &["ORG"],
            0,
            0,
        );
        assert!(applied);
        assert_eq!(labels, vec!["B-ORG", "I-ORG", "O"]);

        let (applied, _) = apply_single(
            LabelOp::Extend,
            &["Paris", ","],
            &["B-LOC", "O"],
            &["LOC"],
            0,
            0,
        );
        assert!(!applied);

        let (applied, _) =
            apply_single(LabelOp::Extend, &["Paris"], &["B-LOC"], &["LOC"], 0, 0);
        assert!(!applied);
    }

    #[test]
    fn test_other_class_retypes_whole_span() {
        //        Given
        let tokens = ["the", "Bank", "of", "England"];
        let labels = ["O", "B-ORG", "I-ORG", "I-ORG"];

        for seed in 0..20 {
            //        When
            let (applied, output) = apply_single(
                LabelOp::OtherClass,
                &tokens,
                &labels,
                &["LOC", "MISC", "ORG", "PER"],
                0,
                seed,
            );

            //        Then
            assert!(applied);
            assert_eq!(output[0], "O");
            let new_type = output[1].strip_prefix("B-").unwrap().to_string();
            assert_ne!(new_type, "ORG");
            assert_eq!(output[2], format!("I-{}", new_type));
            assert_eq!(output[3], format!("I-{}", new_type));
            assert!(find_orphans(&output).is_empty());
        }

        let (applied, _) = apply_single(LabelOp::OtherClass, &tokens, &labels, &["ORG"], 0, 0);
        assert!(!applied);
    }

    #[test]
    fn test_token_to_entity() {
        let tokens = ["Merkel", "visited", "factories", "yesterday"];
        let labels = ["B-PER", "O", "O", "O"];

        for seed in 0..20 {
            let (applied, output) =
                apply_single(LabelOp::TokenToEntity, &tokens, &labels, &["LOC", "PER"], 0, seed);

            assert!(applied);
            assert_eq!(output[0], "B-PER");
            assert_eq!(extract_spans(&output).len(), 2);
            assert!(find_orphans(&output).is_empty());
        }

        let (applied, _) = apply_single(
            LabelOp::TokenToEntity,
            &["Merkel", "in", "."],
            &["B-PER", "O", "O"],
            &["LOC", "PER"],
            0,
            0,
        );
        assert!(!applied);
    }

    #[test]
    fn test_corrupt_labels_zero_rate_is_identity() {
        let tokens = strings(&["John", "lives", "in", "Berlin"]);
        let labels = strings(&["B-PER", "O", "O", "B-LOC"]);
        let config = LabelNoiseConfig {
            p: 0.0,
            ..Default::default()
        };

        let output = corrupt_labels(
            &tokens,
            &labels,
            &strings(&["LOC", "PER"]),
            &ProtectionPolicy::default(),
            &config,
            &mut StdRng::seed_from_u64(0),
        );

        assert_eq!(output, labels);
    }

    #[test]
    fn test_corrupt_labels_without_spans() {
        let tokens = strings(&["nothing", "here"]);
        let labels = strings(&["O", "O"]);

        let output = corrupt_labels(
            &tokens,
            &labels,
            &strings(&["LOC"]),
            &ProtectionPolicy::default(),
            &LabelNoiseConfig {
                p: 1.0,
                ..Default::default()
            },
            &mut StdRng::seed_from_u64(0),
        );

        assert_eq!(output, labels);
    }

    #[test]
    fn test_failing_operators_leave_span_unchanged() {
        //        Given
        let tokens = strings(&["Paris", "."]);
        let labels = strings(&["B-LOC", "O"]);
        let config = LabelNoiseConfig {
            p: 1.0,
            to_o_prob: None,
            ops: vec![LabelOp::Shorten, LabelOp::Extend, LabelOp::OtherClass],
            max_retries: 10,
        };

        //        When
        let output = corrupt_labels(
            &tokens,
            &labels,
            &strings(&["LOC"]),
            &ProtectionPolicy::default(),
            &config,
            &mut StdRng::seed_from_u64(4),
        );

        //        Then
        assert_eq!(output, labels);
    }

    #[test]
    fn test_at_least_one_span_is_corrupted() {
        let tokens = strings(&["Anna", "met", "Bob", "and", "Carla"]);
        let labels = strings(&["B-PER", "O", "B-PER", "O", "B-PER"]);
        let config = LabelNoiseConfig {
            p: 0.01,
            to_o_prob: None,
            ops: vec![LabelOp::ReplaceO],
            max_retries: 1,
        };

        let output = corrupt_labels(
            &tokens,
            &labels,
            &strings(&["PER"]),
            &ProtectionPolicy::default(),
            &config,
            &mut StdRng::seed_from_u64(8),
        );

        assert_eq!(extract_spans(&output).len(), 2);
    }

    #[test]
    fn test_to_o_prob_bias() {
        let config = LabelNoiseConfig {
            p: 1.0,
            to_o_prob: Some(1.0),
            ops: LabelOp::ALL.to_vec(),
            max_retries: 1,
        };
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..20 {
            assert_eq!(config.draw_op(&mut rng), Some(LabelOp::ReplaceO));
        }

        let config = LabelNoiseConfig {
            to_o_prob: Some(0.0),
            ..config
        };
        for _ in 0..20 {
            assert_ne!(config.draw_op(&mut rng), Some(LabelOp::ReplaceO));
        }
    }

    #[test]
    fn test_corrupt_spans_keeps_tokens_and_length() -> Result<(), NoiseError> {
        let label_map = LabelMap::from_entity_types(&["PER", "LOC", "ORG"])?;
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        let sequence = TaggedSequence::from_strs(
            &["Anna", "Smith", "works", "for", "Acme", "Corp", "in", "Berlin"],
            &["B-PER", "I-PER", "O", "O", "B-ORG", "I-ORG", "O", "B-LOC"],
            &label_map,
        )?;
        let config = LabelNoiseConfig {
            p: 1.0,
            ..Default::default()
        };

        for seed in 0..30 {
            let output = corrupt_spans(
                sequence.clone(),
                &context,
                &config,
                &mut StdRng::seed_from_u64(seed),
            )?;
            assert_eq!(output.tokens, sequence.tokens);
            assert_eq!(output.labels.len(), sequence.labels.len());
            assert!(find_orphans(&output.label_strings(&label_map)?).is_empty());
        }
        Ok(())
    }
}
