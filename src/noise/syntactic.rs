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

//! Structural edits over a tagged sequence: punctuation insertion/deletion, whitespace
//! merge/split, token drop and adjacent swap.
//!
//! Every positional operator takes the sequence by value together with a position and returns
//! the edited sequence with the position the scan should resume from. Tokens, labels and POS
//! tags are edited together, and labels left without a valid `B-`/`I-` predecessor by an edit are
//! turned into `B-` labels so that well-formed BIO input stays well-formed.

use crate::error::NoiseError;
use crate::labels::label_map::{begin_label, inside_label};
use crate::labels::BioTag;
use crate::noise::constants::PUNCTUATION_TOKENS;
use crate::noise::utils::{
    is_punctuation_token, sample_positions, selection_size, NoiseContext, ProtectionPolicy,
};
use crate::TaggedSequence;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, trace};

/// # Syntactic operator variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntacticOp {
    PunctInsert,
    PunctDelete,
    WhitespaceMerge,
    WhitespaceSplit,
    TokenDrop,
    TokenSwapAdjacent,
}

impl SyntacticOp {
    pub const ALL: [SyntacticOp; 6] = [
        SyntacticOp::PunctInsert,
        SyntacticOp::PunctDelete,
        SyntacticOp::WhitespaceMerge,
        SyntacticOp::WhitespaceSplit,
        SyntacticOp::TokenDrop,
        SyntacticOp::TokenSwapAdjacent,
    ];

    /// Structural precondition of the operator at `index`. Drops, merges, splits and swaps
    /// never touch protected tokens.
    pub fn is_applicable(
        &self,
        sequence: &TaggedSequence,
        index: usize,
        policy: &ProtectionPolicy,
    ) -> bool {
        if index >= sequence.len() {
            return false;
        }
        let unprotected = |position: usize| !policy.is_protected(&sequence.tokens[position]);
        match self {
            SyntacticOp::PunctInsert => true,
            SyntacticOp::PunctDelete => {
                sequence.len() > 1 && is_punctuation_token(&sequence.tokens[index])
            }
            SyntacticOp::WhitespaceMerge | SyntacticOp::TokenSwapAdjacent => {
                index + 1 < sequence.len() && unprotected(index) && unprotected(index + 1)
            }
            SyntacticOp::WhitespaceSplit => {
                sequence.tokens[index].chars().count() >= 2 && unprotected(index)
            }
            SyntacticOp::TokenDrop => sequence.len() > 1 && unprotected(index),
        }
    }

    /// Applies the operator at `index`, returning the edited sequence and the resume position.
    /// If the precondition does not hold the sequence is returned unchanged with `index + 1`.
    pub fn apply<R: Rng + ?Sized>(
        &self,
        sequence: TaggedSequence,
        index: usize,
        context: &NoiseContext,
        rng: &mut R,
    ) -> Result<(TaggedSequence, usize), NoiseError> {
        match self {
            SyntacticOp::PunctInsert => punct_insert_at(sequence, index, context, rng),
            SyntacticOp::PunctDelete => punct_delete_at(sequence, index, context),
            SyntacticOp::WhitespaceMerge => whitespace_merge_at(sequence, index, context),
            SyntacticOp::WhitespaceSplit => whitespace_split_at(sequence, index, context, rng),
            SyntacticOp::TokenDrop => token_drop_at(sequence, index, context),
            SyntacticOp::TokenSwapAdjacent => token_swap_adjacent_at(sequence, index, context),
        }
    }
}

/// Rewrites orphan `I-<type>` labels at the given positions into `B-<type>`
fn repair_orphans(
    sequence: &mut TaggedSequence,
    positions: &[usize],
    context: &NoiseContext,
) -> Result<(), NoiseError> {
    for &position in positions {
        if position >= sequence.len() {
            continue;
        }
        let tag = BioTag::parse(context.label_map.label(sequence.labels[position])?);
        if let BioTag::Inside(entity_type) = tag {
            let continues = position > 0
                && tag.continues(&BioTag::parse(
                    context.label_map.label(sequence.labels[position - 1])?,
                ));
            if !continues {
                sequence.labels[position] = context.label_map.id(&begin_label(entity_type))?;
            }
        }
    }
    Ok(())
}

/// Inserts a random punctuation token labeled `O` right after `index`, resumes at `index + 2`
///
/// # Example
///
/// ```
/// use ner_noise::labels::LabelMap;
/// use ner_noise::noise::syntactic::punct_insert_at;
/// use ner_noise::noise::{NoiseContext, ProtectionPolicy};
/// use ner_noise::TaggedSequence;
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let label_map = LabelMap::from_entity_types(&["PER"]).unwrap();
/// let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
/// let sequence = TaggedSequence::from_strs(&["I", "go"], &["O", "O"], &label_map).unwrap();
///
/// let (sequence, next) =
///     punct_insert_at(sequence, 1, &context, &mut StdRng::seed_from_u64(0)).unwrap();
/// assert_eq!(sequence.len(), 3);
/// assert_eq!(next, 3);
/// ```
pub fn punct_insert_at<R: Rng + ?Sized>(
    mut sequence: TaggedSequence,
    index: usize,
    context: &NoiseContext,
    rng: &mut R,
) -> Result<(TaggedSequence, usize), NoiseError> {
    if !SyntacticOp::PunctInsert.is_applicable(&sequence, index, &context.policy) {
        return Ok((sequence, index + 1));
    }
    let punctuation = PUNCTUATION_TOKENS.choose(rng).copied().unwrap_or(",");
    sequence.insert(index + 1, punctuation.to_string(), context.outside_id());
    repair_orphans(&mut sequence, &[index + 2], context)?;
    Ok((sequence, index + 2))
}

/// Removes the punctuation token at `index`, resumes at `index`
pub fn punct_delete_at(
    mut sequence: TaggedSequence,
    index: usize,
    context: &NoiseContext,
) -> Result<(TaggedSequence, usize), NoiseError> {
    if !SyntacticOp::PunctDelete.is_applicable(&sequence, index, &context.policy) {
        return Ok((sequence, index + 1));
    }
    sequence.remove(index);
    repair_orphans(&mut sequence, &[index], context)?;
    Ok((sequence, index))
}

/// Concatenates the token following `index` into the token at `index`, dropping the label of the
/// absorbed token. Resumes at `index + 1`.
pub fn whitespace_merge_at(
    mut sequence: TaggedSequence,
    index: usize,
    context: &NoiseContext,
) -> Result<(TaggedSequence, usize), NoiseError> {
    if !SyntacticOp::WhitespaceMerge.is_applicable(&sequence, index, &context.policy) {
        return Ok((sequence, index + 1));
    }
    sequence.merge_with_next(index);
    repair_orphans(&mut sequence, &[index + 1], context)?;
    Ok((sequence, index + 1))
}

/// Splits the token at `index` at a random interior character boundary. The left part keeps the
/// original label, the right part continues the entity (`I-<type>`) or stays `O`.
/// Resumes at `index + 2`.
pub fn whitespace_split_at<R: Rng + ?Sized>(
    mut sequence: TaggedSequence,
    index: usize,
    context: &NoiseContext,
    rng: &mut R,
) -> Result<(TaggedSequence, usize), NoiseError> {
    if !SyntacticOp::WhitespaceSplit.is_applicable(&sequence, index, &context.policy) {
        return Ok((sequence, index + 1));
    }
    let char_count = sequence.tokens[index].chars().count();
    let cut = rng.gen_range(1..char_count);
    let right_label = match BioTag::parse(context.label_map.label(sequence.labels[index])?) {
        BioTag::Begin(entity_type) | BioTag::Inside(entity_type) => {
            context.label_map.id(&inside_label(entity_type))?
        }
        BioTag::Outside => context.outside_id(),
    };
    sequence.split(index, cut, right_label);
    Ok((sequence, index + 2))
}

/// Removes the token at `index` and its label, never emptying the sequence. Resumes at `index`.
pub fn token_drop_at(
    mut sequence: TaggedSequence,
    index: usize,
    context: &NoiseContext,
) -> Result<(TaggedSequence, usize), NoiseError> {
    if !SyntacticOp::TokenDrop.is_applicable(&sequence, index, &context.policy) {
        return Ok((sequence, index + 1));
    }
    sequence.remove(index);
    repair_orphans(&mut sequence, &[index], context)?;
    Ok((sequence, index))
}

/// Swaps the (token, label) pairs at `index` and `index + 1`, resumes at `index + 2`
pub fn token_swap_adjacent_at(
    mut sequence: TaggedSequence,
    index: usize,
    context: &NoiseContext,
) -> Result<(TaggedSequence, usize), NoiseError> {
    if !SyntacticOp::TokenSwapAdjacent.is_applicable(&sequence, index, &context.policy) {
        return Ok((sequence, index + 1));
    }
    sequence.swap(index, index + 1);
    repair_orphans(&mut sequence, &[index, index + 1, index + 2], context)?;
    Ok((sequence, index + 2))
}

/// # Anchor policy
/// How the positions selected by `syntactic_noise` are tracked while edits change the length of
/// the sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorPolicy {
    /// Positions are sampled once from the original sequence and kept as they are. Each one is
    /// matched against the live cursor and used at most once, even when earlier edits have
    /// shifted the tokens around it.
    Fixed,
    /// After every length-changing edit, the remaining anchors are re-sampled among the live
    /// positions from the resume position onwards.
    Resample,
}

impl Default for AnchorPolicy {
    fn default() -> Self {
        AnchorPolicy::Fixed
    }
}

/// # Syntactic noise configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntacticConfig {
    /// Fraction of the original positions used as edit anchors
    pub p: f64,
    pub ops: Vec<SyntacticOp>,
    pub anchor_policy: AnchorPolicy,
}

impl Default for SyntacticConfig {
    fn default() -> Self {
        SyntacticConfig {
            p: 0.1,
            ops: SyntacticOp::ALL.to_vec(),
            anchor_policy: AnchorPolicy::Fixed,
        }
    }
}

/// Applies structural edits at `round(N * p)` anchor positions sampled without replacement from
/// the original sequence of length `N`.
///
/// A single left-to-right pass visits the live positions. At an anchor, one operator is drawn
/// uniformly from the configured set; if its precondition holds it is applied and the pass resumes
/// from the position it returns, otherwise the anchor is skipped. Other positions advance by one.
/// The number of affected tokens after the pass may differ from `N * p`.
pub fn syntactic_noise<R: Rng + ?Sized>(
    mut sequence: TaggedSequence,
    context: &NoiseContext,
    config: &SyntacticConfig,
    rng: &mut R,
) -> Result<TaggedSequence, NoiseError> {
    let amount = selection_size(sequence.len(), config.p);
    if amount == 0 || config.ops.is_empty() {
        return Ok(sequence);
    }
    let original_positions: Vec<usize> = (0..sequence.len()).collect();
    let mut anchors: HashSet<usize> = sample_positions(rng, &original_positions, amount)
        .into_iter()
        .collect();
    let mut applied = 0usize;
    let mut index = 0;
    while index < sequence.len() && !anchors.is_empty() {
        if !anchors.remove(&index) {
            index += 1;
            continue;
        }
        let op = match config.ops.choose(rng) {
            Some(op) => *op,
            None => break,
        };
        if !op.is_applicable(&sequence, index, &context.policy) {
            trace!(index, ?op, "precondition not met, anchor skipped");
            index += 1;
            continue;
        }
        let previous_length = sequence.len() as isize;
        let (edited, next_index) = op.apply(sequence, index, context, rng)?;
        sequence = edited;
        let length_change = sequence.len() as isize - previous_length;
        anchors = match config.anchor_policy {
            AnchorPolicy::Fixed => anchors
                .into_iter()
                .filter(|anchor| *anchor >= next_index)
                .collect(),
            AnchorPolicy::Resample if length_change != 0 => {
                let live_positions: Vec<usize> = (next_index..sequence.len()).collect();
                sample_positions(rng, &live_positions, anchors.len())
                    .into_iter()
                    .collect()
            }
            AnchorPolicy::Resample => anchors,
        };
        trace!(index, next_index, ?op, "syntactic edit applied");
        applied += 1;
        index = next_index;
    }
    debug!(requested = amount, applied, "syntactic noise");
    Ok(sequence)
}

/// # Rate configuration
/// Per-position probability used by the standalone structural operators
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RateConfig {
    pub p: f64,
}

impl Default for RateConfig {
    fn default() -> Self {
        RateConfig { p: 0.05 }
    }
}

/// Visits every live position once and applies `op` with probability `p` where its
/// precondition holds
pub fn scan_with<R: Rng + ?Sized>(
    mut sequence: TaggedSequence,
    op: SyntacticOp,
    p: f64,
    context: &NoiseContext,
    rng: &mut R,
) -> Result<TaggedSequence, NoiseError> {
    if p <= 0.0 {
        return Ok(sequence);
    }
    let p = p.min(1.0);
    let mut index = 0;
    while index < sequence.len() {
        if op.is_applicable(&sequence, index, &context.policy) && rng.gen_bool(p) {
            let (edited, next_index) = op.apply(sequence, index, context, rng)?;
            sequence = edited;
            index = next_index;
        } else {
            index += 1;
        }
    }
    Ok(sequence)
}

/// Inserts a punctuation token after each position with probability `p`
pub fn punct_insert<R: Rng + ?Sized>(
    sequence: TaggedSequence,
    context: &NoiseContext,
    config: &RateConfig,
    rng: &mut R,
) -> Result<TaggedSequence, NoiseError> {
    scan_with(sequence, SyntacticOp::PunctInsert, config.p, context, rng)
}

/// Removes each punctuation token with probability `p`
pub fn punct_delete<R: Rng + ?Sized>(
    sequence: TaggedSequence,
    context: &NoiseContext,
    config: &RateConfig,
    rng: &mut R,
) -> Result<TaggedSequence, NoiseError> {
    scan_with(sequence, SyntacticOp::PunctDelete, config.p, context, rng)
}

/// Merges each position with its successor with probability `p`
pub fn whitespace_merge<R: Rng + ?Sized>(
    sequence: TaggedSequence,
    context: &NoiseContext,
    config: &RateConfig,
    rng: &mut R,
) -> Result<TaggedSequence, NoiseError> {
    scan_with(sequence, SyntacticOp::WhitespaceMerge, config.p, context, rng)
}

/// Drops each token with probability `p`, keeping at least one token
pub fn token_drop<R: Rng + ?Sized>(
    sequence: TaggedSequence,
    context: &NoiseContext,
    config: &RateConfig,
    rng: &mut R,
) -> Result<TaggedSequence, NoiseError> {
    scan_with(sequence, SyntacticOp::TokenDrop, config.p, context, rng)
}

/// Swaps each position with its successor with probability `p`
pub fn token_swap_adjacent<R: Rng + ?Sized>(
    sequence: TaggedSequence,
    context: &NoiseContext,
    config: &RateConfig,
    rng: &mut R,
) -> Result<TaggedSequence, NoiseError> {
    scan_with(sequence, SyntacticOp::TokenSwapAdjacent, config.p, context, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::{find_orphans, LabelMap};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn label_map() -> LabelMap {
        LabelMap::from_entity_types(&["PER", "LOC"]).unwrap()
    }

    fn labels_of(sequence: &TaggedSequence, label_map: &LabelMap) -> Vec<String> {
        sequence.label_strings(label_map).unwrap()
    }

    #[test]
    fn test_punct_insert_at() -> Result<(), NoiseError> {
        //        Given
        let label_map = label_map();
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        let sequence = TaggedSequence::from_strs(&["I", "go"], &["O", "O"], &label_map)?;
        let mut rng = StdRng::seed_from_u64(0);

        //        When
        let (output, next) = punct_insert_at(sequence, 1, &context, &mut rng)?;

        //        Then
        assert_eq!(output.len(), 3);
        assert_eq!(next, 3);
        assert_eq!(&output.tokens[..2], &["I", "go"]);
        assert!(PUNCTUATION_TOKENS.contains(&output.tokens[2].as_str()));
        assert_eq!(labels_of(&output, &label_map), vec!["O", "O", "O"]);
        Ok(())
    }

    #[test]
    fn test_punct_insert_inside_entity_keeps_bio() -> Result<(), NoiseError> {
        let label_map = label_map();
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        let sequence =
            TaggedSequence::from_strs(&["New", "York"], &["B-LOC", "I-LOC"], &label_map)?;

        let (output, next) = punct_insert_at(sequence, 0, &context, &mut StdRng::seed_from_u64(0))?;

        assert_eq!(next, 2);
        assert_eq!(labels_of(&output, &label_map), vec!["B-LOC", "O", "B-LOC"]);
        Ok(())
    }

    #[test]
    fn test_punct_delete_at() -> Result<(), NoiseError> {
        let label_map = label_map();
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        let sequence =
            TaggedSequence::from_strs(&["Hello", ",", "Anna"], &["O", "O", "B-PER"], &label_map)?;

        let (unchanged, next) = punct_delete_at(sequence.clone(), 0, &context)?;
        assert_eq!(unchanged, sequence);
        assert_eq!(next, 1);

        let (output, next) = punct_delete_at(sequence, 1, &context)?;
        assert_eq!(output.tokens, vec!["Hello", "Anna"]);
        assert_eq!(labels_of(&output, &label_map), vec!["O", "B-PER"]);
        assert_eq!(next, 1);
        Ok(())
    }

    #[test]
    fn test_whitespace_merge_at() -> Result<(), NoiseError> {
        let label_map = label_map();
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        let sequence = TaggedSequence::from_strs(
            &["into", "New", "York"],
            &["O", "B-LOC", "I-LOC"],
            &label_map,
        )?;

        let (output, next) = whitespace_merge_at(sequence, 0, &context)?;

        assert_eq!(output.tokens, vec!["intoNew", "York"]);
        assert_eq!(labels_of(&output, &label_map), vec!["O", "B-LOC"]);
        assert_eq!(next, 1);

        let (output, next) = whitespace_merge_at(output, 1, &context)?;
        assert_eq!(output.len(), 2);
        assert_eq!(next, 2);
        Ok(())
    }

    #[test]
    fn test_whitespace_split_at() -> Result<(), NoiseError> {
        //        Given
        let label_map = label_map();
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        let sequence =
            TaggedSequence::from_strs(&["Berlin", "calling"], &["B-LOC", "O"], &label_map)?;
        let mut rng = StdRng::seed_from_u64(21);

        //        When
        let (output, next) = whitespace_split_at(sequence.clone(), 0, &context, &mut rng)?;
        let (outside_split, _) = whitespace_split_at(sequence, 1, &context, &mut rng)?;

        //        Then
        assert_eq!(next, 2);
        assert_eq!(output.len(), 3);
        assert_eq!(format!("{}{}", output.tokens[0], output.tokens[1]), "Berlin");
        assert!(!output.tokens[0].is_empty() && !output.tokens[1].is_empty());
        assert_eq!(labels_of(&output, &label_map), vec!["B-LOC", "I-LOC", "O"]);
        assert_eq!(labels_of(&outside_split, &label_map), vec!["B-LOC", "O", "O"]);
        Ok(())
    }

    #[test]
    fn test_whitespace_split_requires_two_characters() -> Result<(), NoiseError> {
        let label_map = label_map();
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        let sequence = TaggedSequence::from_strs(&["a"], &["O"], &label_map)?;

        let (output, next) =
            whitespace_split_at(sequence.clone(), 0, &context, &mut StdRng::seed_from_u64(0))?;

        assert_eq!(output, sequence);
        assert_eq!(next, 1);
        Ok(())
    }

    #[test]
    fn test_token_drop_at() -> Result<(), NoiseError> {
        let label_map = label_map();
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        let sequence = TaggedSequence::from_strs(
            &["Rio", "de", "Janeiro"],
            &["B-LOC", "I-LOC", "I-LOC"],
            &label_map,
        )?;

        let (output, next) = token_drop_at(sequence, 0, &context)?;
        assert_eq!(output.tokens, vec!["de", "Janeiro"]);
        assert_eq!(labels_of(&output, &label_map), vec!["B-LOC", "I-LOC"]);
        assert_eq!(next, 0);

        let single = TaggedSequence::from_strs(&["Rio"], &["B-LOC"], &label_map)?;
        let (output, next) = token_drop_at(single.clone(), 0, &context)?;
        assert_eq!(output, single);
        assert_eq!(next, 1);
        Ok(())
    }

    #[test]
    fn test_token_swap_adjacent_at() -> Result<(), NoiseError> {
        let label_map = label_map();
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        let sequence = TaggedSequence::from_strs(
            &["met", "Anna", "Smith"],
            &["O", "B-PER", "I-PER"],
            &label_map,
        )?;

        let (output, next) = token_swap_adjacent_at(sequence.clone(), 0, &context)?;
        assert_eq!(output.tokens, vec!["Anna", "met", "Smith"]);
        assert_eq!(labels_of(&output, &label_map), vec!["B-PER", "O", "B-PER"]);
        assert_eq!(next, 2);

        let (output, _) = token_swap_adjacent_at(sequence, 1, &context)?;
        assert_eq!(output.tokens, vec!["met", "Smith", "Anna"]);
        assert_eq!(labels_of(&output, &label_map), vec!["O", "B-PER", "B-PER"]);
        Ok(())
    }

    #[test]
    fn test_fixed_anchors_keep_original_positions() -> Result<(), NoiseError> {
        //        Given
        let label_map = label_map();
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        let sequence = TaggedSequence::from_strs(
            &["alpha", "beta", "gamma", "delta", "epsilon", "zeta"],
            &["O", "O", "O", "O", "O", "O"],
            &label_map,
        )?;
        let config = SyntacticConfig {
            p: 0.5,
            ops: vec![SyntacticOp::PunctInsert],
            anchor_policy: AnchorPolicy::Fixed,
        };
        let original_positions: Vec<usize> = (0..sequence.len()).collect();

        for seed in 0..20 {
            let anchors: HashSet<usize> =
                sample_positions(&mut StdRng::seed_from_u64(seed), &original_positions, 3)
                    .into_iter()
                    .collect();

            //        When
            let output = syntactic_noise(
                sequence.clone(),
                &context,
                &config,
                &mut StdRng::seed_from_u64(seed),
            )?;

            //        Then
            let inserted_after: Vec<usize> = output
                .tokens
                .iter()
                .enumerate()
                .filter(|(_, token)| is_punctuation_token(token))
                .map(|(position, _)| position - 1)
                .collect();
            assert!(!inserted_after.is_empty());
            assert!(inserted_after.len() <= anchors.len());
            for position in inserted_after.iter() {
                assert!(anchors.contains(position));
            }
            let first_anchor = anchors.iter().min().copied().unwrap_or_default();
            assert!(inserted_after.contains(&first_anchor));
        }
        Ok(())
    }

    #[test]
    fn test_syntactic_noise_keeps_parity_and_bio() -> Result<(), NoiseError> {
        //        Given
        let label_map = label_map();
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        let sequence = TaggedSequence::from_strs(
            &["Yesterday", ",", "Anna", "Smith", "flew", "to", "New", "York", "."],
            &["O", "O", "B-PER", "I-PER", "O", "O", "B-LOC", "I-LOC", "O"],
            &label_map,
        )?;

        for policy in [AnchorPolicy::Fixed, AnchorPolicy::Resample].iter() {
            for seed in 0..50 {
                let config = SyntacticConfig {
                    p: 0.5,
                    ops: SyntacticOp::ALL.to_vec(),
                    anchor_policy: *policy,
                };

                //        When
                let output = syntactic_noise(
                    sequence.clone(),
                    &context,
                    &config,
                    &mut StdRng::seed_from_u64(seed),
                )?;

                //        Then
                output.validate()?;
                assert!(!output.is_empty());
                assert!(find_orphans(&labels_of(&output, &label_map)).is_empty());
            }
        }
        Ok(())
    }

    #[test]
    fn test_syntactic_noise_zero_rate_is_identity() -> Result<(), NoiseError> {
        let label_map = label_map();
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        let sequence =
            TaggedSequence::from_strs(&["Anna", "sings", "."], &["B-PER", "O", "O"], &label_map)?;
        let config = SyntacticConfig {
            p: 0.0,
            ..Default::default()
        };

        let output = syntactic_noise(
            sequence.clone(),
            &context,
            &config,
            &mut StdRng::seed_from_u64(3),
        )?;

        assert_eq!(output, sequence);
        Ok(())
    }

    #[test]
    fn test_token_drop_never_empties() -> Result<(), NoiseError> {
        let label_map = label_map();
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        let sequence = TaggedSequence::from_strs(
            &["alpha", "beta", "gamma"],
            &["O", "O", "O"],
            &label_map,
        )?;

        let output = token_drop(
            sequence,
            &context,
            &RateConfig { p: 1.0 },
            &mut StdRng::seed_from_u64(0),
        )?;

        assert_eq!(output.tokens, vec!["gamma"]);
        Ok(())
    }

    #[test]
    fn test_punct_insert_full_rate() -> Result<(), NoiseError> {
        let label_map = label_map();
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        let sequence =
            TaggedSequence::from_strs(&["Anna", "sings"], &["B-PER", "O"], &label_map)?;

        let output = punct_insert(
            sequence,
            &context,
            &RateConfig { p: 1.0 },
            &mut StdRng::seed_from_u64(0),
        )?;

        assert_eq!(output.len(), 4);
        assert_eq!(output.tokens[0], "Anna");
        assert_eq!(output.tokens[2], "sings");
        assert_eq!(labels_of(&output, &label_map), vec!["B-PER", "O", "O", "O"]);
        Ok(())
    }

    #[test]
    fn test_whitespace_merge_full_rate() -> Result<(), NoiseError> {
        let label_map = label_map();
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        let sequence = TaggedSequence::from_strs(
            &["one", "two", "three", "four", "five"],
            &["O", "O", "O", "O", "O"],
            &label_map,
        )?;

        let output = whitespace_merge(
            sequence,
            &context,
            &RateConfig { p: 1.0 },
            &mut StdRng::seed_from_u64(0),
        )?;

        assert_eq!(output.tokens, vec!["onetwo", "threefour", "five"]);
        Ok(())
    }
}
