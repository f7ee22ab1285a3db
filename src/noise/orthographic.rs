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

//! Character-level mutations of single tokens (typos, casing, diacritics, homoglyphs) and the
//! sequence-level composers selecting which tokens to mutate. Tokens are replaced one for one,
//! the sequence length never changes.

use crate::error::NoiseError;
use crate::noise::constants::{
    HOMOGLYPHS, KEYBOARD_NEIGHBORS, LEGACY_ENCODING_FIXES, UNDECOMPOSABLE_LETTERS,
};
use crate::noise::utils::{
    candidate_positions, sample_positions, selection_size, EntityStrategy, NoiseContext,
};
use crate::TaggedSequence;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;
use unicode_normalization::char::{decompose_canonical, is_combining_mark};
use unicode_normalization::UnicodeNormalization;

/// # Orthographic operator variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrthographicOp {
    /// Swap two adjacent interior characters
    SwapAdjacent,
    /// Delete a character
    DeleteChar,
    /// Insert a keyboard neighbour of a character
    InsertChar,
    /// Replace a character by one of its keyboard neighbours
    SubstituteChar,
    /// Flip the case of letters independently
    RandomCaseFlip,
    /// Remove accents and transliterate non-decomposable letters
    StripDiacritics,
    /// Replace characters by visually confusable ones
    SubstituteHomoglyph,
}

impl OrthographicOp {
    /// Operators used by `typo_tokens` when none are configured
    pub const TYPOS: [OrthographicOp; 4] = [
        OrthographicOp::SwapAdjacent,
        OrthographicOp::DeleteChar,
        OrthographicOp::InsertChar,
        OrthographicOp::SubstituteChar,
    ];

    pub fn apply<R: Rng + ?Sized>(&self, word: &str, config: &TypoConfig, rng: &mut R) -> String {
        match self {
            OrthographicOp::SwapAdjacent => swap_adjacent(word, rng),
            OrthographicOp::DeleteChar => delete_char(word, rng),
            OrthographicOp::InsertChar => insert_char(word, rng),
            OrthographicOp::SubstituteChar => substitute_char(word, rng),
            OrthographicOp::RandomCaseFlip => random_case_flip(word, config.case_flip_prob, rng),
            OrthographicOp::StripDiacritics => strip_diacritics(word),
            OrthographicOp::SubstituteHomoglyph => {
                substitute_homoglyph(word, config.homoglyph_prob, rng)
            }
        }
    }
}

fn keyboard_neighbors(character: char) -> Option<&'static str> {
    character
        .to_lowercase()
        .next()
        .and_then(|lower| KEYBOARD_NEIGHBORS.get(&lower).copied())
}

fn with_case_of(original: char, replacement: char) -> String {
    if original.is_uppercase() {
        replacement.to_uppercase().collect()
    } else {
        replacement.to_string()
    }
}

/// Swaps two adjacent characters, never touching the first one. Words shorter than 4
/// characters are returned unchanged.
pub fn swap_adjacent<R: Rng + ?Sized>(word: &str, rng: &mut R) -> String {
    let mut chars: Vec<char> = word.chars().collect();
    if chars.len() < 4 {
        return word.to_string();
    }
    let i = rng.gen_range(1..chars.len() - 1);
    chars.swap(i, i + 1);
    chars.into_iter().collect()
}

/// Deletes a random character. Words of 3 characters or less are returned unchanged.
pub fn delete_char<R: Rng + ?Sized>(word: &str, rng: &mut R) -> String {
    let mut chars: Vec<char> = word.chars().collect();
    if chars.len() <= 3 {
        return word.to_string();
    }
    chars.remove(rng.gen_range(0..chars.len()));
    chars.into_iter().collect()
}

/// Inserts a keyboard neighbour of a random character right before it
pub fn insert_char<R: Rng + ?Sized>(word: &str, rng: &mut R) -> String {
    let chars: Vec<char> = word.chars().collect();
    if chars.is_empty() {
        return word.to_string();
    }
    let i = rng.gen_range(0..chars.len());
    let neighbors: Vec<char> = match keyboard_neighbors(chars[i]) {
        Some(neighbors) => neighbors.chars().collect(),
        None => return word.to_string(),
    };
    let inserted = match neighbors.choose(rng) {
        Some(inserted) => with_case_of(chars[i], *inserted),
        None => return word.to_string(),
    };
    let mut output: String = chars[..i].iter().collect();
    output.push_str(&inserted);
    output.extend(&chars[i..]);
    output
}

/// Replaces a random character having keyboard neighbours by one of them
pub fn substitute_char<R: Rng + ?Sized>(word: &str, rng: &mut R) -> String {
    let chars: Vec<char> = word.chars().collect();
    let candidates: Vec<usize> = chars
        .iter()
        .enumerate()
        .filter(|(_, character)| keyboard_neighbors(**character).is_some())
        .map(|(position, _)| position)
        .collect();
    let i = match candidates.choose(rng) {
        Some(i) => *i,
        None => return word.to_string(),
    };
    let neighbors: Vec<char> = keyboard_neighbors(chars[i])
        .map(|neighbors| neighbors.chars().collect())
        .unwrap_or_default();
    let replacement = match neighbors.choose(rng) {
        Some(replacement) => with_case_of(chars[i], *replacement),
        None => return word.to_string(),
    };
    let mut output: String = chars[..i].iter().collect();
    output.push_str(&replacement);
    output.extend(&chars[i + 1..]);
    output
}

/// Flips the case of each character independently with probability `prob`
pub fn random_case_flip<R: Rng + ?Sized>(word: &str, prob: f64, rng: &mut R) -> String {
    let prob = prob.max(0.0).min(1.0);
    let mut output = String::with_capacity(word.len());
    for character in word.chars() {
        if rng.gen_bool(prob) {
            if character.is_uppercase() {
                output.extend(character.to_lowercase());
            } else {
                output.extend(character.to_uppercase());
            }
        } else {
            output.push(character);
        }
    }
    output
}

/// Removes diacritics: repairs double-encoded UTF-8 sequences, decomposes each character
/// canonically, drops the combining marks, transliterates letters without a decomposition and
/// recomposes the result (NFC).
///
/// # Example
///
/// ```
/// use ner_noise::noise::orthographic::strip_diacritics;
///
/// assert_eq!(strip_diacritics("Düsseldorf"), "Dusseldorf");
/// assert_eq!(strip_diacritics("Straße"), "Strasse");
/// assert_eq!(strip_diacritics("MÃ¼nchen"), "Munchen");
/// ```
pub fn strip_diacritics(word: &str) -> String {
    let mut repaired = word.to_string();
    for (pattern, replacement) in LEGACY_ENCODING_FIXES.iter() {
        if repaired.contains(pattern) {
            repaired = repaired.replace(pattern, replacement);
        }
    }
    let mut decomposed = String::with_capacity(repaired.len());
    for character in repaired.chars() {
        decompose_canonical(character, |c| {
            if is_combining_mark(c) {
                return;
            }
            match UNDECOMPOSABLE_LETTERS.get(&c) {
                Some(transliteration) => decomposed.push_str(transliteration),
                None => decomposed.push(c),
            }
        });
    }
    decomposed.nfc().collect()
}

/// Replaces each character having homoglyphs with probability `prob`
pub fn substitute_homoglyph<R: Rng + ?Sized>(word: &str, prob: f64, rng: &mut R) -> String {
    let prob = prob.max(0.0).min(1.0);
    let mut output = String::with_capacity(word.len());
    for character in word.chars() {
        let substitute = match HOMOGLYPHS.get(&character) {
            Some(homoglyphs) if rng.gen_bool(prob) => {
                let homoglyphs: Vec<char> = homoglyphs.chars().collect();
                homoglyphs.choose(rng).copied()
            }
            _ => None,
        };
        output.push(substitute.unwrap_or(character));
    }
    output
}

/// # Typo noise configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypoConfig {
    /// Fraction of the candidate tokens to perturb
    pub p: f64,
    pub entity_strategy: EntityStrategy,
    /// Operators drawn uniformly for each selected token
    pub ops: Vec<OrthographicOp>,
    /// Per-character flip probability used by `random_case_flip`
    pub case_flip_prob: f64,
    /// Per-character substitution probability used by `substitute_homoglyph`
    pub homoglyph_prob: f64,
}

impl Default for TypoConfig {
    fn default() -> Self {
        TypoConfig {
            p: 0.1,
            entity_strategy: EntityStrategy::Protect,
            ops: OrthographicOp::TYPOS.to_vec(),
            case_flip_prob: 0.3,
            homoglyph_prob: 0.3,
        }
    }
}

/// Replaces `round(len(candidates) * p)` randomly chosen candidate tokens by `mutate(token)`
pub(crate) fn perturb_candidates<R, F>(
    mut sequence: TaggedSequence,
    context: &NoiseContext,
    p: f64,
    entity_strategy: EntityStrategy,
    rng: &mut R,
    mut mutate: F,
) -> Result<TaggedSequence, NoiseError>
where
    R: Rng + ?Sized,
    F: FnMut(&str, &mut R) -> String,
{
    let candidates =
        candidate_positions(&sequence, context.label_map, &context.policy, entity_strategy)?;
    let amount = selection_size(candidates.len(), p);
    if amount == 0 {
        return Ok(sequence);
    }
    let mut selected = sample_positions(rng, &candidates, amount);
    selected.sort_unstable();
    for position in selected {
        let perturbed = mutate(&sequence.tokens[position], rng);
        trace!(position, original = %sequence.tokens[position], %perturbed, "token perturbed");
        sequence.tokens[position] = perturbed;
    }
    Ok(sequence)
}

/// Applies one randomly drawn orthographic operator to each selected token.
///
/// Candidates are the unprotected tokens admitted by the entity strategy, `round(len(candidates) * p)`
/// of them are sampled without replacement.
pub fn typo_tokens<R: Rng + ?Sized>(
    sequence: TaggedSequence,
    context: &NoiseContext,
    config: &TypoConfig,
    rng: &mut R,
) -> Result<TaggedSequence, NoiseError> {
    if config.ops.is_empty() {
        return Ok(sequence);
    }
    perturb_candidates(
        sequence,
        context,
        config.p,
        config.entity_strategy,
        rng,
        |token, rng| match config.ops.choose(rng) {
            Some(op) => op.apply(token, config, rng),
            None => token.to_string(),
        },
    )
}

/// # Case flip noise configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaseFlipConfig {
    pub p: f64,
    /// Per-character flip probability
    pub prob: f64,
    pub entity_strategy: EntityStrategy,
}

impl Default for CaseFlipConfig {
    fn default() -> Self {
        CaseFlipConfig {
            p: 0.1,
            prob: 0.3,
            entity_strategy: EntityStrategy::Protect,
        }
    }
}

pub fn random_case_flip_tokens<R: Rng + ?Sized>(
    sequence: TaggedSequence,
    context: &NoiseContext,
    config: &CaseFlipConfig,
    rng: &mut R,
) -> Result<TaggedSequence, NoiseError> {
    perturb_candidates(
        sequence,
        context,
        config.p,
        config.entity_strategy,
        rng,
        |token, rng| random_case_flip(token, config.prob, rng),
    )
}

/// # Diacritics noise configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiacriticsConfig {
    pub p: f64,
    pub entity_strategy: EntityStrategy,
}

impl Default for DiacriticsConfig {
    fn default() -> Self {
        DiacriticsConfig {
            p: 1.0,
            entity_strategy: EntityStrategy::All,
        }
    }
}

pub fn strip_diacritics_tokens<R: Rng + ?Sized>(
    sequence: TaggedSequence,
    context: &NoiseContext,
    config: &DiacriticsConfig,
    rng: &mut R,
) -> Result<TaggedSequence, NoiseError> {
    perturb_candidates(
        sequence,
        context,
        config.p,
        config.entity_strategy,
        rng,
        |token, _| strip_diacritics(token),
    )
}
