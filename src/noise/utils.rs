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
use crate::labels::{BioTag, LabelMap};
use crate::TaggedSequence;
use rand::seq::{index, SliceRandom};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// # Protection policy
/// Decides which tokens are immune to perturbation. Every operator filters its candidates
/// through the policy before touching a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProtectionPolicy {
    /// Tokens with at most this many characters are protected
    pub min_length: usize,
    /// Protect tokens containing at least one digit
    pub protect_digits: bool,
}

impl Default for ProtectionPolicy {
    fn default() -> Self {
        ProtectionPolicy {
            min_length: 2,
            protect_digits: false,
        }
    }
}

impl ProtectionPolicy {
    /// Returns true if the token must not be perturbed
    ///
    /// # Example
    ///
    /// ```
    /// use ner_noise::noise::ProtectionPolicy;
    ///
    /// let policy = ProtectionPolicy::default();
    /// assert!(policy.is_protected("in"));
    /// assert!(policy.is_protected("..."));
    /// assert!(!policy.is_protected("Berlin"));
    /// ```
    pub fn is_protected(&self, token: &str) -> bool {
        token.chars().count() <= self.min_length
            || !token.chars().any(char::is_alphanumeric)
            || (self.protect_digits && token.chars().any(|c| c.is_ascii_digit()))
    }
}

/// # Noise context
/// Read-only state shared by the operators while perturbing one example: the label alphabet and
/// the protection policy.
#[derive(Debug, Clone, Copy)]
pub struct NoiseContext<'a> {
    pub label_map: &'a LabelMap,
    pub policy: ProtectionPolicy,
}

impl<'a> NoiseContext<'a> {
    pub fn new(label_map: &'a LabelMap, policy: ProtectionPolicy) -> NoiseContext<'a> {
        NoiseContext { label_map, policy }
    }

    /// Id of the outside label `O`
    pub fn outside_id(&self) -> i64 {
        self.label_map.outside_id()
    }
}

/// Protection check with the default policy
pub fn is_protected(token: &str) -> bool {
    ProtectionPolicy::default().is_protected(token)
}

pub fn is_punctuation(character: &char) -> bool {
    let u32_char = *character as u32;
    (33..=47).contains(&u32_char)
        | (58..=64).contains(&u32_char)
        | (91..=96).contains(&u32_char)
        | (123..=126).contains(&u32_char)
        | (0x2010..=0x2027).contains(&u32_char)
        | (0x2030..=0x205E).contains(&u32_char)
        | ['¡', '¿', '«', '»', '§', '¶'].contains(character)
}

/// A token is a punctuation token if it is made of punctuation characters only
pub fn is_punctuation_token(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| is_punctuation(&c))
}

/// # Entity strategy
/// Controls whether noise avoids, targets, or ignores entity-labeled tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityStrategy {
    /// Only tokens labeled `O` are candidates
    Protect,
    /// Only tokens inside an entity are candidates
    EntitiesOnly,
    /// Entity membership is ignored
    All,
}

impl Default for EntityStrategy {
    fn default() -> Self {
        EntityStrategy::Protect
    }
}

impl EntityStrategy {
    pub fn admits(&self, is_entity: bool) -> bool {
        match self {
            EntityStrategy::Protect => !is_entity,
            EntityStrategy::EntitiesOnly => is_entity,
            EntityStrategy::All => true,
        }
    }
}

/// Positions of the tokens that are neither protected nor excluded by the entity strategy
pub fn candidate_positions(
    sequence: &TaggedSequence,
    label_map: &LabelMap,
    policy: &ProtectionPolicy,
    entity_strategy: EntityStrategy,
) -> Result<Vec<usize>, NoiseError> {
    let mut candidates = Vec::new();
    for (position, (token, label)) in sequence.tokens.iter().zip(&sequence.labels).enumerate() {
        if policy.is_protected(token) {
            continue;
        }
        if entity_strategy.admits(BioTag::parse(label_map.label(*label)?).is_entity()) {
            candidates.push(position);
        }
    }
    Ok(candidates)
}

/// Number of items to perturb out of `count` candidates for a rate `p`: `round(count * p)`,
/// capped at `count`. A non-positive rate always selects nothing.
pub fn selection_size(count: usize, p: f64) -> usize {
    if p <= 0.0 || count == 0 {
        return 0;
    }
    ((count as f64 * p).round() as usize).min(count)
}

/// Uniform sample of `amount` distinct elements of `pool`, in sampling order
pub fn sample_positions<R: Rng + ?Sized>(rng: &mut R, pool: &[usize], amount: usize) -> Vec<usize> {
    index::sample(rng, pool.len(), amount.min(pool.len()))
        .into_iter()
        .map(|i| pool[i])
        .collect()
}

/// Weighted sample without replacement of `amount` positions out of `(position, weight)` pairs.
/// Entries with a non-positive weight are never selected.
pub fn weighted_sample_positions<R: Rng + ?Sized>(
    rng: &mut R,
    weighted: &[(usize, f64)],
    amount: usize,
) -> Vec<usize> {
    let eligible: Vec<(usize, f64)> = weighted
        .iter()
        .filter(|(_, weight)| *weight > 0.0 && weight.is_finite())
        .cloned()
        .collect();
    let amount = amount.min(eligible.len());
    match eligible.choose_multiple_weighted(rng, amount, |(_, weight)| *weight) {
        Ok(selected) => selected.map(|(position, _)| *position).collect(),
        Err(e) => {
            warn!(error = %e, "invalid sampling weights, nothing selected");
            Vec::new()
        }
    }
}

/// Applies the case pattern of `original` (lower, Title or UPPER) to `replacement`
pub fn match_case(original: &str, replacement: &str) -> String {
    let letters: Vec<char> = original.chars().filter(|c| c.is_alphabetic()).collect();
    match letters.first() {
        None => replacement.to_string(),
        Some(_) if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) => {
            replacement.to_uppercase()
        }
        Some(first) if first.is_uppercase() => {
            let mut chars = replacement.chars();
            match chars.next() {
                Some(head) => head.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        }
        Some(_) => replacement.to_lowercase(),
    }
}
