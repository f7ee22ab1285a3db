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

//! Name-to-operator resolution. Profiles refer to operators by registry key, every key is resolved
//! to a typed operator with validated parameters before any data is touched.

use crate::config::StepConfig;
use crate::error::NoiseError;
use crate::noise::label_noise::{corrupt_spans, LabelNoiseConfig};
use crate::noise::orthographic::{
    random_case_flip_tokens, strip_diacritics_tokens, typo_tokens, CaseFlipConfig,
    DiacriticsConfig, TypoConfig,
};
use crate::noise::semantic::{
    semantic_noise, synonym_substitute, SemanticConfig, SemanticResources,
};
use crate::noise::syntactic::{
    punct_delete, punct_insert, syntactic_noise, token_drop, token_swap_adjacent,
    whitespace_merge, RateConfig, SyntacticConfig,
};
use crate::noise::utils::NoiseContext;
use crate::TaggedSequence;
use rand::Rng;
use serde::de::DeserializeOwned;

pub const TOKEN_NOISE_KEYS: [&str; 11] = [
    "typo_tokens",
    "random_case_flip",
    "strip_diacritics",
    "token_drop",
    "token_swap_adjacent",
    "synonym_substitute",
    "semantic_noise",
    "punct_insert",
    "punct_delete",
    "whitespace_merge",
    "syntactic_noise",
];

pub const LABEL_NOISE_KEYS: [&str; 1] = ["label_spans_uniform"];

fn parse_params<T: DeserializeOwned + Default>(step: &StepConfig) -> Result<T, NoiseError> {
    if step.params.is_null() {
        return Ok(T::default());
    }
    serde_json::from_value(step.params.clone()).map_err(|e| {
        NoiseError::ConfigurationError(format!("invalid parameters for {}: {}", step.name, e))
    })
}

fn check_probability(step: &str, field: &str, value: f64) -> Result<(), NoiseError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(NoiseError::ConfigurationError(format!(
            "{}.{} must be a probability in [0, 1], got {}",
            step, field, value
        )))
    }
}

/// # Token-level noise step
/// A resolved token operator with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenNoise {
    TypoTokens(TypoConfig),
    RandomCaseFlip(CaseFlipConfig),
    StripDiacritics(DiacriticsConfig),
    TokenDrop(RateConfig),
    TokenSwapAdjacent(RateConfig),
    SynonymSubstitute(RateConfig),
    SemanticNoise(SemanticConfig),
    PunctInsert(RateConfig),
    PunctDelete(RateConfig),
    WhitespaceMerge(RateConfig),
    SyntacticNoise(SyntacticConfig),
}

impl TokenNoise {
    /// Resolves a profile step into a token operator.
    ///
    /// # Example
    ///
    /// ```
    /// use ner_noise::config::StepConfig;
    /// use ner_noise::noise::registry::TokenNoise;
    /// use serde_json::json;
    ///
    /// let step = StepConfig::new("token_drop", json!({ "p": 0.2 }));
    /// assert_eq!(TokenNoise::resolve(&step).unwrap().name(), "token_drop");
    ///
    /// let unknown = StepConfig::new("shuffle_everything", json!({}));
    /// assert!(TokenNoise::resolve(&unknown).is_err());
    /// ```
    pub fn resolve(step: &StepConfig) -> Result<TokenNoise, NoiseError> {
        let name = step.name.as_str();
        let noise = match name {
            "typo_tokens" => {
                let config: TypoConfig = parse_params(step)?;
                check_probability(name, "p", config.p)?;
                check_probability(name, "case_flip_prob", config.case_flip_prob)?;
                check_probability(name, "homoglyph_prob", config.homoglyph_prob)?;
                TokenNoise::TypoTokens(config)
            }
            "random_case_flip" => {
                let config: CaseFlipConfig = parse_params(step)?;
                check_probability(name, "p", config.p)?;
                check_probability(name, "prob", config.prob)?;
                TokenNoise::RandomCaseFlip(config)
            }
            "strip_diacritics" => {
                let config: DiacriticsConfig = parse_params(step)?;
                check_probability(name, "p", config.p)?;
                TokenNoise::StripDiacritics(config)
            }
            "semantic_noise" => {
                let config: SemanticConfig = parse_params(step)?;
                check_probability(name, "p", config.p)?;
                TokenNoise::SemanticNoise(config)
            }
            "syntactic_noise" => {
                let config: SyntacticConfig = parse_params(step)?;
                check_probability(name, "p", config.p)?;
                TokenNoise::SyntacticNoise(config)
            }
            "token_drop" | "token_swap_adjacent" | "synonym_substitute" | "punct_insert"
            | "punct_delete" | "whitespace_merge" => {
                let config: RateConfig = parse_params(step)?;
                check_probability(name, "p", config.p)?;
                match name {
                    "token_drop" => TokenNoise::TokenDrop(config),
                    "token_swap_adjacent" => TokenNoise::TokenSwapAdjacent(config),
                    "synonym_substitute" => TokenNoise::SynonymSubstitute(config),
                    "punct_insert" => TokenNoise::PunctInsert(config),
                    "punct_delete" => TokenNoise::PunctDelete(config),
                    _ => TokenNoise::WhitespaceMerge(config),
                }
            }
            _ => return Err(NoiseError::UnknownOperator(step.name.clone())),
        };
        Ok(noise)
    }

    /// Registry key of the operator
    pub fn name(&self) -> &'static str {
        match self {
            TokenNoise::TypoTokens(_) => "typo_tokens",
            TokenNoise::RandomCaseFlip(_) => "random_case_flip",
            TokenNoise::StripDiacritics(_) => "strip_diacritics",
            TokenNoise::TokenDrop(_) => "token_drop",
            TokenNoise::TokenSwapAdjacent(_) => "token_swap_adjacent",
            TokenNoise::SynonymSubstitute(_) => "synonym_substitute",
            TokenNoise::SemanticNoise(_) => "semantic_noise",
            TokenNoise::PunctInsert(_) => "punct_insert",
            TokenNoise::PunctDelete(_) => "punct_delete",
            TokenNoise::WhitespaceMerge(_) => "whitespace_merge",
            TokenNoise::SyntacticNoise(_) => "syntactic_noise",
        }
    }

    pub fn apply<R: Rng + ?Sized>(
        &self,
        sequence: TaggedSequence,
        context: &NoiseContext,
        resources: &SemanticResources,
        rng: &mut R,
    ) -> Result<TaggedSequence, NoiseError> {
        match self {
            TokenNoise::TypoTokens(config) => typo_tokens(sequence, context, config, rng),
            TokenNoise::RandomCaseFlip(config) => {
                random_case_flip_tokens(sequence, context, config, rng)
            }
            TokenNoise::StripDiacritics(config) => {
                strip_diacritics_tokens(sequence, context, config, rng)
            }
            TokenNoise::TokenDrop(config) => token_drop(sequence, context, config, rng),
            TokenNoise::TokenSwapAdjacent(config) => {
                token_swap_adjacent(sequence, context, config, rng)
            }
            TokenNoise::SynonymSubstitute(config) => {
                synonym_substitute(sequence, context, resources.lexical.as_ref(), config, rng)
            }
            TokenNoise::SemanticNoise(config) => {
                semantic_noise(sequence, context, resources, config, rng)
            }
            TokenNoise::PunctInsert(config) => punct_insert(sequence, context, config, rng),
            TokenNoise::PunctDelete(config) => punct_delete(sequence, context, config, rng),
            TokenNoise::WhitespaceMerge(config) => whitespace_merge(sequence, context, config, rng),
            TokenNoise::SyntacticNoise(config) => syntactic_noise(sequence, context, config, rng),
        }
    }
}

/// # Label-level noise step
#[derive(Debug, Clone, PartialEq)]
pub enum LabelNoise {
    LabelSpansUniform(LabelNoiseConfig),
}

impl LabelNoise {
    pub fn resolve(step: &StepConfig) -> Result<LabelNoise, NoiseError> {
        match step.name.as_str() {
            "label_spans_uniform" => {
                let config: LabelNoiseConfig = parse_params(step)?;
                check_probability(&step.name, "p", config.p)?;
                if let Some(to_o_prob) = config.to_o_prob {
                    check_probability(&step.name, "to_O_prob", to_o_prob)?;
                }
                Ok(LabelNoise::LabelSpansUniform(config))
            }
            _ => Err(NoiseError::UnknownOperator(step.name.clone())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            LabelNoise::LabelSpansUniform(_) => "label_spans_uniform",
        }
    }

    pub fn apply<R: Rng + ?Sized>(
        &self,
        sequence: TaggedSequence,
        context: &NoiseContext,
        rng: &mut R,
    ) -> Result<TaggedSequence, NoiseError> {
        match self {
            LabelNoise::LabelSpansUniform(config) => corrupt_spans(sequence, context, config, rng),
        }
    }
}
