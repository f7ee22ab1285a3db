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

//! # Noise pipeline
//! Resolves a profile against the operator registries and applies the resulting steps to
//! examples: token steps first, then label steps, each class only on the splits of its scope and
//! strictly in declared order.

use crate::config::{NoiseProfile, Scope, Split};
use crate::error::NoiseError;
use crate::labels::LabelMap;
use crate::noise::registry::{LabelNoise, TokenNoise};
use crate::noise::semantic::SemanticResources;
use crate::noise::{NoiseContext, ProtectionPolicy};
use crate::TaggedSequence;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, warn};

/// Seed of the generator used for the example at `index` in parallel runs
fn example_seed(seed: u64, index: usize) -> u64 {
    seed ^ (index as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

#[derive(Debug)]
pub struct NoisePipeline {
    scope: Scope,
    token_steps: Vec<TokenNoise>,
    label_steps: Vec<LabelNoise>,
    label_map: LabelMap,
    policy: ProtectionPolicy,
    resources: SemanticResources,
}

impl NoisePipeline {
    /// Builds a pipeline from a profile. Every step is resolved and validated before returning,
    /// an unknown operator or invalid parameter fails the whole construction.
    ///
    /// # Arguments
    /// - profile (`&NoiseProfile`): noise profile
    /// - label_map (`LabelMap`): label alphabet of the dataset
    ///
    /// # Returns
    /// - `NoisePipeline` using the built-in static lexicon and no embedding or contextual model
    pub fn from_profile(
        profile: &NoiseProfile,
        label_map: LabelMap,
    ) -> Result<NoisePipeline, NoiseError> {
        let token_steps = profile
            .token_noise
            .iter()
            .map(TokenNoise::resolve)
            .collect::<Result<Vec<TokenNoise>, NoiseError>>()?;
        let label_steps = profile
            .label_noise
            .iter()
            .map(LabelNoise::resolve)
            .collect::<Result<Vec<LabelNoise>, NoiseError>>()?;
        info!(
            token_steps = ?token_steps.iter().map(TokenNoise::name).collect::<Vec<&str>>(),
            label_steps = ?label_steps.iter().map(LabelNoise::name).collect::<Vec<&str>>(),
            "noise pipeline resolved"
        );
        Ok(NoisePipeline {
            scope: profile.scope.clone(),
            token_steps,
            label_steps,
            label_map,
            policy: profile.protection,
            resources: SemanticResources::default(),
        })
    }

    /// Replaces the external services used by the semantic operators
    pub fn with_resources(mut self, resources: SemanticResources) -> NoisePipeline {
        self.resources = resources;
        self
    }

    pub fn label_map(&self) -> &LabelMap {
        &self.label_map
    }

    pub fn resources(&self) -> &SemanticResources {
        &self.resources
    }

    /// Loads every external model used by the semantic steps
    pub fn warm_up(&self) -> Result<(), NoiseError> {
        for step in &self.token_steps {
            if let TokenNoise::SemanticNoise(config) = step {
                self.resources.warm_up(config)?;
            }
        }
        Ok(())
    }

    fn context(&self) -> NoiseContext {
        NoiseContext::new(&self.label_map, self.policy)
    }

    /// Applies every token step in order, regardless of scope
    pub fn apply_token_noise<R: Rng + ?Sized>(
        &self,
        mut example: TaggedSequence,
        rng: &mut R,
    ) -> Result<TaggedSequence, NoiseError> {
        let context = self.context();
        for step in &self.token_steps {
            example = step.apply(example, &context, &self.resources, rng)?;
            example.validate()?;
            debug!(step = step.name(), length = example.len(), "token step applied");
        }
        Ok(example)
    }

    /// Applies every label step in order, regardless of scope
    pub fn apply_label_noise<R: Rng + ?Sized>(
        &self,
        mut example: TaggedSequence,
        rng: &mut R,
    ) -> Result<TaggedSequence, NoiseError> {
        let context = self.context();
        for step in &self.label_steps {
            example = step.apply(example, &context, rng)?;
            debug!(step = step.name(), "label step applied");
        }
        Ok(example)
    }

    /// Perturbs one example of `split`
    pub fn apply<R: Rng + ?Sized>(
        &self,
        mut example: TaggedSequence,
        split: Split,
        rng: &mut R,
    ) -> Result<TaggedSequence, NoiseError> {
        example.validate()?;
        if self.scope.token_noise_applies(split) {
            example = self.apply_token_noise(example, rng)?;
        }
        if self.scope.label_noise_applies(split) {
            example = self.apply_label_noise(example, rng)?;
        }
        Ok(example)
    }

    /// Perturbs the examples of a split one after the other with a shared generator. Output is
    /// reproducible for a given generator state and example order.
    pub fn apply_split<R: Rng + ?Sized>(
        &self,
        examples: Vec<TaggedSequence>,
        split: Split,
        rng: &mut R,
    ) -> Result<Vec<TaggedSequence>, NoiseError> {
        examples
            .into_iter()
            .map(|example| self.apply(example, split, rng))
            .collect()
    }

    /// Perturbs the examples of a split in parallel. Each example draws from its own generator
    /// seeded from `seed` and its index, so the output does not depend on thread scheduling.
    /// External models are loaded before dispatch. A model that fails to load does not abort the
    /// batch: the tokens it would have replaced are left unchanged.
    pub fn par_apply_split(
        &self,
        examples: Vec<TaggedSequence>,
        split: Split,
        seed: u64,
    ) -> Result<Vec<TaggedSequence>, NoiseError> {
        if let Err(error) = self.warm_up() {
            warn!(%error, "model warm-up failed");
        }
        examples
            .into_par_iter()
            .enumerate()
            .map(|(index, example)| {
                let mut rng = StdRng::seed_from_u64(example_seed(seed, index));
                self.apply(example, split, &mut rng)
            })
            .collect()
    }
}
