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

//!# Noise operators
//!
//! This module contains the operators perturbing tagged sequences. They are grouped in families:
//! - Orthographic: character-level edits inside a token (typos, case flips, diacritics, homoglyphs)
//! - Syntactic: structural edits changing the number of tokens (punctuation, whitespace, drop, swap)
//! - Semantic: replacement of content words using lexical, embedding or contextual services
//! - Label noise: corruption of entity spans, leaving tokens untouched
//!
//! Operators take the sequence by value and return the perturbed sequence. Tokens and labels stay
//! aligned through every edit, and protected tokens (see `ProtectionPolicy`) are never perturbed by
//! the token-level families. The registry maps profile step names to operators.

mod constants;
pub mod label_noise;
pub mod orthographic;
pub mod registry;
pub mod semantic;
pub mod syntactic;
pub(crate) mod utils;

pub use label_noise::{corrupt_spans, LabelNoiseConfig, LabelOp};
pub use registry::{LabelNoise, TokenNoise, LABEL_NOISE_KEYS, TOKEN_NOISE_KEYS};
pub use semantic::{SemanticResources, ServiceCache};
pub use syntactic::{syntactic_noise, AnchorPolicy};
pub use utils::{is_protected, EntityStrategy, NoiseContext, ProtectionPolicy};
