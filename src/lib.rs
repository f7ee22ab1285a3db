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

//! Noise injection for BIO-tagged named-entity datasets.
//!
//! The crate perturbs token sequences and their aligned BIO labels to produce noisy variants of
//! a dataset for robustness testing of sequence-labeling models. Perturbations are declared in a
//! noise profile as ordered, named steps:
//! - token noise (orthographic, syntactic and semantic operators) alters the text while keeping
//! labels aligned through insertions, deletions, merges and splits
//! - label noise corrupts entity spans (shortening, extension, removal, retyping, spurious
//! entities) while keeping the tokens untouched
//!
//! Both classes keep well-formed BIO label sequences well-formed.
//!
//! ```no_run
//! use ner_noise::config::{Config, NoiseProfile, Split};
//! use ner_noise::labels::LabelMap;
//! use ner_noise::pipeline::NoisePipeline;
//! use ner_noise::adapters::read_conll;
//! # fn main() -> Result<(), ner_noise::NoiseError> {
//! let profile = NoiseProfile::from_file("path/to/profile.json")?;
//! let label_map = LabelMap::from_file("path/to/labels.json")?;
//! let examples = read_conll("path/to/test.conll", &label_map)?;
//!
//! let pipeline = NoisePipeline::from_profile(&profile, label_map)?;
//! let noisy = pipeline.par_apply_split(examples, Split::Test, 42)?;
//! assert!(!noisy.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod config;
pub mod error;
pub mod labels;
pub mod noise;
pub mod pipeline;
mod sequence;

pub use error::NoiseError;
pub use pipeline::NoisePipeline;
pub use sequence::TaggedSequence;

#[macro_use]
extern crate lazy_static;
