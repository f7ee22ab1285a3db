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

use ner_noise::adapters::{read_conll, write_conll};
use ner_noise::config::{Config, NoiseProfile, Split};
use ner_noise::labels::LabelMap;
use ner_noise::{NoiseError, NoisePipeline};
use std::env;
use std::io::{self, BufWriter, Write};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: ner_noise <profile.json> <labels.json> <input.conll> <split> [seed]";

fn main() -> Result<(), NoiseError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(io::stderr)
        .init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.len() < 4 || args.len() > 5 {
        return Err(NoiseError::ConfigurationError(USAGE.to_string()));
    }
    let split: Split = args[3].parse()?;
    let seed = match args.get(4) {
        Some(seed) => seed.parse::<u64>().map_err(|e| {
            NoiseError::ConfigurationError(format!("invalid seed {}: {}", seed, e))
        })?,
        None => 42,
    };

    let profile = NoiseProfile::from_file(&args[0])?;
    let label_map = LabelMap::from_file(&args[1])?;
    let examples = read_conll(&args[2], &label_map)?;
    info!(examples = examples.len(), %split, seed, "dataset loaded");

    let pipeline = NoisePipeline::from_profile(&profile, label_map)?;
    let noisy = pipeline.par_apply_split(examples, split, seed)?;

    let stdout = io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    write_conll(&mut writer, &noisy, pipeline.label_map())?;
    writer.flush()?;
    Ok(())
}
