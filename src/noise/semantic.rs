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

//! Meaning-level token replacement backed by external lexical, embedding and masked-fill
//! services. The services are consumed through traits and injected with `SemanticResources`.

use crate::error::NoiseError;
use crate::noise::constants::LEXICON;
use crate::noise::syntactic::RateConfig;
use crate::noise::utils::{
    candidate_positions, match_case, selection_size, weighted_sample_positions, EntityStrategy,
    NoiseContext,
};
use crate::TaggedSequence;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, trace, warn};

/// # Coarse part-of-speech class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PosClass {
    Noun,
    Verb,
    Adjective,
    Adverb,
    Other,
}

impl PosClass {
    /// Maps a Penn Treebank tag to its coarse class
    ///
    /// # Example
    ///
    /// ```
    /// use ner_noise::noise::semantic::PosClass;
    ///
    /// assert_eq!(PosClass::from_penn("VBD"), PosClass::Verb);
    /// assert_eq!(PosClass::from_penn("JJS"), PosClass::Adjective);
    /// assert_eq!(PosClass::from_penn("DT"), PosClass::Other);
    /// ```
    pub fn from_penn(tag: &str) -> PosClass {
        match tag.chars().next() {
            Some('J') => PosClass::Adjective,
            Some('V') => PosClass::Verb,
            Some('N') => PosClass::Noun,
            Some('R') => PosClass::Adverb,
            _ => PosClass::Other,
        }
    }

    /// Class used for lexical lookups, function words are looked up as nouns
    pub fn lookup_class(&self) -> PosClass {
        match self {
            PosClass::Other => PosClass::Noun,
            class => *class,
        }
    }

    /// Relative weight of the class when sampling tokens to replace
    pub fn sampling_weight(&self) -> f64 {
        match self {
            PosClass::Noun | PosClass::Verb => 1.0,
            PosClass::Adjective => 0.8,
            PosClass::Adverb => 0.6,
            PosClass::Other => 0.1,
        }
    }
}

/// Synonym and antonym lookup by lemma and part-of-speech
pub trait LexicalService: Send + Sync {
    fn synonyms(&self, lemma: &str, pos: PosClass) -> Result<Vec<String>, NoiseError>;

    fn antonyms(&self, lemma: &str, pos: PosClass) -> Result<Vec<String>, NoiseError>;
}

/// Nearest neighbours in a static word embedding space
pub trait EmbeddingService: Send + Sync {
    fn nearest_neighbors(&self, word: &str, top_k: usize) -> Result<Vec<String>, NoiseError>;
}

/// A sentence with one position to predict
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskedRequest {
    pub tokens: Vec<String>,
    pub position: usize,
}

/// Masked-language-model fill. A call answers a whole batch of requests, in request order.
pub trait ContextualFillService: Send + Sync {
    fn fill_masked(
        &self,
        requests: &[MaskedRequest],
        top_k: usize,
    ) -> Result<Vec<Vec<String>>, NoiseError>;
}

/// # Static lexicon
/// Lexical service over the built-in synonym/antonym table. The table is not split by
/// part-of-speech.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticLexicon;

impl LexicalService for StaticLexicon {
    fn synonyms(&self, lemma: &str, _pos: PosClass) -> Result<Vec<String>, NoiseError> {
        Ok(LEXICON
            .get(lemma)
            .map(|(synonyms, _)| synonyms.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default())
    }

    fn antonyms(&self, lemma: &str, _pos: PosClass) -> Result<Vec<String>, NoiseError> {
        Ok(LEXICON
            .get(lemma)
            .map(|(_, antonyms)| antonyms.iter().map(|s| s.to_string()).collect())
            .unwrap_or_default())
    }
}

pub type ServiceLoader<T> = Box<dyn Fn(&str) -> Result<Arc<T>, NoiseError> + Send + Sync>;

/// # Service cache
/// Get-or-create cache of expensive service handles keyed by model identifier. The lock is held
/// while a model loads, so concurrent first use of an identifier loads it exactly once.
pub struct ServiceCache<T: ?Sized> {
    loader: ServiceLoader<T>,
    entries: Mutex<HashMap<String, Arc<T>>>,
}

impl<T: ?Sized> ServiceCache<T> {
    pub fn new<F>(loader: F) -> ServiceCache<T>
    where
        F: Fn(&str) -> Result<Arc<T>, NoiseError> + Send + Sync + 'static,
    {
        ServiceCache {
            loader: Box::new(loader),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the handle for `model_id`, loading it on first use
    pub fn get(&self, model_id: &str) -> Result<Arc<T>, NoiseError> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| NoiseError::ServiceError("service cache lock poisoned".to_string()))?;
        if let Some(service) = entries.get(model_id) {
            return Ok(Arc::clone(service));
        }
        info!(model_id, "loading external model");
        let service = (self.loader)(model_id)?;
        entries.insert(model_id.to_string(), Arc::clone(&service));
        Ok(service)
    }

    /// Loads every identifier up front, typically before a parallel dispatch
    pub fn warm_up<S: AsRef<str>>(&self, model_ids: &[S]) -> Result<(), NoiseError> {
        for model_id in model_ids {
            self.get(model_id.as_ref())?;
        }
        Ok(())
    }

    /// Number of loaded handles
    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: ?Sized> fmt::Debug for ServiceCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceCache")
            .field("loaded", &self.len())
            .finish()
    }
}

/// # Semantic resources
/// External collaborators of the semantic operators. Embedding and contextual caches are optional,
/// operators needing a missing one leave their tokens unchanged.
pub struct SemanticResources {
    pub lexical: Arc<dyn LexicalService>,
    pub embeddings: Option<ServiceCache<dyn EmbeddingService>>,
    pub contextual: Option<ServiceCache<dyn ContextualFillService>>,
}

impl Default for SemanticResources {
    fn default() -> Self {
        SemanticResources::new(Arc::new(StaticLexicon))
    }
}

impl fmt::Debug for SemanticResources {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SemanticResources")
            .field("embeddings", &self.embeddings)
            .field("contextual", &self.contextual)
            .finish()
    }
}

impl SemanticResources {
    pub fn new(lexical: Arc<dyn LexicalService>) -> SemanticResources {
        SemanticResources {
            lexical,
            embeddings: None,
            contextual: None,
        }
    }

    pub fn with_embeddings<F>(mut self, loader: F) -> SemanticResources
    where
        F: Fn(&str) -> Result<Arc<dyn EmbeddingService>, NoiseError> + Send + Sync + 'static,
    {
        self.embeddings = Some(ServiceCache::new(loader));
        self
    }

    pub fn with_contextual<F>(mut self, loader: F) -> SemanticResources
    where
        F: Fn(&str) -> Result<Arc<dyn ContextualFillService>, NoiseError> + Send + Sync + 'static,
    {
        self.contextual = Some(ServiceCache::new(loader));
        self
    }

    pub fn embedding(&self, model_id: &str) -> Result<Arc<dyn EmbeddingService>, NoiseError> {
        match &self.embeddings {
            Some(cache) => cache.get(model_id),
            None => Err(NoiseError::ServiceError(
                "no embedding service configured".to_string(),
            )),
        }
    }

    pub fn contextual_fill(
        &self,
        model_id: &str,
    ) -> Result<Arc<dyn ContextualFillService>, NoiseError> {
        match &self.contextual {
            Some(cache) => cache.get(model_id),
            None => Err(NoiseError::ServiceError(
                "no contextual fill service configured".to_string(),
            )),
        }
    }

    /// Loads the models a configuration will use
    pub fn warm_up(&self, config: &SemanticConfig) -> Result<(), NoiseError> {
        let uses = |op: SemanticOp| config.ops.contains(&op);
        if let Some(cache) = &self.embeddings {
            if uses(SemanticOp::Embedding) || uses(SemanticOp::Synonym) || uses(SemanticOp::Antonym)
            {
                cache.warm_up(&[config.embedding_model.as_str()])?;
            }
        }
        if let Some(cache) = &self.contextual {
            if uses(SemanticOp::Contextual) {
                cache.warm_up(&[config.contextual_model.as_str()])?;
            }
        }
        Ok(())
    }
}

/// # Semantic replacement strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticOp {
    /// Lexical synonym, falling back to an embedding neighbour
    Synonym,
    /// Lexical antonym, falling back to an embedding neighbour
    Antonym,
    /// Static embedding nearest neighbour
    Embedding,
    /// Masked-language-model prediction in context, no fallback
    Contextual,
}

/// # Semantic noise configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SemanticConfig {
    pub p: f64,
    pub ops: Vec<SemanticOp>,
    pub entity_strategy: EntityStrategy,
    #[serde(alias = "model_path")]
    pub embedding_model: String,
    pub contextual_model: String,
    /// Number of neighbours or predictions requested per token
    pub top_k: usize,
}

impl Default for SemanticConfig {
    fn default() -> Self {
        SemanticConfig {
            p: 0.1,
            ops: vec![SemanticOp::Synonym, SemanticOp::Embedding],
            entity_strategy: EntityStrategy::Protect,
            embedding_model: "glove-wiki-gigaword-100".to_string(),
            contextual_model: "bert-base-cased".to_string(),
            top_k: 10,
        }
    }
}

/// Picks a usable replacement for `original` among `candidates`: single words that differ from
/// the original, recased like it
fn pick_replacement<R: Rng + ?Sized>(
    original: &str,
    candidates: Vec<String>,
    rng: &mut R,
) -> Option<String> {
    let lowered = original.to_lowercase();
    let usable: Vec<String> = candidates
        .into_iter()
        .map(|candidate| candidate.trim().replace('_', " "))
        .filter(|candidate| {
            !candidate.is_empty()
                && !candidate.contains(char::is_whitespace)
                && candidate.to_lowercase() != lowered
        })
        .collect();
    usable
        .choose(rng)
        .map(|replacement| match_case(original, replacement))
}

fn embedding_replacement<R: Rng + ?Sized>(
    token: &str,
    resources: &SemanticResources,
    config: &SemanticConfig,
    rng: &mut R,
) -> Option<String> {
    let neighbors = resources
        .embedding(&config.embedding_model)
        .and_then(|service| service.nearest_neighbors(&token.to_lowercase(), config.top_k));
    match neighbors {
        Ok(neighbors) => pick_replacement(token, neighbors, rng),
        Err(e) => {
            warn!(error = %e, token, "embedding lookup failed, token left unchanged");
            None
        }
    }
}

fn lexical_replacement<R: Rng + ?Sized>(
    op: SemanticOp,
    token: &str,
    pos: PosClass,
    resources: &SemanticResources,
    rng: &mut R,
) -> Option<String> {
    let lemma = token.to_lowercase();
    let lookup = match op {
        SemanticOp::Antonym => resources.lexical.antonyms(&lemma, pos.lookup_class()),
        _ => resources.lexical.synonyms(&lemma, pos.lookup_class()),
    };
    match lookup {
        Ok(candidates) => pick_replacement(token, candidates, rng),
        Err(e) => {
            warn!(error = %e, token, "lexical lookup failed");
            None
        }
    }
}

fn contextual_replacements<R: Rng + ?Sized>(
    sequence: &TaggedSequence,
    positions: &[usize],
    resources: &SemanticResources,
    config: &SemanticConfig,
    rng: &mut R,
) -> Vec<(usize, String)> {
    let requests: Vec<MaskedRequest> = positions
        .iter()
        .map(|&position| MaskedRequest {
            tokens: sequence.tokens.clone(),
            position,
        })
        .collect();
    let predictions = resources
        .contextual_fill(&config.contextual_model)
        .and_then(|service| service.fill_masked(&requests, config.top_k));
    match predictions {
        Ok(predictions) => positions
            .iter()
            .zip(predictions)
            .filter_map(|(&position, candidates)| {
                pick_replacement(&sequence.tokens[position], candidates, rng)
                    .map(|replacement| (position, replacement))
            })
            .collect(),
        Err(e) => {
            warn!(error = %e, batch = positions.len(), "contextual fill failed, tokens left unchanged");
            Vec::new()
        }
    }
}

/// Replaces content tokens with semantically related words.
///
/// Candidates are the unprotected tokens admitted by the entity strategy, weighted by their coarse
/// part-of-speech class. `round(len(candidates) * p)` of them are sampled without replacement and
/// each is assigned a strategy before anything runs, so that all contextual fills of the sequence
/// go to the service as a single batch. Synonym and antonym lookups fall back to an embedding
/// neighbour, contextual fill has no fallback. Tokens without a usable replacement or whose
/// service fails are left unchanged.
pub fn semantic_noise<R: Rng + ?Sized>(
    mut sequence: TaggedSequence,
    context: &NoiseContext,
    resources: &SemanticResources,
    config: &SemanticConfig,
    rng: &mut R,
) -> Result<TaggedSequence, NoiseError> {
    let candidates = candidate_positions(
        &sequence,
        context.label_map,
        &context.policy,
        config.entity_strategy,
    )?;
    let amount = selection_size(candidates.len(), config.p);
    if amount == 0 || config.ops.is_empty() {
        return Ok(sequence);
    }
    let weighted: Vec<(usize, f64)> = candidates
        .iter()
        .map(|&position| {
            let class = sequence
                .pos_tag(position)
                .map_or(PosClass::Other, PosClass::from_penn);
            (position, class.sampling_weight())
        })
        .collect();
    let selected = weighted_sample_positions(rng, &weighted, amount);

    let mut plan: BTreeMap<SemanticOp, Vec<usize>> = BTreeMap::new();
    for position in selected {
        if let Some(op) = config.ops.choose(rng) {
            plan.entry(*op).or_insert_with(Vec::new).push(position);
        }
    }
    debug!(?plan, "semantic replacement plan");

    for (op, mut positions) in plan {
        positions.sort_unstable();
        let replacements: Vec<(usize, String)> = match op {
            SemanticOp::Contextual => {
                contextual_replacements(&sequence, &positions, resources, config, rng)
            }
            SemanticOp::Embedding => positions
                .iter()
                .filter_map(|&position| {
                    embedding_replacement(&sequence.tokens[position], resources, config, rng)
                        .map(|replacement| (position, replacement))
                })
                .collect(),
            SemanticOp::Synonym | SemanticOp::Antonym => positions
                .iter()
                .filter_map(|&position| {
                    let token = &sequence.tokens[position];
                    let pos = sequence
                        .pos_tag(position)
                        .map_or(PosClass::Other, PosClass::from_penn);
                    lexical_replacement(op, token, pos, resources, rng)
                        .or_else(|| embedding_replacement(token, resources, config, rng))
                        .map(|replacement| (position, replacement))
                })
                .collect(),
        };
        for (position, replacement) in replacements {
            trace!(position, ?op, original = %sequence.tokens[position], %replacement, "token replaced");
            sequence.tokens[position] = replacement;
        }
    }
    Ok(sequence)
}

/// Replaces each unprotected background token having a lexical synonym with probability `p`.
/// There is no embedding fallback.
pub fn synonym_substitute<R: Rng + ?Sized>(
    mut sequence: TaggedSequence,
    context: &NoiseContext,
    lexical: &dyn LexicalService,
    config: &RateConfig,
    rng: &mut R,
) -> Result<TaggedSequence, NoiseError> {
    if config.p <= 0.0 {
        return Ok(sequence);
    }
    let candidates = candidate_positions(
        &sequence,
        context.label_map,
        &context.policy,
        EntityStrategy::Protect,
    )?;
    for position in candidates {
        if !rng.gen_bool(config.p.min(1.0)) {
            continue;
        }
        let token = sequence.tokens[position].clone();
        let pos = sequence
            .pos_tag(position)
            .map_or(PosClass::Other, PosClass::from_penn);
        let synonyms = match lexical.synonyms(&token.to_lowercase(), pos.lookup_class()) {
            Ok(synonyms) => synonyms,
            Err(e) => {
                warn!(error = %e, token = %token, "lexical lookup failed");
                continue;
            }
        };
        if let Some(replacement) = pick_replacement(&token, synonyms, rng) {
            sequence.tokens[position] = replacement;
        }
    }
    Ok(sequence)
}
