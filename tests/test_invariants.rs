use ner_noise::config::StepConfig;
use ner_noise::labels::{find_orphans, LabelMap};
use ner_noise::noise::semantic::SemanticResources;
use ner_noise::noise::{
    LabelNoise, NoiseContext, ProtectionPolicy, TokenNoise, LABEL_NOISE_KEYS, TOKEN_NOISE_KEYS,
};
use ner_noise::TaggedSequence;
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::json;

const ENTITY_TYPES: [&str; 3] = ["LOC", "ORG", "PER"];

fn label_map() -> LabelMap {
    LabelMap::from_entity_types(&ENTITY_TYPES).unwrap()
}

/// Well-formed BIO sequences: an `I-` label only follows a label of the same type
fn tagged_sequence() -> impl Strategy<Value = TaggedSequence> {
    prop::collection::vec(
        (
            prop_oneof![
                "[A-Za-z]{1,9}",
                "[a-zäöüéñ]{3,8}",
                "[0-9]{1,4}",
                Just(",".to_string()),
                Just(".".to_string()),
            ],
            0usize..3,
            0usize..ENTITY_TYPES.len(),
        ),
        1..24,
    )
    .prop_map(|items| {
        let mut tokens = Vec::new();
        let mut labels: Vec<String> = Vec::new();
        for (token, tag, type_index) in items {
            let entity_type = ENTITY_TYPES[type_index];
            let label = match tag {
                0 => "O".to_string(),
                1 => format!("B-{}", entity_type),
                _ => match labels.last() {
                    Some(previous) if previous != "O" => format!("I-{}", &previous[2..]),
                    _ => format!("B-{}", entity_type),
                },
            };
            tokens.push(token);
            labels.push(label);
        }
        TaggedSequence::from_strs(&tokens, &labels, &label_map()).unwrap()
    })
}

fn resolve_token_noise(key: &str, p: f64) -> TokenNoise {
    TokenNoise::resolve(&StepConfig::new(key, json!({ "p": p }))).unwrap()
}

fn resolve_label_noise(key: &str, p: f64) -> LabelNoise {
    LabelNoise::resolve(&StepConfig::new(key, json!({ "p": p }))).unwrap()
}

proptest! {
    #[test]
    fn token_noise_keeps_parity_and_bio(
        sequence in tagged_sequence(),
        p in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let label_map = label_map();
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        let resources = SemanticResources::default();
        for key in TOKEN_NOISE_KEYS.iter() {
            let noise = resolve_token_noise(key, p);
            let output = noise
                .apply(sequence.clone(), &context, &resources, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            prop_assert_eq!(output.tokens.len(), output.labels.len());
            prop_assert!(!output.is_empty());
            prop_assert!(find_orphans(&output.label_strings(&label_map).unwrap()).is_empty());
        }
    }

    #[test]
    fn label_noise_keeps_tokens_and_bio(
        sequence in tagged_sequence(),
        p in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let label_map = label_map();
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        for key in LABEL_NOISE_KEYS.iter() {
            let output = resolve_label_noise(key, p)
                .apply(sequence.clone(), &context, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            prop_assert_eq!(&output.tokens, &sequence.tokens);
            prop_assert_eq!(output.labels.len(), sequence.labels.len());
            prop_assert!(find_orphans(&output.label_strings(&label_map).unwrap()).is_empty());
        }
    }

    #[test]
    fn zero_rate_is_identity(sequence in tagged_sequence(), seed in any::<u64>()) {
        let label_map = label_map();
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        let resources = SemanticResources::default();
        for key in TOKEN_NOISE_KEYS.iter() {
            let output = resolve_token_noise(key, 0.0)
                .apply(sequence.clone(), &context, &resources, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            prop_assert_eq!(&output, &sequence);
        }
        for key in LABEL_NOISE_KEYS.iter() {
            let output = resolve_label_noise(key, 0.0)
                .apply(sequence.clone(), &context, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            prop_assert_eq!(&output, &sequence);
        }
    }

    #[test]
    fn fixed_seed_is_deterministic(
        sequence in tagged_sequence(),
        p in 0.0f64..=1.0,
        seed in any::<u64>(),
    ) {
        let label_map = label_map();
        let context = NoiseContext::new(&label_map, ProtectionPolicy::default());
        let resources = SemanticResources::default();
        for key in TOKEN_NOISE_KEYS.iter() {
            let noise = resolve_token_noise(key, p);
            let first = noise
                .apply(sequence.clone(), &context, &resources, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            let second = noise
                .apply(sequence.clone(), &context, &resources, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            prop_assert_eq!(first, second);
        }
        for key in LABEL_NOISE_KEYS.iter() {
            let noise = resolve_label_noise(key, p);
            let first = noise
                .apply(sequence.clone(), &context, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            let second = noise
                .apply(sequence.clone(), &context, &mut StdRng::seed_from_u64(seed))
                .unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
