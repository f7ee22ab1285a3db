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

use std::collections::HashMap;

/// Punctuation tokens inserted by the syntactic operators
pub const PUNCTUATION_TOKENS: [&str; 6] = [",", ".", ";", ":", "!", "?"];

lazy_static! {
    /// Adjacent keys on a QWERTZ keyboard, keyed by lowercase character
    pub static ref KEYBOARD_NEIGHBORS: HashMap<char, &'static str> = [
        ('a', "qswy"),
        ('b', "vghn"),
        ('c', "xdfv"),
        ('d', "erfcxs"),
        ('e', "rdsw"),
        ('f', "rtgvcd"),
        ('g', "tyhbvf"),
        ('h', "uynjbg"),
        ('i', "uokj"),
        ('j', "uihnkm"),
        ('k', "ijolm"),
        ('l', "okp"),
        ('m', "njk"),
        ('n', "bhjm"),
        ('o', "iplö"),
        ('p', "olü"),
        ('q', "was"),
        ('r', "etdf"),
        ('s', "awedxz"),
        ('t', "ryfg"),
        ('u', "ziyhj"),
        ('v', "cfgb"),
        ('w', "qeas"),
        ('x', "zsdc"),
        ('y', "tugh"),
        ('z', "yuasx"),
        ('ä', "öü"),
        ('ö', "äü"),
        ('ü', "öä"),
    ]
    .iter()
    .cloned()
    .collect();

    /// Visually confusable characters: digits and letters, and look-alike Latin letters
    pub static ref HOMOGLYPHS: HashMap<char, &'static str> = [
        ('0', "Oo"),
        ('1', "lI"),
        ('2', "Z"),
        ('3', "E"),
        ('5', "S"),
        ('6', "b"),
        ('8', "B"),
        ('9', "g"),
        ('O', "0"),
        ('o', "0"),
        ('l', "1I"),
        ('I', "1l"),
        ('i', "1"),
        ('Z', "2"),
        ('E', "3"),
        ('S', "5"),
        ('s', "5"),
        ('b', "6"),
        ('B', "8"),
        ('g', "9q"),
        ('q', "g"),
        ('m', "n"),
        ('n', "m"),
        ('u', "v"),
        ('v', "u"),
        ('c', "e"),
        ('e', "c"),
        ('a', "@"),
    ]
    .iter()
    .cloned()
    .collect();

    /// Byte sequences produced by decoding UTF-8 text as Latin-1/Windows-1252, mapped back to the
    /// intended character before diacritics are stripped
    pub static ref LEGACY_ENCODING_FIXES: Vec<(&'static str, &'static str)> = vec![
        ("Ã¤", "ä"),
        ("Ã¶", "ö"),
        ("Ã¼", "ü"),
        ("Ã„", "Ä"),
        ("Ã–", "Ö"),
        ("Ãœ", "Ü"),
        ("ÃŸ", "ß"),
        ("Ã©", "é"),
        ("Ã¨", "è"),
        ("Ã¡", "á"),
        ("Ã§", "ç"),
        ("Ã±", "ñ"),
        ("Ã³", "ó"),
        ("Ãº", "ú"),
    ];

    /// Latin letters without a canonical decomposition and their ASCII transliteration
    pub static ref UNDECOMPOSABLE_LETTERS: HashMap<char, &'static str> = [
        ('ß', "ss"),
        ('ẞ', "SS"),
        ('æ', "ae"),
        ('Æ', "AE"),
        ('œ', "oe"),
        ('Œ', "OE"),
        ('ø', "o"),
        ('Ø', "O"),
        ('đ', "d"),
        ('Đ', "D"),
        ('ð', "d"),
        ('Ð', "D"),
        ('ł', "l"),
        ('Ł', "L"),
        ('þ', "th"),
        ('Þ', "Th"),
        ('ı', "i"),
        ('ħ', "h"),
        ('Ħ', "H"),
    ]
    .iter()
    .cloned()
    .collect();

    /// Built-in lexicon backing `StaticLexicon`: lemma -> (synonyms, antonyms)
    pub static ref LEXICON: HashMap<&'static str, (&'static [&'static str], &'static [&'static str])> = {
        let entries: [(&'static str, &'static [&'static str], &'static [&'static str]); 16] = [
            ("said", &["stated", "remarked"], &[]),
            ("say", &["state", "remark"], &[]),
            ("buy", &["purchase", "acquire"], &["sell"]),
            ("sell", &["vend"], &["buy"]),
            ("big", &["large", "huge"], &["small"]),
            ("small", &["little", "tiny"], &["big"]),
            ("good", &["fine", "decent"], &["bad"]),
            ("bad", &["poor", "awful"], &["good"]),
            ("increase", &["rise", "growth"], &["decrease"]),
            ("decrease", &["decline", "drop"], &["increase"]),
            ("win", &["triumph"], &["lose"]),
            ("lose", &["forfeit"], &["win"]),
            ("early", &["premature"], &["late"]),
            ("late", &["tardy"], &["early"]),
            ("strong", &["powerful", "sturdy"], &["weak"]),
            ("weak", &["feeble", "frail"], &["strong"]),
        ];
        entries
            .iter()
            .map(|(lemma, synonyms, antonyms)| (*lemma, (*synonyms, *antonyms)))
            .collect()
    };
}
