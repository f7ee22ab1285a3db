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

//! # Adapter helpers to load datasets
//! Reads and writes CoNLL-style files: one `token [pos ...] label` line per token, columns
//! separated by whitespace, sentences separated by blank lines. `-DOCSTART-` lines are skipped.
//! With three columns or more, the second column is read as the part-of-speech tag and the last
//! one as the label.

use crate::error::NoiseError;
use crate::labels::LabelMap;
use crate::TaggedSequence;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

struct SentenceBuffer {
    tokens: Vec<String>,
    labels: Vec<i64>,
    pos_tags: Vec<String>,
}

impl SentenceBuffer {
    fn new() -> SentenceBuffer {
        SentenceBuffer {
            tokens: vec![],
            labels: vec![],
            pos_tags: vec![],
        }
    }

    fn flush(&mut self, examples: &mut Vec<TaggedSequence>) -> Result<(), NoiseError> {
        if self.tokens.is_empty() {
            return Ok(());
        }
        let tokens = std::mem::take(&mut self.tokens);
        let labels = std::mem::take(&mut self.labels);
        let pos_tags = std::mem::take(&mut self.pos_tags);
        let example = if pos_tags.len() == tokens.len() {
            TaggedSequence::with_pos_tags(tokens, labels, pos_tags)?
        } else {
            TaggedSequence::new(tokens, labels)?
        };
        examples.push(example);
        Ok(())
    }
}

/// Reads CoNLL sentences from a buffered reader
pub fn read_conll_from<R: BufRead>(
    reader: R,
    label_map: &LabelMap,
) -> Result<Vec<TaggedSequence>, NoiseError> {
    let mut examples = vec![];
    let mut buffer = SentenceBuffer::new();
    for (line_number, line) in reader.lines().enumerate() {
        let line = line?;
        let columns: Vec<&str> = line.split_whitespace().collect();
        match columns.as_slice() {
            [] => buffer.flush(&mut examples)?,
            [first, ..] if first.starts_with("-DOCSTART-") => buffer.flush(&mut examples)?,
            [_] => {
                return Err(NoiseError::ParsingError(format!(
                    "line {}: expected at least a token and a label, got `{}`",
                    line_number + 1,
                    line
                )));
            }
            [token, rest @ ..] => {
                let label = rest[rest.len() - 1];
                let id = label_map.id(label).map_err(|_| {
                    NoiseError::ParsingError(format!(
                        "line {}: label {} is not part of the label map",
                        line_number + 1,
                        label
                    ))
                })?;
                buffer.tokens.push(token.to_string());
                buffer.labels.push(id);
                if rest.len() >= 2 {
                    buffer.pos_tags.push(rest[0].to_string());
                }
            }
        }
    }
    buffer.flush(&mut examples)?;
    Ok(examples)
}

/// Reads a CoNLL file into tagged sequences
///
/// # Arguments
/// - path (`P: AsRef<Path>`): path to the CoNLL file
/// - label_map (`&LabelMap`): label alphabet used to encode the label column
///
/// # Returns
/// - `Vec<TaggedSequence>` one example per sentence
pub fn read_conll<P: AsRef<Path>>(
    path: P,
    label_map: &LabelMap,
) -> Result<Vec<TaggedSequence>, NoiseError> {
    let f = File::open(&path).map_err(|e| {
        NoiseError::FileNotFound(format!(
            "{} dataset file not found :{}",
            path.as_ref().display(),
            e
        ))
    })?;
    read_conll_from(BufReader::new(f), label_map)
}

/// Writes tagged sequences as CoNLL lines, with the POS column when tags are available
pub fn write_conll<W: Write>(
    writer: &mut W,
    examples: &[TaggedSequence],
    label_map: &LabelMap,
) -> Result<(), NoiseError> {
    for (index, example) in examples.iter().enumerate() {
        if index > 0 {
            writeln!(writer)?;
        }
        let labels = example.label_strings(label_map)?;
        for (position, (token, label)) in example.tokens.iter().zip(labels).enumerate() {
            match example.pos_tag(position) {
                Some(pos_tag) => writeln!(writer, "{} {} {}", token, pos_tag, label)?,
                None => writeln!(writer, "{} {}", token, label)?,
            }
        }
    }
    Ok(())
}
