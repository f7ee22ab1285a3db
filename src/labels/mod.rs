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

//!# Labels
//!
//! This module contains the label-side data model of the crate:
//! - the bidirectional mapping between BIO label strings and their integer ids (`LabelMap`)
//! - the parsing of individual labels into their BIO components (`BioTag`)
//! - the extraction of typed entity spans from a label sequence (`Span`, `extract_spans`)
//!
//! Spans are always derived from the current label sequence and never stored alongside it.

pub(crate) mod label_map;
pub(crate) mod spans;

pub use label_map::{BioTag, LabelMap};
pub use spans::{extract_spans, find_orphans, Span};
