// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

#![allow(dead_code)]

use std::sync::Arc;

use annotation_binder::{ArgumentSyntax, CollectionLocation, LocationResolver};
use codemap::{CodeMap, File, Span};

/// Argument syntax for a test source: byte ranges into the annotation text.
#[derive(Debug, Clone)]
pub struct Syntax {
    range: (u64, u64),
    elements: Option<Vec<(u64, u64)>>,
}

impl ArgumentSyntax for Syntax {
    fn is_collection_literal(&self) -> bool {
        self.elements.is_some()
    }
}

/// A single annotation's source text, registered with a code map.
pub struct Source {
    file: Arc<File>,
}

impl Source {
    pub fn new(text: &str) -> Self {
        let mut codemap = CodeMap::new();
        Self {
            file: codemap.add_file("annotation.cs".to_string(), text.to_string()),
        }
    }

    fn find(&self, needle: &str, from: u64) -> (u64, u64) {
        let haystack = &self.file.source()[from as usize..];
        let mut matches = haystack.match_indices(needle);
        let (offset, _) = matches
            .next()
            .unwrap_or_else(|| panic!("`{needle}` not found in test source"));
        let lo = from + offset as u64;
        (lo, lo + needle.len() as u64)
    }

    /// An expression that occurs exactly once in the source.
    pub fn expr(&self, needle: &str) -> Syntax {
        let range = self.find(needle, 0);
        assert!(
            self.file.source()[range.1 as usize..].find(needle).is_none(),
            "`{needle}` is ambiguous in test source"
        );
        Syntax {
            range,
            elements: None,
        }
    }

    /// A collection literal and its elements, searched for in order inside the literal.
    pub fn literal(&self, needle: &str, elements: &[&str]) -> Syntax {
        let Syntax { range, .. } = self.expr(needle);
        let mut next = range.0;
        let elements = elements
            .iter()
            .map(|element| {
                let found = self.find(element, next);
                next = found.1;
                found
            })
            .collect();
        Syntax {
            range,
            elements: Some(elements),
        }
    }

    pub fn span(&self, syntax: &Syntax) -> Span {
        self.file.span.subspan(syntax.range.0, syntax.range.1)
    }

    pub fn text(&self, span: Span) -> &str {
        self.file.source_slice(span)
    }
}

impl LocationResolver<Syntax> for Source {
    fn locate(&self, syntax: &Syntax) -> Span {
        self.span(syntax)
    }

    fn locate_collection(&self, syntax: &Syntax) -> CollectionLocation {
        CollectionLocation {
            outer: self.span(syntax),
            elements: syntax
                .elements
                .iter()
                .flatten()
                .map(|(lo, hi)| self.file.span.subspan(*lo, *hi))
                .collect(),
        }
    }
}
