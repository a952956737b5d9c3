//! Recursive text chunking with overlap
//!
//! Text is split on a priority list of separators, coarsest first. Only pieces
//! that are still too long are split again with the next, finer separator.
//! Adjacent pieces are then packed greedily into chunk bodies, and every chunk
//! after the first is prefixed with up to `overlap` characters immediately
//! preceding its body so context survives the boundary. The prefix shrinks
//! when a long piece leaves less room under `max_size`.
//!
//! Bodies tile the input exactly: stripping each chunk's overlap prefix and
//! concatenating the rest reproduces the original text. Lengths are counted
//! in characters, and splits never land inside a character.

use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::bail_config;
use crate::config::ChunkingConfig;
use crate::document::{Origin, SourceDocument};
use crate::error::Result;

/// A contiguous span of a document, possibly prefixed with overlap from the
/// span before it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Position within its document
    pub ordinal: usize,
    pub origin: Origin,
    /// Label of the document this chunk came from
    pub source: String,
    /// Chunk text, overlap prefix included
    pub text: String,
    /// Leading characters repeated from the previous chunk
    pub overlap: usize,
    /// Byte offset of the non-overlapping body within the document
    pub offset: usize,
}

impl Chunk {
    /// Text without the overlap prefix
    pub fn body(&self) -> &str {
        match self.text.char_indices().nth(self.overlap) {
            Some((idx, _)) => &self.text[idx..],
            None => "",
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// Rebuild the original document from its chunks by dropping overlap prefixes
pub fn reassemble(chunks: &[Chunk]) -> String {
    chunks.iter().map(Chunk::body).collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Separator {
    Literal(String),
    /// Split between every character
    Char,
}

/// Byte ranges of one emitted chunk
#[derive(Debug, Clone, PartialEq, Eq)]
struct Segment {
    /// Start of the overlap prefix (equals `body.start` when there is none)
    start: usize,
    body: Range<usize>,
    overlap: usize,
}

/// Deterministic recursive splitter
#[derive(Debug, Clone)]
pub struct Chunker {
    max_size: usize,
    overlap: usize,
    separators: Vec<Separator>,
}

impl Chunker {
    /// Paragraph, line, word, then character breaks
    pub const DEFAULT_SEPARATORS: [&'static str; 4] = ["\n\n", "\n", " ", ""];

    pub fn new(max_size: usize, overlap: usize) -> Result<Self> {
        Self::with_separators(max_size, overlap, &Self::DEFAULT_SEPARATORS)
    }

    /// Build a chunker with a custom separator list. The empty string stands
    /// for the character break; leaving it out lets unbreakable tokens through
    /// as oversized chunks.
    pub fn with_separators<S: AsRef<str>>(
        max_size: usize,
        overlap: usize,
        separators: &[S],
    ) -> Result<Self> {
        if max_size == 0 {
            bail_config!("chunk max_size must be greater than 0");
        }
        if overlap >= max_size {
            bail_config!(
                "chunk overlap ({}) must be smaller than max_size ({})",
                overlap,
                max_size
            );
        }
        if separators.is_empty() {
            bail_config!("at least one separator is required");
        }

        let separators = separators
            .iter()
            .map(|s| match s.as_ref() {
                "" => Separator::Char,
                literal => Separator::Literal(literal.to_string()),
            })
            .collect();

        Ok(Self {
            max_size,
            overlap,
            separators,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        Self::with_separators(config.max_size, config.overlap, &config.separators)
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into chunk strings, overlap prefixes included
    pub fn split(&self, text: &str) -> Vec<String> {
        self.segments(text)
            .into_iter()
            .map(|segment| text[segment.start..segment.body.end].to_string())
            .collect()
    }

    /// Chunk a whole document, tagging each chunk with its provenance
    pub fn chunk_document(&self, document: &SourceDocument) -> Vec<Chunk> {
        let text = document.text();
        self.segments(text)
            .into_iter()
            .enumerate()
            .map(|(ordinal, segment)| Chunk {
                ordinal,
                origin: document.origin(),
                source: document.source().to_string(),
                text: text[segment.start..segment.body.end].to_string(),
                overlap: segment.overlap,
                offset: segment.body.start,
            })
            .collect()
    }

    fn segments(&self, text: &str) -> Vec<Segment> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut atoms = Vec::new();
        self.split_recursive(text, 0, 0, &mut atoms);

        self.pack(text, &atoms)
            .into_iter()
            .enumerate()
            .map(|(i, body)| self.with_prefix(text, i, body))
            .collect()
    }

    /// Largest body allowed after the first chunk, leaving room for overlap
    fn body_budget(&self) -> usize {
        self.max_size - self.overlap
    }

    /// Break `text` (located at `base` in the document) into atoms no longer
    /// than `max_size`, using separators from `level` onwards. An atom longer
    /// than the body budget gets a shortened overlap prefix instead of being
    /// split further.
    fn split_recursive(&self, text: &str, base: usize, level: usize, out: &mut Vec<Range<usize>>) {
        let budget = self.max_size;
        if char_len(text) <= budget {
            out.push(base..base + text.len());
            return;
        }

        for (offset, separator) in self.separators[level..].iter().enumerate() {
            match separator {
                Separator::Char => {
                    out.extend(
                        text.char_indices()
                            .map(|(i, c)| base + i..base + i + c.len_utf8()),
                    );
                    return;
                }
                Separator::Literal(sep) if text.contains(sep.as_str()) => {
                    let finer = level + offset + 1;
                    for piece in split_keeping_separator(text, sep) {
                        let piece_text = &text[piece.clone()];
                        if char_len(piece_text) <= budget || finer >= self.separators.len() {
                            out.push(base + piece.start..base + piece.end);
                        } else {
                            self.split_recursive(piece_text, base + piece.start, finer, out);
                        }
                    }
                    return;
                }
                Separator::Literal(_) => continue,
            }
        }

        // No separator applies: an indivisible token, emitted whole
        out.push(base..base + text.len());
    }

    /// Greedily merge adjacent atoms into bodies
    fn pack(&self, text: &str, atoms: &[Range<usize>]) -> Vec<Range<usize>> {
        let mut bodies: Vec<Range<usize>> = Vec::new();
        let mut current: Option<(Range<usize>, usize)> = None;

        for atom in atoms {
            let atom_len = char_len(&text[atom.clone()]);
            let budget = if bodies.is_empty() {
                self.max_size
            } else {
                self.body_budget()
            };

            current = match current.take() {
                None => Some((atom.clone(), atom_len)),
                Some((range, len)) if len + atom_len <= budget => {
                    Some((range.start..atom.end, len + atom_len))
                }
                Some((range, _)) => {
                    bodies.push(range);
                    Some((atom.clone(), atom_len))
                }
            };
        }

        if let Some((range, _)) = current {
            bodies.push(range);
        }
        bodies
    }

    /// Attach the overlap prefix, shortened so the chunk stays within
    /// `max_size` and never reaches before the start of the text
    fn with_prefix(&self, text: &str, index: usize, body: Range<usize>) -> Segment {
        if index == 0 || self.overlap == 0 {
            return Segment {
                start: body.start,
                body,
                overlap: 0,
            };
        }

        let body_len = char_len(&text[body.clone()]);
        let wanted = self.overlap.min(self.max_size.saturating_sub(body_len));

        let mut start = body.start;
        let mut overlap = 0;
        for (i, _) in text[..body.start].char_indices().rev().take(wanted) {
            start = i;
            overlap += 1;
        }

        Segment {
            start,
            body,
            overlap,
        }
    }
}

/// Split at every occurrence of `sep`, keeping the separator at the start of
/// the following piece. Pieces are never empty.
fn split_keeping_separator(text: &str, sep: &str) -> Vec<Range<usize>> {
    let mut pieces = Vec::new();
    let mut prev = 0;
    for (idx, _) in text.match_indices(sep) {
        if idx > prev {
            pieces.push(prev..idx);
            prev = idx;
        }
    }
    pieces.push(prev..text.len());
    pieces
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}
