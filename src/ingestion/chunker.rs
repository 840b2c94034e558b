//! Recursive character chunker
//!
//! Splits extracted text into overlapping chunks by descending a fixed
//! hierarchy of separators: paragraphs, lines, sentences, words, and finally
//! a hard character split. Separators stay attached to the preceding piece,
//! so pieces concatenate back to the input and chunk spans are exact.
//! Chunking is deterministic: same text and settings, same chunks.

use unicode_segmentation::UnicodeSegmentation;
use uuid::Uuid;

use crate::config::ChunkingConfig;
use crate::types::Chunk;

/// Text chunker with configurable size and overlap, measured in characters
pub struct Chunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Chunker {
    pub fn new(config: &ChunkingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        }
    }

    /// Split `text` into chunks for `document_id`
    ///
    /// Whitespace-only input yields no chunks. Every chunk is at most
    /// `chunk_size` characters, and consecutive chunks share roughly
    /// `chunk_overlap` trailing characters.
    pub fn chunk(&self, document_id: Uuid, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut pieces = Vec::new();
        self.split_level(text, 0, &mut pieces);
        self.merge(document_id, &pieces)
    }

    /// Recursively split a fragment until every piece fits in `chunk_size`
    fn split_level<'a>(&self, text: &'a str, level: usize, out: &mut Vec<&'a str>) {
        if char_len(text) <= self.chunk_size {
            if !text.is_empty() {
                out.push(text);
            }
            return;
        }

        let fragments: Vec<&str> = match level {
            0 => text.split_inclusive("\n\n").collect(),
            1 => text.split_inclusive('\n').collect(),
            2 => text.split_sentence_bounds().collect(),
            3 => text.split_inclusive(' ').collect(),
            _ => {
                // last resort: hard split on character boundaries
                hard_split(text, self.chunk_size, out);
                return;
            }
        };

        // a level that produced no split makes no progress; descend
        if fragments.len() <= 1 {
            self.split_level(text, level + 1, out);
            return;
        }

        for fragment in fragments {
            if char_len(fragment) <= self.chunk_size {
                if !fragment.is_empty() {
                    out.push(fragment);
                }
            } else {
                self.split_level(fragment, level + 1, out);
            }
        }
    }

    /// Greedily pack pieces into chunks, carrying overlap between them
    fn merge(&self, document_id: Uuid, pieces: &[&str]) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        // (char offset, text, char length) per buffered piece
        let mut buffer: Vec<(usize, &str, usize)> = Vec::new();
        let mut buffered = 0usize;
        let mut offset = 0usize;

        for piece in pieces {
            let len = char_len(piece);

            if buffered + len > self.chunk_size && !buffer.is_empty() {
                self.flush(document_id, &buffer, buffered, &mut chunks);

                // retain trailing pieces as overlap for the next chunk
                while buffered > self.chunk_overlap
                    || (buffered + len > self.chunk_size && buffered > 0)
                {
                    let (_, _, dropped) = buffer.remove(0);
                    buffered -= dropped;
                }
            }

            buffer.push((offset, piece, len));
            buffered += len;
            offset += len;
        }

        if !buffer.is_empty() {
            self.flush(document_id, &buffer, buffered, &mut chunks);
        }

        chunks
    }

    fn flush(
        &self,
        document_id: Uuid,
        buffer: &[(usize, &str, usize)],
        buffered: usize,
        chunks: &mut Vec<Chunk>,
    ) {
        // whitespace-only chunks are kept: dropping them would leave a gap
        // in the span coverage
        let text: String = buffer.iter().map(|(_, piece, _)| *piece).collect();
        let char_start = buffer[0].0;
        chunks.push(Chunk {
            document_id,
            index: chunks.len() as u32,
            text,
            char_start,
            char_end: char_start + buffered,
        });
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split into consecutive slices of at most `size` characters
fn hard_split<'a>(text: &'a str, size: usize, out: &mut Vec<&'a str>) {
    let mut start = 0;
    let mut count = 0;
    for (byte_idx, _) in text.char_indices() {
        if count == size {
            out.push(&text[start..byte_idx]);
            start = byte_idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
}
