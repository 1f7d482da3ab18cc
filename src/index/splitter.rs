//! Structure-aware text splitting
//!
//! Breaks a materialized document into chunks for embedding. Boundaries are
//! markdown headings and blank-line paragraph breaks; blocks are then packed
//! into size-capped chunks. A trailing undersized chunk is merged back into
//! its predecessor when the combined size still fits the cap.

pub struct TextSplitter {
    chunk_size: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Split text into chunks of at most `chunk_size` characters.
    ///
    /// Whitespace-only input yields no chunks; any other input yields at
    /// least one.
    pub fn split(&self, text: &str) -> Vec<String> {
        let blocks = self.split_blocks(text);
        if blocks.is_empty() {
            return Vec::new();
        }

        let mut chunks: Vec<String> = Vec::new();
        let mut current = String::new();

        for block in blocks {
            for piece in self.split_oversized(&block) {
                let extra = if current.is_empty() {
                    piece.chars().count()
                } else {
                    piece.chars().count() + 2
                };

                if !current.is_empty() && current.chars().count() + extra > self.chunk_size {
                    chunks.push(std::mem::take(&mut current));
                }

                if !current.is_empty() {
                    current.push_str("\n\n");
                }
                current.push_str(&piece);
            }
        }

        if !current.is_empty() {
            chunks.push(current);
        }

        self.merge_trailing(chunks)
    }

    /// Break text into logical blocks at headings and blank lines.
    fn split_blocks(&self, text: &str) -> Vec<String> {
        let mut blocks = Vec::new();
        let mut current = String::new();

        for line in text.lines() {
            let is_heading = line.trim_start().starts_with('#');
            let is_blank = line.trim().is_empty();

            if (is_heading || is_blank) && !current.trim().is_empty() {
                blocks.push(current.trim_end().to_string());
                current.clear();
            }

            if is_blank {
                continue;
            }
            current.push_str(line);
            current.push('\n');
        }

        if !current.trim().is_empty() {
            blocks.push(current.trim_end().to_string());
        }

        blocks
    }

    /// Split a single block that exceeds the cap, first at line boundaries,
    /// then at character boundaries for lines that are themselves too long.
    fn split_oversized(&self, block: &str) -> Vec<String> {
        if block.chars().count() <= self.chunk_size {
            return vec![block.to_string()];
        }

        let mut pieces = Vec::new();
        let mut current = String::new();

        for line in block.lines() {
            for slice in split_chars(line, self.chunk_size) {
                let extra = if current.is_empty() {
                    slice.chars().count()
                } else {
                    slice.chars().count() + 1
                };
                if !current.is_empty() && current.chars().count() + extra > self.chunk_size {
                    pieces.push(std::mem::take(&mut current));
                }
                if !current.is_empty() {
                    current.push('\n');
                }
                current.push_str(&slice);
            }
        }

        if !current.is_empty() {
            pieces.push(current);
        }
        pieces
    }

    fn merge_trailing(&self, mut chunks: Vec<String>) -> Vec<String> {
        if chunks.len() < 2 {
            return chunks;
        }
        let last_len = chunks[chunks.len() - 1].chars().count();
        let prev_len = chunks[chunks.len() - 2].chars().count();
        if last_len < self.chunk_size / 4 && prev_len + last_len + 2 <= self.chunk_size {
            let last = chunks.pop().unwrap_or_default();
            if let Some(prev) = chunks.last_mut() {
                prev.push_str("\n\n");
                prev.push_str(&last);
            }
        }
        chunks
    }
}

/// Split a string into pieces of at most `max` characters.
fn split_chars(text: &str, max: usize) -> Vec<String> {
    if text.chars().count() <= max {
        return vec![text.to_string()];
    }
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(max)
        .map(|c| c.iter().collect::<String>())
        .collect()
}
