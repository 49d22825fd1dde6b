//! Word-boundary chunking for image placement planning.

use rand::Rng;

/// A contiguous slice of content starting at a word boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextChunk<'a> {
    /// Position in the chunk sequence
    pub index: usize,
    /// Byte offset of the chunk in the content
    pub start: usize,
    /// Chunk text
    pub text: &'a str,
}

impl TextChunk<'_> {
    /// Byte offset one past the end of the chunk.
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

/// Chunk count before jitter, by word-count bucket.
pub fn base_chunk_count(words: usize) -> usize {
    match words {
        0..500 => 3,
        500..1000 => 4,
        1000..2000 => 5,
        2000..3000 => 6,
        _ => 7,
    }
}

/// Chunk count for a word count: bucket base, ±1 jitter, clamped to `min..=max`.
pub fn chunk_count<R: Rng + ?Sized>(words: usize, min: usize, max: usize, rng: &mut R) -> usize {
    let base = base_chunk_count(words) as i64;
    let jittered = base + rng.gen_range(-1..=1);
    jittered.clamp(min as i64, max.max(min) as i64) as usize
}

/// Byte offsets where words start.
fn word_starts(content: &str) -> Vec<usize> {
    let mut starts = Vec::new();
    let mut previous_is_space = true;
    for (i, ch) in content.char_indices() {
        let is_space = ch.is_whitespace();
        if !is_space && previous_is_space {
            starts.push(i);
        }
        previous_is_space = is_space;
    }
    starts
}

/// Split content into `count` chunks whose boundaries fall at word starts.
///
/// Chunks are as even as the word count allows and their texts concatenate
/// back to the exact content. The first chunk keeps any leading whitespace.
/// Fewer chunks are returned when there are fewer words than `count`.
///
/// # Examples
///
/// ```
/// use chronicle_pipeline::chunk_text;
///
/// let content = "one two three four five six";
/// let chunks = chunk_text(content, 3);
/// assert_eq!(chunks.len(), 3);
/// assert_eq!(chunks[1].text, "three four ");
/// let rebuilt: String = chunks.iter().map(|c| c.text).collect();
/// assert_eq!(rebuilt, content);
/// ```
pub fn chunk_text(content: &str, count: usize) -> Vec<TextChunk<'_>> {
    let starts = word_starts(content);
    if starts.is_empty() {
        return if content.is_empty() {
            Vec::new()
        } else {
            vec![TextChunk {
                index: 0,
                start: 0,
                text: content,
            }]
        };
    }

    let words = starts.len();
    let count = count.clamp(1, words);
    let mut boundaries: Vec<usize> = (0..count)
        .map(|i| if i == 0 { 0 } else { starts[i * words / count] })
        .collect();
    boundaries.push(content.len());

    boundaries
        .windows(2)
        .enumerate()
        .map(|(index, pair)| TextChunk {
            index,
            start: pair[0],
            text: &content[pair[0]..pair[1]],
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn words(n: usize) -> String {
        (0..n)
            .map(|i| format!("word{}", i))
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn buckets_match_word_counts() {
        assert_eq!(base_chunk_count(0), 3);
        assert_eq!(base_chunk_count(499), 3);
        assert_eq!(base_chunk_count(500), 4);
        assert_eq!(base_chunk_count(1500), 5);
        assert_eq!(base_chunk_count(2999), 6);
        assert_eq!(base_chunk_count(10_000), 7);
    }

    #[test]
    fn fifteen_hundred_words_yield_four_to_six_chunks() {
        let content = words(1500);
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            let count = chunk_count(1500, 3, 7, &mut rng);
            assert!((4..=6).contains(&count), "count {} out of range", count);
            let chunks = chunk_text(&content, count);
            assert_eq!(chunks.len(), count);
            let rebuilt: String = chunks.iter().map(|c| c.text).collect();
            assert_eq!(rebuilt, content);
        }
    }

    #[test]
    fn jitter_stays_within_bounds() {
        for seed in 0..64 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert!((3..=7).contains(&chunk_count(10, 3, 7, &mut rng)));
            assert!((3..=7).contains(&chunk_count(50_000, 3, 7, &mut rng)));
        }
    }

    #[test]
    fn boundaries_fall_on_word_starts() {
        let content = "  Alpha beta\n\ngamma  delta épsilon zeta eta";
        let chunks = chunk_text(content, 4);
        for chunk in &chunks[1..] {
            let first = chunk.text.chars().next().unwrap();
            assert!(!first.is_whitespace());
            let before = content[..chunk.start].chars().last().unwrap();
            assert!(before.is_whitespace());
        }
        let rebuilt: String = chunks.iter().map(|c| c.text).collect();
        assert_eq!(rebuilt, content);
    }

    #[test]
    fn short_content_gets_fewer_chunks() {
        let chunks = chunk_text("just two", 5);
        assert_eq!(chunks.len(), 2);
        assert!(chunk_text("", 3).is_empty());
    }
}
