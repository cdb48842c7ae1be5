use crate::blocks::TextBlock;
use crate::grouping::Group;

pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Splits `translated_text` across the group's blocks in proportion to each
/// block's original word count, preserving word order.
///
/// The last block with any original words takes whatever is left, so joining
/// the blocks' translations with single spaces yields the input's word
/// sequence. Blocks without original words receive nothing, except that a
/// group with no original words at all hands the whole text to its first block.
pub fn distribute(group: &Group, blocks: &mut [TextBlock], translated_text: &str) {
    if group.is_empty() {
        return;
    }
    let ids = group.ids();

    let original_counts: Vec<usize> = ids
        .iter()
        .map(|&id| {
            block_index(blocks, id)
                .map(|idx| word_count(blocks[idx].original_text()))
                .unwrap_or(0)
        })
        .collect();
    let total_original: usize = original_counts.iter().sum();

    let translated_words: Vec<&str> = translated_text.split_whitespace().collect();
    let total_translated = translated_words.len();

    let chunks = if total_original == 0 {
        degenerate_chunks(ids.len(), &translated_words)
    } else {
        proportional_chunks(&original_counts, total_original, &translated_words)
    };

    for (&id, chunk) in ids.iter().zip(chunks) {
        if let Some(idx) = block_index(blocks, id) {
            blocks[idx].translated_text = chunk;
        }
    }

    tracing::debug!(
        "distributed {} words over {} blocks ({} original words)",
        total_translated,
        ids.len(),
        total_original
    );
}

fn proportional_chunks(
    original_counts: &[usize],
    total_original: usize,
    words: &[&str],
) -> Vec<String> {
    let total = words.len();
    let last = original_counts
        .iter()
        .rposition(|&count| count > 0)
        .unwrap_or(original_counts.len() - 1);
    let mut start = 0usize;
    let mut chunks = Vec::with_capacity(original_counts.len());
    for (j, &count) in original_counts.iter().enumerate() {
        let size = ((count * total) as f64 / total_original as f64).round_ties_even() as usize;
        let from = start.min(total);
        let to = match j.cmp(&last) {
            std::cmp::Ordering::Less => (start + size).min(total),
            std::cmp::Ordering::Equal => total,
            std::cmp::Ordering::Greater => from,
        };
        chunks.push(words[from..to].join(" "));
        start += size;
    }
    chunks
}

fn degenerate_chunks(members: usize, words: &[&str]) -> Vec<String> {
    let mut chunks = vec![String::new(); members];
    chunks[0] = words.join(" ");
    chunks
}

fn block_index(blocks: &[TextBlock], id: usize) -> Option<usize> {
    match blocks.get(id) {
        Some(block) if block.id() == id => Some(id),
        _ => blocks.iter().position(|block| block.id() == id),
    }
}
