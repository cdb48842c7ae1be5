use serde::Serialize;

use crate::blocks::TextBlock;

pub const DEFAULT_MAX_DISTANCE: u32 = 70;

/// Block ids of one bubble, in reading order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Group(Vec<usize>);

impl Group {
    pub fn ids(&self) -> &[usize] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<usize>> for Group {
    fn from(ids: Vec<usize>) -> Self {
        Group(ids)
    }
}

/// Clusters blocks into bubbles by vertical proximity.
///
/// Only the gap between a block's top and the preceding block's last row is
/// considered; side-by-side bubbles at the same height are merged whenever
/// that gap qualifies. Overlapping boxes (negative gap) always split.
#[derive(Debug, Clone, Copy)]
pub struct BubbleGrouper {
    max_distance: u32,
}

impl Default for BubbleGrouper {
    fn default() -> Self {
        Self {
            max_distance: DEFAULT_MAX_DISTANCE,
        }
    }
}

impl BubbleGrouper {
    pub fn new(max_distance: u32) -> Self {
        Self { max_distance }
    }

    pub fn group(&self, blocks: &[TextBlock]) -> Vec<Group> {
        let mut sorted: Vec<&TextBlock> = blocks.iter().collect();
        sorted.sort_by_key(|block| {
            let (cx, cy) = block.rect().center2();
            (cy, cx, block.id())
        });

        let mut iter = sorted.into_iter();
        let Some(first) = iter.next() else {
            return Vec::new();
        };

        let max_distance = self.max_distance as i64;
        let mut groups = Vec::new();
        let mut current = vec![first.id()];
        let mut previous = first;
        for block in iter {
            let gap = block.rect().top() - previous.rect().bottom();
            if (0..max_distance).contains(&gap) {
                current.push(block.id());
            } else {
                groups.push(Group(std::mem::take(&mut current)));
                current.push(block.id());
            }
            previous = block;
        }
        groups.push(Group(current));
        groups
    }
}
