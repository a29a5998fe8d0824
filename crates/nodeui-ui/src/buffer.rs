use nodeui_core::Block;

/// Number of rounds fetched when the explorer starts.
pub const INITIAL_WINDOW: u64 = 25;

/// Oldest blocks are dropped beyond this many.
pub const MAX_BLOCKS: usize = 10_000;

/// Blocks ordered by ascending round without duplicates.
///
/// Merges only extend the newest end: anything at or below the current
/// frontier is a stale or repeated result and is dropped.
#[derive(Debug, Default)]
pub struct BlockBuffer {
    blocks: Vec<Block>,
}

impl BlockBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    #[must_use]
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Highest buffered round.
    #[must_use]
    pub fn frontier(&self) -> Option<u64> {
        self.blocks.last().map(|b| b.round)
    }

    /// Block at `index` counting from the newest.
    #[must_use]
    pub fn newest(&self, index: usize) -> Option<&Block> {
        self.blocks.iter().rev().nth(index)
    }

    /// Merge fetched blocks in any order. Returns how many were appended.
    pub fn merge(&mut self, mut incoming: Vec<Block>) -> usize {
        incoming.sort_by_key(|b| b.round);

        let mut appended = 0;
        for block in incoming {
            if self.frontier().is_some_and(|frontier| block.round <= frontier) {
                continue;
            }
            self.blocks.push(block);
            appended += 1;
        }

        if self.blocks.len() > MAX_BLOCKS {
            let excess = self.blocks.len() - MAX_BLOCKS;
            self.blocks.drain(..excess);
        }
        appended
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }
}
