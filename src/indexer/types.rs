/// Last fully processed block. Only moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCursor(u64);

impl ScanCursor {
    pub fn new(block: u64) -> Self {
        Self(block)
    }

    pub fn block(&self) -> u64 {
        self.0
    }

    /// Move to `block` if it is ahead. Returns whether the cursor moved.
    pub fn advance_to(&mut self, block: u64) -> bool {
        if block > self.0 {
            self.0 = block;
            true
        } else {
            false
        }
    }
}

/// Summary of one scanner tick, logged and returned for tests.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub from_block: u64,
    pub to_block: u64,
    pub logs: usize,
    pub events: usize,
    pub delivered: usize,
    pub suppressed: usize,
    pub mempool_alerts: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_never_moves_back() {
        let mut cursor = ScanCursor::new(100);
        assert!(cursor.advance_to(105));
        assert!(!cursor.advance_to(103));
        assert!(!cursor.advance_to(105));
        assert_eq!(cursor.block(), 105);
    }
}
