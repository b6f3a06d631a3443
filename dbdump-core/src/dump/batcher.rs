//! Extended-INSERT batching under a byte budget.
//!
//! [`InsertBatcher`] receives one escaped value tuple per row and returns
//! the bytes to write. With extended inserts on, tuples are packed into one
//! statement until the next tuple would push it past `net_buffer_length`;
//! with them off, every row is its own statement.
//!
//! A statement's length is measured from the verb through the closing `;`.
//! No statement exceeds the budget unless its single row alone does.

/// Position of the batcher within the current table's row stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchState {
    /// No statement open and none written yet
    AwaitingFirstRow,
    /// A statement is open and may take more tuples
    AccumulatingStatement,
    /// The previous statement was terminated; the next row opens a new one
    Flushed,
}

/// Packs value tuples into size-bounded INSERT statements.
///
/// # Example
/// ```rust
/// use dbdump_core::dump::batcher::InsertBatcher;
///
/// let mut batcher = InsertBatcher::new("INSERT INTO `t` VALUES ", true, 1024);
/// let mut out = batcher.push(b"1,'a'");
/// out.extend(batcher.push(b"2,'b'"));
/// out.extend(batcher.finish());
/// assert_eq!(out, b"INSERT INTO `t` VALUES (1,'a'),(2,'b');\n");
/// ```
#[derive(Debug, Clone)]
pub struct InsertBatcher {
    prefix: String,
    extended: bool,
    budget: usize,
    state: BatchState,
    open_len: usize,
    rows: u64,
    statements: u64,
}

/// Terminator of every statement; only `;` counts against the budget.
const TERMINATOR: &[u8] = b";\n";
const TERMINATOR_COST: usize = 1;

impl InsertBatcher {
    /// Creates a batcher for one table.
    ///
    /// `prefix` is everything before the first tuple, e.g.
    /// ``INSERT INTO `t` VALUES ``.
    pub fn new(prefix: impl Into<String>, extended: bool, budget: usize) -> Self {
        Self {
            prefix: prefix.into(),
            extended,
            budget,
            state: BatchState::AwaitingFirstRow,
            open_len: 0,
            rows: 0,
            statements: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> BatchState {
        self.state
    }

    /// Rows pushed so far.
    pub fn rows(&self) -> u64 {
        self.rows
    }

    /// Statements opened so far.
    pub fn statements(&self) -> u64 {
        self.statements
    }

    /// Adds one row given its comma-joined escaped values.
    pub fn push(&mut self, tuple: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(tuple.len().saturating_add(4));
        let tuple_len = tuple.len().saturating_add(2);

        if self.state == BatchState::AccumulatingStatement {
            // appended as ",(...)"
            let projected = self
                .open_len
                .saturating_add(1)
                .saturating_add(tuple_len)
                .saturating_add(TERMINATOR_COST);
            if !self.extended || projected > self.budget {
                self.terminate(&mut out);
            }
        }

        if self.state == BatchState::AccumulatingStatement {
            out.push(b',');
            self.open_len = self.open_len.saturating_add(1);
        } else {
            out.extend_from_slice(self.prefix.as_bytes());
            self.open_len = self.prefix.len();
            self.state = BatchState::AccumulatingStatement;
            self.statements = self.statements.saturating_add(1);
        }
        out.push(b'(');
        out.extend_from_slice(tuple);
        out.push(b')');
        self.open_len = self.open_len.saturating_add(tuple_len);
        self.rows = self.rows.saturating_add(1);

        if !self.extended || self.open_len.saturating_add(TERMINATOR_COST) > self.budget {
            self.terminate(&mut out);
        }
        out
    }

    /// Terminates any open statement at the end of the row stream.
    pub fn finish(&mut self) -> Vec<u8> {
        let mut out = Vec::new();
        if self.state == BatchState::AccumulatingStatement {
            self.terminate(&mut out);
        }
        out
    }

    fn terminate(&mut self, out: &mut Vec<u8>) {
        out.extend_from_slice(TERMINATOR);
        self.open_len = 0;
        self.state = BatchState::Flushed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const PREFIX: &str = "INSERT INTO `t` VALUES ";

    fn run(batcher: &mut InsertBatcher, tuples: &[String]) -> String {
        let mut out = Vec::new();
        for tuple in tuples {
            out.extend(batcher.push(tuple.as_bytes()));
        }
        out.extend(batcher.finish());
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_extended_insert_packs_rows() {
        let mut batcher = InsertBatcher::new(PREFIX, true, 1_000_000);
        let out = run(&mut batcher, &["1,'a'".to_string(), "2,'b'".to_string()]);
        assert_eq!(out, "INSERT INTO `t` VALUES (1,'a'),(2,'b');\n");
        assert_eq!(batcher.rows(), 2);
        assert_eq!(batcher.statements(), 1);
        assert_eq!(batcher.state(), BatchState::Flushed);
    }

    #[test]
    fn test_single_row_statements_without_extended_insert() {
        let mut batcher = InsertBatcher::new(PREFIX, false, 1_000_000);
        let out = run(&mut batcher, &["1".to_string(), "2".to_string()]);
        assert_eq!(out, "INSERT INTO `t` VALUES (1);\nINSERT INTO `t` VALUES (2);\n");
        assert_eq!(batcher.statements(), 2);
    }

    #[test]
    fn test_empty_stream_writes_nothing() {
        let mut batcher = InsertBatcher::new(PREFIX, true, 1024);
        assert!(batcher.finish().is_empty());
        assert_eq!(batcher.state(), BatchState::AwaitingFirstRow);
    }

    #[test]
    fn test_flush_before_budget_is_exceeded() {
        // prefix 23 bytes + "(1)" = 26, + ",(2)" = 30, + ";" = 31
        let mut batcher = InsertBatcher::new(PREFIX, true, 30);
        let out = run(&mut batcher, &["1".to_string(), "2".to_string()]);
        assert_eq!(out, "INSERT INTO `t` VALUES (1);\nINSERT INTO `t` VALUES (2);\n");

        let mut batcher = InsertBatcher::new(PREFIX, true, 31);
        let out = run(&mut batcher, &["1".to_string(), "2".to_string()]);
        assert_eq!(out, "INSERT INTO `t` VALUES (1),(2);\n");
    }

    #[test]
    fn test_oversized_row_forms_its_own_statement() {
        let big = "x".repeat(100);
        let mut batcher = InsertBatcher::new(PREFIX, true, 40);
        let out = run(&mut batcher, &["1".to_string(), big.clone(), "2".to_string()]);
        assert_eq!(
            out,
            format!("{PREFIX}(1);\n{PREFIX}({big});\n{PREFIX}(2);\n")
        );
    }

    fn statements(out: &str) -> Vec<&str> {
        out.split_inclusive(";\n")
            .map(|statement| statement.trim_end_matches('\n'))
            .collect()
    }

    proptest! {
        #[test]
        fn prop_statements_respect_budget(
            tuples in proptest::collection::vec("[a-z0-9]{0,300}", 0..60),
            budget in 1024usize..4096,
        ) {
            let mut batcher = InsertBatcher::new(PREFIX, true, budget);
            let out = run(&mut batcher, &tuples);
            for statement in statements(&out) {
                let single_row = !statement.contains("),(");
                prop_assert!(statement.len() <= budget || single_row);
                prop_assert!(statement.ends_with(';'));
            }
            prop_assert_eq!(batcher.rows(), tuples.len() as u64);
        }

        #[test]
        fn prop_replay_is_byte_identical(
            tuples in proptest::collection::vec("[a-z0-9',]{0,80}", 0..40),
            extended in any::<bool>(),
        ) {
            let first = run(&mut InsertBatcher::new(PREFIX, extended, 1024), &tuples);
            let second = run(&mut InsertBatcher::new(PREFIX, extended, 1024), &tuples);
            prop_assert_eq!(first, second);
        }
    }
}
