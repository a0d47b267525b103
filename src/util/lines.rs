/// Maps byte offsets of a source string to line and column numbers.
pub struct LineIndex {
    /// Offset of the first byte of each line.
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(src: &str) -> LineIndex {
        let starts = std::iter::once(0)
            .chain(src.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        LineIndex { starts }
    }

    /// Returns the 1-based line and column of `offset`. Columns count bytes.
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let line = self.starts.partition_point(|&start| start <= offset) - 1;
        let col = offset - self.starts[line];
        let to_u32 = |n: usize| u32::try_from(n + 1).unwrap_or(u32::MAX);
        (to_u32(line), to_u32(col))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_map_to_lines_and_columns() {
        let index = LineIndex::new("ab\ncd\n\nefg");
        assert_eq!(index.line_col(0), (1, 1));
        assert_eq!(index.line_col(1), (1, 2));
        assert_eq!(index.line_col(2), (1, 3));
        assert_eq!(index.line_col(3), (2, 1));
        assert_eq!(index.line_col(6), (3, 1));
        assert_eq!(index.line_col(9), (4, 3));
        // End of input, where `Eof` sits.
        assert_eq!(index.line_col(10), (4, 4));
    }

    #[test]
    fn empty_input() {
        assert_eq!(LineIndex::new("").line_col(0), (1, 1));
    }
}
