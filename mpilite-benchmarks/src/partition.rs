//! Row partitioning of an n x n matrix across participants.

/// Number of rows owned by `rank` when `total` rows are split across
/// `participants`.
///
/// Remainder rows go to the lowest ranks first.
#[inline]
pub fn rows_for_rank(total: usize, participants: usize, rank: usize) -> usize {
    total / participants + usize::from(rank < total % participants)
}

/// Contiguous, order-preserving split of the row index space.
///
/// `counts()` and `displs()` are in elements and can be handed directly to
/// a variable-count scatter or gather.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowPartition {
    rows: Vec<usize>,
    counts: Vec<usize>,
    displs: Vec<usize>,
}

impl RowPartition {
    /// Split `total_rows` rows of `row_len` elements across `participants`.
    ///
    /// Panics if `participants` is zero.
    pub fn new(total_rows: usize, row_len: usize, participants: usize) -> RowPartition {
        assert!(participants > 0, "a partition needs at least one participant");
        let rows: Vec<usize> = (0..participants)
            .map(|rank| rows_for_rank(total_rows, participants, rank))
            .collect();
        let counts: Vec<usize> = rows.iter().map(|rows| rows * row_len).collect();
        let displs = counts
            .iter()
            .scan(0, |disp, &count| {
                let start = *disp;
                *disp += count;
                Some(start)
            })
            .collect();
        RowPartition {
            rows,
            counts,
            displs,
        }
    }

    /// Rows owned by `rank`.
    pub fn rows(&self, rank: usize) -> usize {
        self.rows[rank]
    }

    /// Per-rank row counts.
    pub fn row_counts(&self) -> &[usize] {
        &self.rows
    }

    /// Per-rank element counts.
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Per-rank element displacements.
    pub fn displs(&self) -> &[usize] {
        &self.displs
    }

    /// Byte offset of `rank`'s first element for elements of `elem_size` bytes.
    pub fn byte_offset(&self, rank: usize, elem_size: usize) -> usize {
        self.displs[rank] * elem_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_sum_to_total_and_stay_balanced() {
        for participants in 1..=9 {
            for total in 0..=70 {
                let part = RowPartition::new(total, 1, participants);
                let rows = part.row_counts();
                assert_eq!(rows.iter().sum::<usize>(), total);
                let max = rows.iter().max().unwrap();
                let min = rows.iter().min().unwrap();
                assert!(max - min <= 1, "total {} over {}: {:?}", total, participants, rows);
            }
        }
    }

    #[test]
    fn remainder_goes_to_lowest_ranks() {
        for participants in 1..=9 {
            for total in 0..=70 {
                let base = total / participants;
                let remainder = total % participants;
                for rank in 0..participants {
                    let expected = if rank < remainder { base + 1 } else { base };
                    assert_eq!(rows_for_rank(total, participants, rank), expected);
                }
            }
        }
    }

    #[test]
    fn displacements_tile_the_buffer() {
        let part = RowPartition::new(4, 4, 3);
        assert_eq!(part.row_counts(), &[2, 1, 1]);
        assert_eq!(part.counts(), &[8, 4, 4]);
        assert_eq!(part.displs(), &[0, 8, 12]);
        assert_eq!(part.byte_offset(2, 4), 48);
    }

    #[test]
    fn even_split() {
        let part = RowPartition::new(8, 8, 4);
        assert_eq!(part.row_counts(), &[2, 2, 2, 2]);
        assert_eq!(part.displs(), &[0, 16, 32, 48]);
    }

    #[test]
    fn more_participants_than_rows() {
        let part = RowPartition::new(2, 2, 5);
        assert_eq!(part.row_counts(), &[1, 1, 0, 0, 0]);
        assert_eq!(part.displs(), &[0, 2, 4, 4, 4]);
    }
}
