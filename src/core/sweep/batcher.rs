//! Partitioning of the ID set into fixed-size batches

use crate::domain::{RecordId, Result, SweepError};

/// One unit of concurrent work: a contiguous slice of the full ID sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// Zero-based position of this batch in the partition
    pub index: usize,
    /// Record IDs, in input order
    pub ids: Vec<RecordId>,
}

impl Batch {
    /// Number of IDs in the batch
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the batch is empty (never true for batches from [`partition`])
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Partition `ids` into batches of at most `size` IDs.
///
/// Order is preserved within and across batches; only the final batch may be
/// short. Empty input yields no batches.
///
/// # Errors
///
/// Returns [`SweepError::InvalidArgument`] when `size` is zero.
///
/// # Example
///
/// ```
/// use account_sweep::core::sweep::partition;
/// use account_sweep::domain::RecordId;
///
/// let ids: Vec<RecordId> = (0..250).map(|i| RecordId::new(format!("acc-{i}")).unwrap()).collect();
/// let batches = partition(&ids, 100).unwrap();
/// let sizes: Vec<usize> = batches.iter().map(|b| b.len()).collect();
/// assert_eq!(sizes, vec![100, 100, 50]);
/// ```
pub fn partition(ids: &[RecordId], size: usize) -> Result<Vec<Batch>> {
    if size == 0 {
        return Err(SweepError::InvalidArgument(
            "batch size must be a positive integer".to_string(),
        ));
    }

    Ok(ids
        .chunks(size)
        .enumerate()
        .map(|(index, chunk)| Batch {
            index,
            ids: chunk.to_vec(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn ids(n: usize) -> Vec<RecordId> {
        (0..n)
            .map(|i| RecordId::new(format!("acc-{i:04}")).unwrap())
            .collect()
    }

    #[test_case(0, 1 ; "empty input")]
    #[test_case(1, 1 ; "single id single batch")]
    #[test_case(7, 3 ; "short tail")]
    #[test_case(9, 3 ; "exact multiple")]
    #[test_case(5, 100 ; "size larger than input")]
    #[test_case(250, 100 ; "three batches")]
    fn test_partition_reconstructs_input(n: usize, size: usize) {
        let input = ids(n);
        let batches = partition(&input, size).unwrap();

        let rebuilt: Vec<RecordId> = batches.iter().flat_map(|b| b.ids.clone()).collect();
        assert_eq!(rebuilt, input);

        if let Some((last, rest)) = batches.split_last() {
            assert!(rest.iter().all(|b| b.len() == size));
            assert!(!last.is_empty() && last.len() <= size);
        }
        assert_eq!(batches.len(), n.div_ceil(size));
    }

    #[test]
    fn test_partition_empty_yields_no_batches() {
        assert!(partition(&[], 100).unwrap().is_empty());
    }

    #[test]
    fn test_partition_zero_size_is_invalid() {
        let result = partition(&ids(3), 0);
        assert!(matches!(result, Err(SweepError::InvalidArgument(_))));
    }

    #[test]
    fn test_partition_indexes_are_sequential() {
        let batches = partition(&ids(25), 10).unwrap();
        let indexes: Vec<usize> = batches.iter().map(|b| b.index).collect();
        assert_eq!(indexes, vec![0, 1, 2]);
        assert_eq!(batches[2].ids[0].as_str(), "acc-0020");
    }
}
