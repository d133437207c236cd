use crate::error::ImportError;
use crate::record::RawRecord;

/// Default number of rows per insert request.
pub const DEFAULT_BATCH_SIZE: usize = 25_000;

/// A contiguous slice of the input, submitted to the store as one request.
#[derive(Debug, Clone, Copy)]
pub struct Batch<'a> {
    /// Position of this batch in the run, starting at 0.
    pub index: usize,
    /// Offset of the first record within the full input.
    pub offset: usize,
    pub records: &'a [RawRecord],
}

impl Batch<'_> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Split `records` into consecutive batches of `batch_size`, preserving order.
/// Only the last batch may be shorter.
pub fn partition(
    records: &[RawRecord],
    batch_size: usize,
) -> Result<impl Iterator<Item = Batch<'_>>, ImportError> {
    if batch_size == 0 {
        return Err(ImportError::InvalidBatchSize(batch_size));
    }
    Ok(records
        .chunks(batch_size)
        .enumerate()
        .map(move |(index, records)| Batch {
            index,
            offset: index * batch_size,
            records,
        }))
}

/// Number of batches `partition` yields for `len` records.
pub fn batch_count(len: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        return 0;
    }
    len.div_ceil(batch_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(n: usize) -> Vec<RawRecord> {
        (0..n)
            .map(|i| RawRecord::new(&(1900 + i).to_string(), "Make", "Model"))
            .collect()
    }

    #[test]
    fn batch_count_is_ceiling() {
        for (len, size) in [(0, 3), (1, 3), (3, 3), (4, 3), (10, 3), (25_001, 25_000)] {
            let input = rows(len);
            let batches: Vec<_> = partition(&input, size).unwrap().collect();
            assert_eq!(batches.len(), batch_count(len, size), "len={len} size={size}");
            assert_eq!(batches.len(), (len + size - 1) / size);
        }
    }

    #[test]
    fn only_last_batch_is_short() {
        let input = rows(10);
        let batches: Vec<_> = partition(&input, 4).unwrap().collect();
        let sizes: Vec<usize> = batches.iter().map(Batch::len).collect();
        assert_eq!(sizes, vec![4, 4, 2]);
        assert_eq!(
            batches.iter().map(|b| b.offset).collect::<Vec<_>>(),
            vec![0, 4, 8]
        );
    }

    #[test]
    fn preserves_order() {
        let input = rows(7);
        let flattened: Vec<&RawRecord> = partition(&input, 3)
            .unwrap()
            .flat_map(|b| b.records.iter())
            .collect();
        assert_eq!(flattened, input.iter().collect::<Vec<_>>());
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        let input = rows(2);
        assert!(matches!(
            partition(&input, 0),
            Err(ImportError::InvalidBatchSize(0))
        ));
    }
}
