//! Values-column garbage collector.
//!
//! Replacing a row's variable-length content appends the new values at the
//! tail of the shared values column and rewrites the row's indices entry; the
//! old run stays behind as garbage. Collecting on every mutation would cost
//! a compaction per set, so garbage is tolerated until `trim` runs
//! [`collect`].
//!
//! The collector must be conservative: discarding a range that still has a
//! live reference is a correctness bug, not a recoverable error. Safety
//! comes from construction — a single mark phase over the complete indices
//! column — rather than from runtime checks. An entry that points outside
//! the values column means the invariant is already broken and is reported
//! as [`Error::Consistency`].

use smallvec::SmallVec;
use tracing::debug;

use crate::column::{Column, IndicesColumn, SliceRef, ValuesColumn};
use crate::error::{Error, Result};

/// Compacts the values columns behind `indices`, dropping every run not
/// referenced by a live entry.
///
/// All live runs move to the front in their original relative order, every
/// surviving entry is remapped to its new offset, and the values columns are
/// truncated to the live total. Multiple values columns (a dictionary's keys
/// and values) are shifted in lock-step. Returns the number of elements
/// reclaimed.
///
/// Idempotent: a second pass with no intervening mutation moves nothing.
pub fn collect(
    indices: &mut IndicesColumn,
    values: &mut [&mut dyn ValuesColumn],
) -> Result<usize> {
    let value_count = match values.first() {
        Some(column) => column.count(),
        None => return Ok(0),
    };
    for column in values.iter() {
        if column.count() != value_count {
            return Err(Error::consistency(format!(
                "parallel values columns disagree on length: {} vs {value_count}",
                column.count()
            )));
        }
    }

    // Mark phase: gather live runs in offset order.
    let mut live: SmallVec<[(usize, SliceRef); 16]> = SmallVec::new();
    for row in 0..indices.count() {
        if let Some(entry) = indices.entry(row)? {
            if entry.end() as usize > value_count {
                return Err(Error::consistency(format!(
                    "row {row} references {}..{} beyond values length {value_count}",
                    entry.offset,
                    entry.end()
                )));
            }
            live.push((row, entry));
        }
    }
    live.sort_by_key(|(_, entry)| (entry.offset, entry.length));

    // Compact phase: shift live runs front-ward, remapping each entry.
    let mut cursor = 0usize;
    let mut previous: Option<(SliceRef, u32)> = None;
    for (row, entry) in live {
        // Entries sharing one run remap to the same destination without a
        // second copy.
        if let Some((source, new_offset)) = previous {
            if source == entry {
                indices.set_entry(row, Some(SliceRef::new(new_offset, entry.length)))?;
                continue;
            }
            // Distinct runs must not overlap; a crafted stream can encode
            // individually in-bounds entries whose runs intersect.
            if entry.offset < source.end() {
                return Err(Error::consistency(format!(
                    "row {row} run {}..{} overlaps run {}..{}",
                    entry.offset,
                    entry.end(),
                    source.offset,
                    source.end()
                )));
            }
        }
        for column in values.iter_mut() {
            column.shift_range(entry.offset as usize, cursor, entry.length as usize);
        }
        indices.set_entry(row, Some(SliceRef::new(cursor as u32, entry.length)))?;
        previous = Some((entry, cursor as u32));
        cursor += entry.length as usize;
    }

    for column in values.iter_mut() {
        column.truncate(cursor);
    }

    let reclaimed = value_count - cursor;
    debug!(live = cursor, reclaimed, "compacted values column");
    Ok(reclaimed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::column::{Column, NumberColumn, TypedColumn};

    fn setup(runs: &[&[i32]]) -> (IndicesColumn, NumberColumn<i32>) {
        let mut indices = IndicesColumn::new();
        let mut values = NumberColumn::new();
        for run in runs {
            indices.add();
            let offset = values.count() as u32;
            values.extend_from_slice(run);
            indices
                .set_entry(
                    indices.count() - 1,
                    Some(SliceRef::new(offset, run.len() as u32)),
                )
                .unwrap();
        }
        (indices, values)
    }

    fn row_values(
        indices: &IndicesColumn,
        values: &NumberColumn<i32>,
        row: usize,
    ) -> Option<Vec<i32>> {
        indices.entry(row).unwrap().map(|entry| {
            (entry.offset..entry.end())
                .map(|i| values.get(i as usize).unwrap())
                .collect()
        })
    }

    #[test]
    fn orphaned_runs_are_reclaimed() {
        let (mut indices, mut values) = setup(&[&[1, 2, 3], &[4, 5]]);
        // Replace row 0's content, orphaning [1, 2, 3].
        let offset = values.count() as u32;
        values.extend_from_slice(&[9]);
        indices.set_entry(0, Some(SliceRef::new(offset, 1))).unwrap();
        assert_eq!(values.count(), 6);

        let reclaimed = collect(&mut indices, &mut [&mut values]).unwrap();
        assert_eq!(reclaimed, 3);
        assert_eq!(values.count(), 3);
        assert_eq!(row_values(&indices, &values, 0), Some(vec![9]));
        assert_eq!(row_values(&indices, &values, 1), Some(vec![4, 5]));
    }

    #[test]
    fn live_content_and_order_are_preserved() {
        let (mut indices, mut values) = setup(&[&[1, 2], &[3], &[4, 5, 6]]);
        let before: Vec<_> = (0..3).map(|r| row_values(&indices, &values, r)).collect();

        collect(&mut indices, &mut [&mut values]).unwrap();

        let after: Vec<_> = (0..3).map(|r| row_values(&indices, &values, r)).collect();
        assert_eq!(before, after);
        assert_eq!(values.count(), 6);
    }

    #[test]
    fn collection_is_idempotent() {
        let (mut indices, mut values) = setup(&[&[1, 2, 3], &[4, 5]]);
        indices.set_entry(0, None).unwrap();

        let first = collect(&mut indices, &mut [&mut values]).unwrap();
        assert_eq!(first, 3);
        let snapshot = values.clone();

        let second = collect(&mut indices, &mut [&mut values]).unwrap();
        assert_eq!(second, 0);
        assert_eq!(values, snapshot);
    }

    #[test]
    fn absent_and_empty_rows_survive() {
        let (mut indices, mut values) = setup(&[&[1], &[]]);
        indices.add(); // absent row

        collect(&mut indices, &mut [&mut values]).unwrap();
        assert_eq!(row_values(&indices, &values, 0), Some(vec![1]));
        assert_eq!(row_values(&indices, &values, 1), Some(vec![]));
        assert_eq!(row_values(&indices, &values, 2), None);
    }

    #[test]
    fn shared_runs_remap_once() {
        let (mut indices, mut values) = setup(&[&[7, 8], &[9]]);
        // Point a third row at row 0's run.
        indices.add();
        let shared = indices.entry(0).unwrap().unwrap();
        indices.set_entry(2, Some(shared)).unwrap();
        // Orphan row 1's run so compaction has to move something.
        indices.set_entry(1, None).unwrap();

        collect(&mut indices, &mut [&mut values]).unwrap();
        assert_eq!(values.count(), 2);
        assert_eq!(indices.entry(0).unwrap(), indices.entry(2).unwrap());
        assert_eq!(row_values(&indices, &values, 0), Some(vec![7, 8]));
    }

    #[test]
    fn out_of_range_entry_is_a_consistency_error() {
        let (mut indices, mut values) = setup(&[&[1, 2]]);
        indices.set_entry(0, Some(SliceRef::new(1, 5))).unwrap();

        assert!(matches!(
            collect(&mut indices, &mut [&mut values]),
            Err(Error::Consistency(_))
        ));
    }

    #[test]
    fn overlapping_entries_are_a_consistency_error() {
        // Two individually in-bounds entries whose runs intersect, as a
        // crafted stream could encode them.
        let (mut indices, mut values) = setup(&[&[1, 2, 3]]);
        indices.add();
        indices.set_entry(1, Some(SliceRef::new(1, 2))).unwrap();

        assert!(matches!(
            collect(&mut indices, &mut [&mut values]),
            Err(Error::Consistency(_))
        ));
    }

    #[test]
    fn adjacent_and_shared_runs_are_not_overlaps() {
        // Back-to-back runs and an empty entry at a run boundary are legal.
        let (mut indices, mut values) = setup(&[&[1, 2], &[3]]);
        indices.add();
        indices.set_entry(2, Some(SliceRef::new(2, 0))).unwrap();

        let reclaimed = collect(&mut indices, &mut [&mut values]).unwrap();
        assert_eq!(reclaimed, 0);
        assert_eq!(row_values(&indices, &values, 0), Some(vec![1, 2]));
        assert_eq!(row_values(&indices, &values, 1), Some(vec![3]));
        assert_eq!(row_values(&indices, &values, 2), Some(vec![]));
    }

    #[test]
    fn parallel_columns_shift_in_lock_step() {
        let mut indices = IndicesColumn::new();
        let mut keys = NumberColumn::<i32>::new();
        let mut vals = NumberColumn::<i32>::new();

        indices.add();
        keys.extend_from_slice(&[10, 11]);
        vals.extend_from_slice(&[100, 110]);
        indices.set_entry(0, Some(SliceRef::new(0, 2))).unwrap();

        indices.add();
        keys.extend_from_slice(&[20]);
        vals.extend_from_slice(&[200]);
        indices.set_entry(1, Some(SliceRef::new(2, 1))).unwrap();

        // Orphan row 0.
        indices.set_entry(0, None).unwrap();
        collect(&mut indices, &mut [&mut keys, &mut vals]).unwrap();

        assert_eq!(keys.count(), 1);
        assert_eq!(vals.count(), 1);
        let entry = indices.entry(1).unwrap().unwrap();
        assert_eq!(entry, SliceRef::new(0, 1));
        assert_eq!(keys.get(0).unwrap(), 20);
        assert_eq!(vals.get(0).unwrap(), 200);
    }
}
