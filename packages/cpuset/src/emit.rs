use itertools::Itertools;

use crate::CpuId;

/// Formats processor IDs as a range list, collapsing consecutive IDs into ranges.
///
/// The input may be in any order and may contain duplicates. The output is sorted and is accepted
/// by [`parse_ranges()`][crate::parse_ranges].
///
/// # Example
///
/// ```
/// assert_eq!(cpuset::emit([8, 0, 1, 2, 3]), "0-3,8");
/// ```
pub fn emit<I>(cpus: I) -> String
where
    I: IntoIterator<Item = CpuId>,
{
    cpus.into_iter()
        .sorted_unstable()
        .dedup()
        .map(|cpu| (cpu, cpu))
        .coalesce(|(start, end), (next_start, next_end)| {
            if end.checked_add(1) == Some(next_start) {
                Ok((start, next_end))
            } else {
                Err(((start, end), (next_start, next_end)))
            }
        })
        .map(|(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{start}-{end}")
            }
        })
        .join(",")
}
