use std::fmt::{self, Debug, Display};
use std::iter::FusedIterator;

use crate::{CpuId, Error, emit};

/// Maximum number of logical processors a [`CpuSet`] can describe on this build target.
///
/// This matches the size of the native affinity mask (`CPU_SETSIZE`) of the operating system.
#[cfg(target_os = "linux")]
pub const MAX_CPUS: usize = 1024;

/// Maximum number of logical processors a [`CpuSet`] can describe on this build target.
///
/// This matches the size of the native affinity mask (`CPU_SETSIZE`) of the operating system.
#[cfg(target_os = "freebsd")]
pub const MAX_CPUS: usize = 256;

/// Maximum number of logical processors a [`CpuSet`] can describe on this build target.
///
/// Targets without a native affinity mask get one machine word worth of processors.
#[cfg(not(any(target_os = "linux", target_os = "freebsd")))]
pub const MAX_CPUS: usize = 64;

#[expect(
    clippy::cast_possible_truncation,
    reason = "MAX_CPUS is a small constant that always fits in CpuId"
)]
pub(crate) const MAX_CPU_ID: CpuId = (MAX_CPUS - 1) as CpuId;

const WORD_BITS: usize = u64::BITS as usize;
const WORDS: usize = MAX_CPUS / WORD_BITS;

/// A set of logical processors, stored as a fixed-capacity bit vector.
///
/// The capacity is [`MAX_CPUS`] and is the same for every instance. Adding or removing a processor
/// with an ID at or beyond the capacity fails and leaves the set unchanged.
///
/// # Example
///
/// ```
/// use cpuset::CpuSet;
///
/// let mut cpus = CpuSet::new();
/// cpus.set(3).unwrap();
/// cpus.set(1).unwrap();
///
/// assert_eq!(cpus.count(), 2);
/// assert_eq!(cpus.first_set(), Some(1));
/// assert!(cpus.set(u32::MAX).is_err());
/// ```
#[derive(Clone, Copy, Eq, Hash, PartialEq)]
pub struct CpuSet {
    words: [u64; WORDS],
}

impl CpuSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self { words: [0; WORDS] }
    }

    /// Creates a set containing exactly the given processors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CpuOutOfRange`] if any processor ID is at or beyond the capacity.
    pub fn from_cpus<I>(cpus: I) -> crate::Result<Self>
    where
        I: IntoIterator<Item = CpuId>,
    {
        let mut set = Self::new();

        for cpu in cpus {
            set.set(cpu)?;
        }

        Ok(set)
    }

    /// The number of processors any set can hold on this build target.
    #[cfg_attr(test, mutants::skip)] // Constant.
    #[must_use]
    pub const fn capacity() -> usize {
        MAX_CPUS
    }

    /// Removes every processor from the set.
    pub fn zero(&mut self) {
        self.words = [0; WORDS];
    }

    /// Adds a processor to the set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CpuOutOfRange`] without modifying the set if `cpu` is at or beyond
    /// the capacity.
    pub fn set(&mut self, cpu: CpuId) -> crate::Result<()> {
        let (word, mask) = locate(cpu)?;

        if let Some(word) = self.words.get_mut(word) {
            *word |= mask;
        }

        Ok(())
    }

    /// Removes a processor from the set.
    ///
    /// # Errors
    ///
    /// Returns [`Error::CpuOutOfRange`] without modifying the set if `cpu` is at or beyond
    /// the capacity.
    pub fn clear(&mut self, cpu: CpuId) -> crate::Result<()> {
        let (word, mask) = locate(cpu)?;

        if let Some(word) = self.words.get_mut(word) {
            *word &= !mask;
        }

        Ok(())
    }

    /// Whether the processor is in the set. Processors beyond the capacity never are.
    #[must_use]
    pub fn test(&self, cpu: CpuId) -> bool {
        locate(cpu).is_ok_and(|(word, mask)| {
            self.words
                .get(word)
                .is_some_and(|word| word & mask != 0)
        })
    }

    /// Adds every processor of `other` to this set.
    pub fn union(&mut self, other: &Self) {
        for (word, other) in self.words.iter_mut().zip(other.words) {
            *word |= other;
        }
    }

    /// Removes every processor that is not also in `other` from this set.
    pub fn intersect(&mut self, other: &Self) {
        for (word, other) in self.words.iter_mut().zip(other.words) {
            *word &= other;
        }
    }

    /// Replaces the contents of this set with the contents of `other`.
    pub fn assign(&mut self, other: &Self) {
        self.words = other.words;
    }

    /// The number of processors in the set.
    #[must_use]
    pub fn count(&self) -> usize {
        self.words.iter().map(|word| word.count_ones() as usize).sum()
    }

    /// Whether the set contains no processors.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|word| *word == 0)
    }

    /// The lowest processor ID in the set, or `None` if the set is empty.
    #[must_use]
    pub fn first_set(&self) -> Option<CpuId> {
        self.iter().next()
    }

    /// Iterates over the processors in the set in ascending order.
    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            words: &self.words,
            word_index: 0,
            remaining: self.words.first().copied().unwrap_or_default(),
        }
    }
}

impl Default for CpuSet {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for CpuSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&emit(self))
    }
}

impl Debug for CpuSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CpuSet({self})")
    }
}

impl<'a> IntoIterator for &'a CpuSet {
    type Item = CpuId;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the processors of a [`CpuSet`], in ascending order.
#[derive(Clone, Debug)]
pub struct Iter<'a> {
    words: &'a [u64; WORDS],
    word_index: usize,

    // Bits of the current word that have not been yielded yet.
    remaining: u64,
}

impl Iterator for Iter<'_> {
    type Item = CpuId;

    #[expect(
        clippy::arithmetic_side_effects,
        clippy::cast_possible_truncation,
        reason = "bit positions are bounded by MAX_CPUS, which fits in CpuId"
    )]
    fn next(&mut self) -> Option<Self::Item> {
        while self.remaining == 0 {
            self.word_index += 1;
            self.remaining = *self.words.get(self.word_index)?;
        }

        let bit = self.remaining.trailing_zeros() as usize;
        self.remaining &= self.remaining - 1;

        Some((self.word_index * WORD_BITS + bit) as CpuId)
    }
}

impl FusedIterator for Iter<'_> {}

#[expect(
    clippy::integer_division,
    clippy::modulo_arithmetic,
    reason = "splitting a bit index into word and bit position"
)]
fn locate(cpu: CpuId) -> crate::Result<(usize, u64)> {
    let index = cpu as usize;

    if index >= MAX_CPUS {
        return Err(Error::CpuOutOfRange {
            cpu: u64::from(cpu),
            max: MAX_CPU_ID,
        });
    }

    Ok((index / WORD_BITS, 1 << (index % WORD_BITS)))
}
