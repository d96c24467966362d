use std::sync::Arc;

use crate::{CpuMap, DetectionConfig, Detector, TopologyTable};

/// Owns the topology data while the process starts up.
///
/// Everything that fills in or reorders the topology table or the processor assignments takes
/// `&mut self`, so it can only happen during the single-threaded boot phase. Once that is over,
/// [`finish()`][Self::finish] freezes the data into a [`TopologyContext`] that any number of
/// threads can read.
///
/// # Example
///
/// ```
/// use cpu_topology::{BootContext, DetectionConfig};
///
/// let mut boot = BootContext::new(&DetectionConfig::default());
/// boot.detect_all();
/// boot.optimize();
///
/// let topology = boot.finish();
///
/// for entry in topology.table().available() {
///     println!("processor {}", entry.index());
/// }
/// ```
#[derive(Debug)]
pub struct BootContext {
    detector: Detector,
    table: TopologyTable,
    cpu_map: CpuMap,
}

impl BootContext {
    /// Creates a context with a fresh topology table and no processor assignments.
    #[must_use]
    pub fn new(config: &DetectionConfig) -> Self {
        Self::with_detector(Detector::new(config))
    }

    pub(crate) fn with_detector(detector: Detector) -> Self {
        Self {
            detector,
            table: TopologyTable::new(),
            cpu_map: CpuMap::new(),
        }
    }

    /// The detector used to fill in the table.
    #[must_use]
    pub fn detector(&self) -> &Detector {
        &self.detector
    }

    /// The topology table in its current state.
    #[must_use]
    pub fn table(&self) -> &TopologyTable {
        &self.table
    }

    /// The processor assignments made so far.
    #[must_use]
    pub fn cpu_map(&self) -> &CpuMap {
        &self.cpu_map
    }

    /// The processor assignments, for filling in from configuration.
    #[must_use]
    pub fn cpu_map_mut(&mut self) -> &mut CpuMap {
        &mut self.cpu_map
    }

    /// See [`Detector::detect_usable()`].
    #[cfg_attr(test, mutants::skip)] // Forwarder.
    pub fn detect_usable(&mut self) {
        self.detector.detect_usable(&mut self.table);
    }

    /// See [`Detector::detect_full_topology()`].
    #[cfg_attr(test, mutants::skip)] // Forwarder.
    pub fn detect_full_topology(&mut self) {
        self.detector.detect_full_topology(&mut self.table);
    }

    /// See [`Detector::detect_all()`].
    #[cfg_attr(test, mutants::skip)] // Forwarder.
    pub fn detect_all(&mut self) {
        self.detector.detect_all(&mut self.table);
    }

    /// Sorts the table so the best processors for worker threads come first.
    ///
    /// See [`TopologyTable::sort_optimal()`].
    pub fn optimize(&mut self) {
        self.table.sort_optimal();
    }

    /// Sorts the table back into processor index order.
    pub fn restore_index_order(&mut self) {
        self.table.sort_by_index();
    }

    /// Ends the boot phase, making the data read-only and shareable between threads.
    #[must_use]
    pub fn finish(self) -> TopologyContext {
        TopologyContext {
            inner: Arc::new(Frozen {
                table: self.table,
                cpu_map: self.cpu_map,
            }),
        }
    }
}

/// Read-only topology data, shared between threads after the boot phase.
///
/// Clones are cheap and refer to the same data, which is released when the last clone is dropped.
#[derive(Clone, Debug)]
pub struct TopologyContext {
    inner: Arc<Frozen>,
}

#[derive(Debug)]
struct Frozen {
    table: TopologyTable,
    cpu_map: CpuMap,
}

impl TopologyContext {
    /// The topology table, in the order it had when the boot phase ended.
    #[must_use]
    pub fn table(&self) -> &TopologyTable {
        &self.inner.table
    }

    /// The processor assignments made during the boot phase.
    #[must_use]
    pub fn cpu_map(&self) -> &CpuMap {
        &self.inner.cpu_map
    }
}
