use std::path::{Path, PathBuf};

/// Where detection looks for the sysfs tree unless told otherwise.
pub const DEFAULT_SYSFS_ROOT: &str = "/sys/devices/system";

/// Options that control how the processor topology is detected.
///
/// The defaults describe the real operating system. Only Linux consults the sysfs root; the
/// other platforms ignore it.
///
/// # Example
///
/// ```
/// use cpu_topology::DetectionConfig;
///
/// let config = DetectionConfig::default().with_sysfs_root("/tmp/fake-sysfs");
/// assert_eq!(config.sysfs_root().to_str(), Some("/tmp/fake-sysfs"));
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DetectionConfig {
    sysfs_root: PathBuf,
}

impl DetectionConfig {
    /// Reads the sysfs tree from `root` instead of [`DEFAULT_SYSFS_ROOT`].
    ///
    /// The directory is expected to be laid out like `/sys/devices/system`, with `cpu` and
    /// `node` subdirectories.
    #[must_use]
    pub fn with_sysfs_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.sysfs_root = root.into();
        self
    }

    /// The directory holding the `cpu` and `node` sysfs subdirectories.
    #[must_use]
    pub fn sysfs_root(&self) -> &Path {
        &self.sysfs_root
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_ROOT),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn default_is_real_sysfs() {
        assert_eq!(
            DetectionConfig::default().sysfs_root(),
            Path::new("/sys/devices/system")
        );
    }

    #[test]
    fn with_sysfs_root_overrides() {
        let config = DetectionConfig::default().with_sysfs_root("/somewhere/else");

        assert_eq!(config.sysfs_root(), Path::new("/somewhere/else"));
        assert_ne!(config, DetectionConfig::default());
    }
}
