use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};

use cpuset::CpuId;

use crate::pal::linux::Filesystem;

/// The virtual filesystem of the real operating system, rooted at the configured sysfs directory
/// (normally `/sys/devices/system`).
///
/// Tests point the root at a temporary directory laid out like sysfs to exercise the real file
/// access code against a known topology.
#[derive(Debug)]
pub(crate) struct BuildTargetFilesystem {
    root: PathBuf,
}

impl BuildTargetFilesystem {
    pub(crate) fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
        }
    }

    fn read(&self, relative: impl AsRef<Path>) -> Option<String> {
        fs::read_to_string(self.root.join(relative)).ok()
    }
}

impl Filesystem for BuildTargetFilesystem {
    fn get_cpu_online_contents(&self) -> Option<String> {
        self.read("cpu/online")
    }

    fn get_cpu_attribute_contents(&self, cpu: CpuId, attribute: &str) -> Option<String> {
        self.read(format!("cpu/cpu{cpu}/{attribute}"))
    }

    fn get_node_entry_names(&self) -> Option<Vec<String>> {
        let entries = fs::read_dir(self.root.join("node")).ok()?;

        Some(
            entries
                .filter_map(Result::ok)
                .filter_map(|entry| entry.file_name().into_string().ok())
                .collect(),
        )
    }

    fn get_node_cpulist_contents(&self, node_entry: &str) -> Option<String> {
        self.read(format!("node/{node_entry}/cpulist"))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn reads_relative_to_root() {
        let root = tempfile::tempdir().unwrap();

        fs::create_dir_all(root.path().join("cpu/cpu3/topology")).unwrap();
        fs::create_dir_all(root.path().join("node/node1")).unwrap();
        fs::write(root.path().join("cpu/online"), "0-7\n").unwrap();
        fs::write(
            root.path().join("cpu/cpu3/topology/thread_siblings_list"),
            "3,7\n",
        )
        .unwrap();
        fs::write(root.path().join("node/node1/cpulist"), "4-7\n").unwrap();
        fs::write(root.path().join("node/possible"), "0-1\n").unwrap();

        let filesystem = BuildTargetFilesystem::new(root.path());

        assert_eq!(
            filesystem.get_cpu_online_contents().as_deref(),
            Some("0-7\n")
        );
        assert_eq!(
            filesystem
                .get_cpu_attribute_contents(3, "topology/thread_siblings_list")
                .as_deref(),
            Some("3,7\n")
        );
        assert_eq!(
            filesystem.get_cpu_attribute_contents(4, "topology/thread_siblings_list"),
            None
        );
        assert_eq!(
            filesystem.get_node_cpulist_contents("node1").as_deref(),
            Some("4-7\n")
        );

        let mut names = filesystem.get_node_entry_names().unwrap();
        names.sort();
        assert_eq!(names, vec!["node1".to_string(), "possible".to_string()]);
    }

    #[test]
    fn missing_root_is_unknown() {
        let root = tempfile::tempdir().unwrap();
        let filesystem = BuildTargetFilesystem::new(&root.path().join("does-not-exist"));

        assert_eq!(filesystem.get_cpu_online_contents(), None);
        assert_eq!(filesystem.get_node_entry_names(), None);
    }
}
