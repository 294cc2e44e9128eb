//! Running-process probe.

use std::fs;
use std::path::PathBuf;

/// Checks /proc for processes whose command name matches a watch list.
pub struct ProcessProbe {
    proc_root: PathBuf,
    names: Vec<String>,
}

impl ProcessProbe {
    /// Creates a probe for the given process names (case-insensitive).
    pub fn new(names: &[String]) -> Self {
        Self::with_proc_root("/proc", names)
    }

    /// Creates a probe that reads an alternate procfs root.
    pub fn with_proc_root<P: Into<PathBuf>>(proc_root: P, names: &[String]) -> Self {
        Self {
            proc_root: proc_root.into(),
            names: names.iter().map(|n| n.to_lowercase()).collect(),
        }
    }

    /// Returns true if the watch list is empty.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Returns the first running process from the watch list.
    pub fn running(&self) -> Option<String> {
        if self.names.is_empty() {
            return None;
        }
        let entries = fs::read_dir(&self.proc_root).ok()?;
        for entry in entries.flatten() {
            let is_pid = entry
                .file_name()
                .to_str()
                .is_some_and(|name| name.chars().all(|c| c.is_ascii_digit()));
            if !is_pid {
                continue;
            }
            let Ok(comm) = fs::read_to_string(entry.path().join("comm")) else {
                continue;
            };
            let comm = comm.trim().to_lowercase();
            if self.names.iter().any(|name| *name == comm) {
                return Some(comm);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_proc(tag: &str, processes: &[(&str, &str)]) -> PathBuf {
        let root = std::env::temp_dir().join(format!(
            "blinkystrip-proc-{}-{}",
            tag,
            std::process::id()
        ));
        for (pid, comm) in processes {
            let dir = root.join(pid);
            fs::create_dir_all(&dir).unwrap();
            fs::write(dir.join("comm"), format!("{}\n", comm)).unwrap();
        }
        root
    }

    #[test]
    fn test_finds_watched_process() {
        let root = fake_proc("found", &[("1", "systemd"), ("4242", "Factorio")]);
        let probe = ProcessProbe::with_proc_root(&root, &["factorio".to_string()]);
        assert_eq!(probe.running().as_deref(), Some("factorio"));
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_ignores_non_pid_entries() {
        let root = fake_proc("nonpid", &[("self", "factorio"), ("7", "bash")]);
        let probe = ProcessProbe::with_proc_root(&root, &["factorio".to_string()]);
        assert_eq!(probe.running(), None);
        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_empty_watch_list() {
        let probe = ProcessProbe::new(&[]);
        assert!(probe.is_empty());
        assert_eq!(probe.running(), None);
    }
}
