//! Clean logic
//!
//! Discards everything a build produced: the shared install prefix, the
//! shared build root, and the source tree of every module built in place
//! (those trees are polluted by the build and get re-cloned next time).
//! The build state is neither read nor written. Instead the next build
//! notices the missing prefix and forgets what the state recorded.

use std::path::PathBuf;

use crate::core::manifest::Layout;
use crate::core::module::Module;
use crate::core::state::BuildState;
use crate::error::FilesystemError;
use crate::infra::filesystem;

/// Result of clean operation
#[derive(Debug, Default)]
pub struct CleanResult {
    /// Paths that were removed
    pub removed: Vec<PathBuf>,
    /// Paths that didn't exist (skipped)
    pub skipped: Vec<PathBuf>,
}

/// Paths clean removes, in removal order
pub fn clean_targets(layout: &Layout, modules: &[Module]) -> Vec<PathBuf> {
    let mut targets = vec![layout.prefix.clone(), layout.build_root.clone()];
    targets.extend(
        modules
            .iter()
            .filter(|m| !m.out_of_source)
            .map(|m| m.source_dir().to_path_buf()),
    );
    targets
}

/// Remove build outputs and in-source module trees
pub fn clean(layout: &Layout, modules: &[Module]) -> Result<CleanResult, FilesystemError> {
    let mut result = CleanResult::default();

    for target in clean_targets(layout, modules) {
        if filesystem::remove_tree(&target)? {
            result.removed.push(target);
        } else {
            result.skipped.push(target);
        }
    }

    Ok(result)
}

/// Whether anything clean would remove exists
pub fn has_build_artifacts(layout: &Layout, modules: &[Module]) -> bool {
    clean_targets(layout, modules)
        .iter()
        .any(|p| p.exists())
}

/// Reconcile `state` with the install prefix before a build
///
/// A missing prefix means nothing recorded in `state` is installed any
/// more, so every entry is dropped and the prefix is created. Returns
/// whether recorded entries were dropped.
pub fn prepare_prefix(layout: &Layout, state: &mut BuildState) -> Result<bool, FilesystemError> {
    if layout.prefix.is_dir() {
        return Ok(false);
    }

    let dropped = !state.is_empty();
    if dropped {
        tracing::info!(
            prefix = %layout.prefix.display(),
            modules = state.len(),
            "install prefix missing, rebuilding every module"
        );
        state.clear();
    }
    filesystem::create_dir_all(&layout.prefix)?;
    Ok(dropped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::state::Revision;
    use assert_fs::prelude::*;
    use predicates::prelude::*;
    use std::path::Path;

    fn layout(root: &Path) -> Layout {
        Layout {
            home: root.to_path_buf(),
            source_root: root.join("source"),
            build_root: root.join("build"),
            prefix: root.join("install"),
            lib_dir: root.join("install").join("lib"),
        }
    }

    fn modules(layout: &Layout) -> Vec<Module> {
        vec![
            Module::new("inplace", "url").located_in(&layout.source_root, &layout.build_root),
            Module::new("separate", "url")
                .with_out_of_source(true)
                .located_in(&layout.source_root, &layout.build_root),
        ]
    }

    #[test]
    fn test_clean_removes_outputs_and_in_source_trees() {
        let temp = assert_fs::TempDir::new().unwrap();
        let layout = layout(temp.path());
        temp.child("install/lib/libfoo.so").write_str("elf").unwrap();
        temp.child("build/separate/foo.o").write_str("obj").unwrap();
        temp.child("source/inplace/Makefile").write_str("all:").unwrap();
        temp.child("source/separate/autogen.sh").write_str("#!/bin/sh").unwrap();

        let result = clean(&layout, &modules(&layout)).unwrap();

        temp.child("install").assert(predicate::path::missing());
        temp.child("build").assert(predicate::path::missing());
        temp.child("source/inplace").assert(predicate::path::missing());
        temp.child("source/separate/autogen.sh")
            .assert(predicate::path::exists());
        assert_eq!(result.removed.len(), 3);
        assert!(result.skipped.is_empty());
    }

    #[test]
    fn test_clean_without_state_or_outputs_succeeds() {
        let temp = assert_fs::TempDir::new().unwrap();
        let layout = layout(temp.path());

        let result = clean(&layout, &modules(&layout)).unwrap();

        assert!(result.removed.is_empty());
        assert_eq!(result.skipped.len(), 3);
        temp.child("state.json").assert(predicate::path::missing());
    }

    #[test]
    fn test_clean_leaves_state_file() {
        let temp = assert_fs::TempDir::new().unwrap();
        let layout = layout(temp.path());
        temp.child("state.json")
            .write_str(r#"{"built_modules": {}}"#)
            .unwrap();
        temp.child("install/bin/tool").write_str("x").unwrap();

        clean(&layout, &modules(&layout)).unwrap();

        temp.child("state.json").assert(predicate::path::exists());
    }

    #[test]
    fn test_has_build_artifacts() {
        let temp = assert_fs::TempDir::new().unwrap();
        let layout = layout(temp.path());
        assert!(!has_build_artifacts(&layout, &modules(&layout)));

        temp.child("build/x").create_dir_all().unwrap();
        assert!(has_build_artifacts(&layout, &modules(&layout)));
    }

    #[test]
    fn test_prepare_prefix_forgets_state_when_prefix_missing() {
        let temp = assert_fs::TempDir::new().unwrap();
        let layout = layout(temp.path());
        let mut state = BuildState::new();
        state.set("inplace", Revision::new("abc"));

        assert!(prepare_prefix(&layout, &mut state).unwrap());

        assert!(state.is_empty());
        temp.child("install").assert(predicate::path::is_dir());
    }

    #[test]
    fn test_prepare_prefix_keeps_state_when_prefix_present() {
        let temp = assert_fs::TempDir::new().unwrap();
        let layout = layout(temp.path());
        temp.child("install").create_dir_all().unwrap();
        let mut state = BuildState::new();
        state.set("inplace", Revision::new("abc"));

        assert!(!prepare_prefix(&layout, &mut state).unwrap());

        assert_eq!(state.get("inplace"), Some(&Revision::new("abc")));
    }

    #[test]
    fn test_build_after_clean_sees_empty_state() {
        let temp = assert_fs::TempDir::new().unwrap();
        let layout = layout(temp.path());
        temp.child("install/lib/libfoo.so").write_str("elf").unwrap();
        let mut state = BuildState::new();
        state.set("inplace", Revision::new("abc"));
        assert!(!prepare_prefix(&layout, &mut state).unwrap());

        clean(&layout, &modules(&layout)).unwrap();

        assert!(prepare_prefix(&layout, &mut state).unwrap());
        assert!(state.get("inplace").is_none());
    }
}
