// src/vault/tree.rs
// Pure in-memory tree structure: folders of folders and named text
// artifacts. All operations here are synchronous and side-effect free;
// the async facade with events and persistence lives in store.rs.

use crate::vault::VaultPath;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single named text item stored in the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artifact {
    pub content: String,
    #[serde(rename = "lastModified")]
    pub last_modified: DateTime<Utc>,
}

impl Artifact {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            last_modified: Utc::now(),
        }
    }
}

/// A folder holds child folders and artifacts in separate maps. BTreeMap
/// keys give per-folder name uniqueness and a deterministic traversal
/// order (lexicographic), which `find_by_name` relies on.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    #[serde(default)]
    pub folders: BTreeMap<String, Folder>,
    #[serde(default)]
    pub files: BTreeMap<String, Artifact>,
}

/// Tagged view over a tree entry, used by traversals instead of shape
/// checks on untyped maps.
#[derive(Debug, Clone, Copy)]
pub enum Node<'a> {
    Folder(&'a str, &'a Folder),
    Artifact(&'a str, &'a Artifact),
}

impl Folder {
    /// Resolve a folder by path. Never creates anything.
    pub fn folder(&self, path: &VaultPath) -> Option<&Folder> {
        let mut current = self;
        for segment in path.segments() {
            current = current.folders.get(segment)?;
        }
        Some(current)
    }

    /// Resolve a folder by path, creating missing intermediate folders.
    /// Only write operations go through here; reads never create.
    pub fn folder_mut_create(&mut self, path: &VaultPath) -> &mut Folder {
        let mut current = self;
        for segment in path.segments() {
            current = current.folders.entry(segment.clone()).or_default();
        }
        current
    }

    pub fn get(&self, path: &VaultPath, name: &str) -> Option<&Artifact> {
        self.folder(path)?.files.get(name)
    }

    pub fn exists(&self, path: &VaultPath, name: &str) -> bool {
        self.get(path, name).is_some()
    }

    /// Write an artifact, stamping it with the current time. Overwrites
    /// silently; duplicate handling is the caller's job.
    pub fn put(&mut self, path: &VaultPath, name: &str, content: impl Into<String>) {
        self.insert(path, name, Artifact::new(content));
    }

    /// Write a pre-built artifact (import and move paths, where the
    /// original timestamp is preserved).
    pub fn insert(&mut self, path: &VaultPath, name: &str, artifact: Artifact) {
        self.folder_mut_create(path)
            .files
            .insert(name.to_string(), artifact);
    }

    /// Remove an artifact. Returns false if it was not there; the store
    /// layer turns that into a reportable NotFound.
    pub fn delete(&mut self, path: &VaultPath, name: &str) -> bool {
        match self.folder_mut(path) {
            Some(folder) => folder.files.remove(name).is_some(),
            None => false,
        }
    }

    fn folder_mut(&mut self, path: &VaultPath) -> Option<&mut Folder> {
        let mut current = self;
        for segment in path.segments() {
            current = current.folders.get_mut(segment)?;
        }
        Some(current)
    }

    /// Idempotent folder creation, including intermediates.
    pub fn ensure_folder(&mut self, path: &VaultPath) {
        self.folder_mut_create(path);
    }

    /// Total number of artifacts reachable from this folder.
    pub fn count_artifacts(&self) -> usize {
        self.files.len()
            + self
                .folders
                .values()
                .map(Folder::count_artifacts)
                .sum::<usize>()
    }

    /// Total number of folders reachable from this folder, excluding the
    /// folder itself (so on the root, the root is not counted).
    pub fn count_folders(&self) -> usize {
        self.folders.len()
            + self
                .folders
                .values()
                .map(Folder::count_folders)
                .sum::<usize>()
    }

    pub fn clear(&mut self) {
        self.folders.clear();
        self.files.clear();
    }

    /// Pre-order enumeration of every folder path, root first. Recomputed
    /// on each call; there is no cursor to invalidate.
    pub fn folder_paths(&self) -> Vec<VaultPath> {
        let mut out = vec![VaultPath::root()];
        self.collect_folder_paths(&VaultPath::root(), &mut out);
        out
    }

    fn collect_folder_paths(&self, prefix: &VaultPath, out: &mut Vec<VaultPath>) {
        for (name, folder) in &self.folders {
            let path = prefix.child(name.clone());
            out.push(path.clone());
            folder.collect_folder_paths(&path, out);
        }
    }

    /// First artifact with the given name, searching this folder's files
    /// before descending into subfolders, both in lexicographic order.
    ///
    /// Duplicate filenames in different folders are inherently ambiguous;
    /// this traversal order is the documented tie-break, nothing more.
    pub fn find_by_name(&self, name: &str) -> Option<(VaultPath, &Artifact)> {
        self.find_by_name_from(&VaultPath::root(), name)
    }

    fn find_by_name_from<'a>(
        &'a self,
        prefix: &VaultPath,
        name: &str,
    ) -> Option<(VaultPath, &'a Artifact)> {
        if let Some(artifact) = self.files.get(name) {
            return Some((prefix.clone(), artifact));
        }
        for (child_name, folder) in &self.folders {
            let path = prefix.child(child_name.clone());
            if let Some(found) = folder.find_by_name_from(&path, name) {
                return Some(found);
            }
        }
        None
    }

    /// Recursive union with an imported tree. Where both sides define the
    /// same (path, name) the imported artifact wins; everything present on
    /// only one side is carried over unchanged.
    pub fn merge_from(&mut self, other: Folder) {
        for (name, artifact) in other.files {
            self.files.insert(name, artifact);
        }
        for (name, folder) in other.folders {
            self.folders.entry(name).or_default().merge_from(folder);
        }
    }

    /// Depth-first visit of every entry under this folder. Artifacts of a
    /// folder are visited before its subfolders, matching `find_by_name`.
    pub fn visit<'a>(&'a self, f: &mut impl FnMut(&VaultPath, Node<'a>)) {
        self.visit_from(&VaultPath::root(), f);
    }

    fn visit_from<'a>(&'a self, prefix: &VaultPath, f: &mut impl FnMut(&VaultPath, Node<'a>)) {
        for (name, artifact) in &self.files {
            f(prefix, Node::Artifact(name, artifact));
        }
        for (name, folder) in &self.folders {
            f(prefix, Node::Folder(name, folder));
            folder.visit_from(&prefix.child(name.clone()), f);
        }
    }

    /// Every artifact as (containing path, name, artifact), in visit order.
    pub fn artifacts(&self) -> Vec<(VaultPath, String, &Artifact)> {
        let mut out = Vec::new();
        self.visit(&mut |path, node| {
            if let Node::Artifact(name, artifact) = node {
                out.push((path.clone(), name.to_string(), artifact));
            }
        });
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(raw: &str) -> VaultPath {
        VaultPath::parse(raw).unwrap()
    }

    #[test]
    fn put_then_get_at_root() {
        let mut tree = Folder::default();
        tree.put(&VaultPath::root(), "a.txt", "hello");
        assert_eq!(tree.get(&VaultPath::root(), "a.txt").unwrap().content, "hello");
        assert_eq!(tree.count_artifacts(), 1);
        assert_eq!(tree.count_folders(), 0);
    }

    #[test]
    fn put_creates_intermediate_folders() {
        let mut tree = Folder::default();
        tree.put(&path("/src/lib"), "x.js", "v1");
        assert_eq!(tree.count_folders(), 2);
        assert_eq!(tree.get(&path("/src/lib"), "x.js").unwrap().content, "v1");
    }

    #[test]
    fn put_overwrites_in_place() {
        let mut tree = Folder::default();
        tree.put(&VaultPath::root(), "a.txt", "one");
        tree.put(&VaultPath::root(), "a.txt", "two");
        assert_eq!(tree.count_artifacts(), 1);
        assert_eq!(tree.get(&VaultPath::root(), "a.txt").unwrap().content, "two");
    }

    #[test]
    fn reads_never_create_folders() {
        let tree = Folder::default();
        assert!(tree.get(&path("/nope/deep"), "a.txt").is_none());
        assert_eq!(tree.count_folders(), 0);
    }

    #[test]
    fn delete_reports_absence() {
        let mut tree = Folder::default();
        tree.put(&VaultPath::root(), "a.txt", "x");
        assert!(tree.delete(&VaultPath::root(), "a.txt"));
        assert!(!tree.delete(&VaultPath::root(), "a.txt"));
    }

    #[test]
    fn ensure_folder_is_idempotent() {
        let mut tree = Folder::default();
        tree.ensure_folder(&path("/a/b"));
        let once = tree.clone();
        tree.ensure_folder(&path("/a/b"));
        assert_eq!(tree, once);
        assert_eq!(tree.count_folders(), 2);
    }

    #[test]
    fn folder_paths_are_preorder_with_root_first() {
        let mut tree = Folder::default();
        tree.ensure_folder(&path("/src/lib"));
        tree.ensure_folder(&path("/docs"));
        let paths: Vec<String> = tree.folder_paths().iter().map(|p| p.to_string()).collect();
        assert_eq!(paths, ["/", "/docs", "/src", "/src/lib"]);
    }

    #[test]
    fn find_by_name_prefers_shallower_then_lexicographic() {
        let mut tree = Folder::default();
        tree.put(&path("/zz"), "dup.txt", "in zz");
        tree.put(&path("/aa"), "dup.txt", "in aa");
        let (found_path, artifact) = tree.find_by_name("dup.txt").unwrap();
        assert_eq!(found_path, path("/aa"));
        assert_eq!(artifact.content, "in aa");

        tree.put(&VaultPath::root(), "dup.txt", "at root");
        let (found_path, artifact) = tree.find_by_name("dup.txt").unwrap();
        assert!(found_path.is_root());
        assert_eq!(artifact.content, "at root");
    }

    #[test]
    fn merge_is_monotonic_and_imported_side_wins() {
        let mut a = Folder::default();
        a.put(&VaultPath::root(), "both.txt", "a-version");
        a.put(&path("/only-a"), "a.txt", "a");

        let mut b = Folder::default();
        b.put(&VaultPath::root(), "both.txt", "b-version");
        b.put(&path("/only-b"), "b.txt", "b");

        a.merge_from(b);
        assert_eq!(a.get(&VaultPath::root(), "both.txt").unwrap().content, "b-version");
        assert_eq!(a.get(&path("/only-a"), "a.txt").unwrap().content, "a");
        assert_eq!(a.get(&path("/only-b"), "b.txt").unwrap().content, "b");
    }

    #[test]
    fn artifacts_lists_every_leaf_once() {
        let mut tree = Folder::default();
        tree.put(&VaultPath::root(), "root.txt", "r");
        tree.put(&path("/src"), "main.rs", "m");
        tree.put(&path("/src/lib"), "x.js", "v1");
        let listed: Vec<String> = tree
            .artifacts()
            .iter()
            .map(|(p, n, _)| p.join(n))
            .collect();
        assert_eq!(listed, ["/root.txt", "/src/main.rs", "/src/lib/x.js"]);
    }
}
