use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::ops::Range;

use chrono::{DateTime, Utc};
use lakepath_partition::path::{normalize_path, split_path};
use log::debug;
use object_store::ObjectMeta;

use crate::error::{DatasetError, DatasetResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    File,
    Directory,
}

/// One record of a file listing.
#[derive(Debug, Clone, PartialEq)]
pub struct FileStats {
    pub path: String,
    pub kind: FileKind,
    pub size: Option<u64>,
    pub last_modified: Option<DateTime<Utc>>,
}

impl FileStats {
    pub fn file(path: impl Into<String>, size: u64) -> Self {
        Self {
            path: path.into(),
            kind: FileKind::File,
            size: Some(size),
            last_modified: None,
        }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: FileKind::Directory,
            size: None,
            last_modified: None,
        }
    }

    pub fn is_file(&self) -> bool {
        self.kind == FileKind::File
    }

    pub fn is_directory(&self) -> bool {
        self.kind == FileKind::Directory
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        split_path(&self.path)
    }

    /// The last segment of the path.
    pub fn name(&self) -> &str {
        self.segments().last().unwrap_or_default()
    }

    pub fn depth(&self) -> usize {
        self.segments().count()
    }
}

impl From<ObjectMeta> for FileStats {
    fn from(meta: ObjectMeta) -> Self {
        Self {
            path: meta.location.to_string(),
            kind: FileKind::File,
            size: Some(meta.size as u64),
            last_modified: Some(meta.last_modified),
        }
    }
}

/// Adds a directory record for every ancestor of the listed paths
/// that is not listed itself. Object stores only list files.
pub fn add_implied_directories(mut stats: Vec<FileStats>) -> Vec<FileStats> {
    let listed = stats
        .iter()
        .map(|s| normalize_path(&s.path))
        .collect::<BTreeSet<_>>();
    let mut implied = BTreeSet::new();
    for s in stats.iter() {
        let segments = s.segments().collect::<Vec<_>>();
        for depth in 1..segments.len() {
            let prefix = segments[..depth].join("/");
            if !listed.contains(&prefix) {
                implied.insert(prefix);
            }
        }
    }
    stats.extend(implied.into_iter().map(FileStats::directory));
    stats
}

/// Whether `ancestor` is a proper segment-wise prefix of `path`.
fn is_ancestor(ancestor: &FileStats, path: &FileStats) -> bool {
    let mut segments = path.segments();
    for expected in ancestor.segments() {
        if segments.next() != Some(expected) {
            return false;
        }
    }
    segments.next().is_some()
}

fn compare_segments(a: &FileStats, b: &FileStats) -> Ordering {
    a.segments().cmp(b.segments())
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct NodeInfo {
    parent: Option<usize>,
    descendants: usize,
}

/// A tree view of a flat listing of files and directories.
///
/// Nodes are stored in pre-order, so the descendants of a node are
/// the contiguous range of nodes following it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathForest {
    stats: Vec<FileStats>,
    nodes: Vec<NodeInfo>,
}

/// What to do after visiting a node in [`PathForest::walk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitAction {
    Continue,
    /// Skip the descendants of the node.
    Prune,
}

impl PathForest {
    pub fn make(stats: Vec<FileStats>) -> DatasetResult<Self> {
        let associated = vec![(); stats.len()];
        let (forest, _) = Self::make_with_associated(stats, associated)?;
        Ok(forest)
    }

    /// Builds a forest and reorders `associated` so that it stays index-aligned
    /// with the nodes of the forest.
    pub fn make_with_associated<T>(
        stats: Vec<FileStats>,
        associated: Vec<T>,
    ) -> DatasetResult<(Self, Vec<T>)> {
        if stats.len() != associated.len() {
            return Err(DatasetError::invalid(format!(
                "{} associated item(s) given for {} listed path(s)",
                associated.len(),
                stats.len()
            )));
        }
        let mut pairs = stats
            .into_iter()
            .map(|s| {
                let path = normalize_path(&s.path);
                if path.is_empty() {
                    return Err(DatasetError::invalid(format!(
                        "listed path '{}' has no segments",
                        s.path
                    )));
                }
                Ok(FileStats { path, ..s })
            })
            .zip(associated)
            .map(|(s, a)| s.map(|s| (s, a)))
            .collect::<DatasetResult<Vec<_>>>()?;
        pairs.sort_by(|(a, _), (b, _)| compare_segments(a, b));
        if let Some(pair) = pairs.windows(2).find(|w| w[0].0.path == w[1].0.path) {
            return Err(DatasetError::invalid(format!(
                "path '{}' is listed more than once",
                pair[0].0.path
            )));
        }
        let (stats, associated): (Vec<_>, Vec<_>) = pairs.into_iter().unzip();

        let mut nodes = vec![
            NodeInfo {
                parent: None,
                descendants: 0,
            };
            stats.len()
        ];
        let mut stack: Vec<usize> = vec![];
        for (i, node) in nodes.iter_mut().enumerate() {
            while let Some(&top) = stack.last() {
                if is_ancestor(&stats[top], &stats[i]) {
                    break;
                }
                stack.pop();
            }
            node.parent = stack.last().copied();
            stack.push(i);
        }
        for i in (0..nodes.len()).rev() {
            if let Some(parent) = nodes[i].parent {
                nodes[parent].descendants += 1 + nodes[i].descendants;
            }
        }
        debug!("built path forest with {} node(s)", stats.len());
        Ok((Self { stats, nodes }, associated))
    }

    pub fn len(&self) -> usize {
        self.stats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stats.is_empty()
    }

    pub fn stats(&self) -> &[FileStats] {
        &self.stats
    }

    pub fn node(&self, index: usize) -> Option<NodeRef<'_>> {
        (index < self.len()).then_some(NodeRef {
            forest: self,
            index,
        })
    }

    /// All nodes in pre-order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeRef<'_>> {
        (0..self.len()).map(|index| NodeRef {
            forest: self,
            index,
        })
    }

    pub fn roots(&self) -> impl Iterator<Item = NodeRef<'_>> {
        self.nodes().filter(|n| n.parent().is_none())
    }

    /// Visits the nodes in pre-order. Returning [`VisitAction::Prune`]
    /// skips the descendants of the visited node.
    pub fn walk<F>(&self, mut visitor: F) -> DatasetResult<()>
    where
        F: FnMut(NodeRef<'_>) -> DatasetResult<VisitAction>,
    {
        let mut index = 0;
        while index < self.len() {
            let node = NodeRef {
                forest: self,
                index,
            };
            index += match visitor(node)? {
                VisitAction::Continue => 1,
                VisitAction::Prune => 1 + node.num_descendants(),
            };
        }
        Ok(())
    }
}

impl Display for PathForest {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for node in self.nodes() {
            let indent = "  ".repeat(node.ancestors().count());
            let suffix = if node.stats().is_directory() { "/" } else { "" };
            writeln!(f, "{indent}{}{suffix}", node.stats().path)?;
        }
        Ok(())
    }
}

/// A node of a [`PathForest`] addressed by its index.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    forest: &'a PathForest,
    index: usize,
}

impl<'a> NodeRef<'a> {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn stats(&self) -> &'a FileStats {
        &self.forest.stats[self.index]
    }

    /// The number of segments of the path.
    pub fn depth(&self) -> usize {
        self.stats().depth()
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.forest.nodes[self.index].parent.map(|index| NodeRef {
            forest: self.forest,
            index,
        })
    }

    /// The ancestors of the node, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = NodeRef<'a>> {
        std::iter::successors(self.parent(), |n| n.parent())
    }

    pub fn num_descendants(&self) -> usize {
        self.forest.nodes[self.index].descendants
    }

    /// The indices of all descendants.
    pub fn descendants(&self) -> Range<usize> {
        self.index + 1..self.index + 1 + self.num_descendants()
    }

    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> {
        let forest = self.forest;
        let end = self.descendants().end;
        let mut next = self.index + 1;
        std::iter::from_fn(move || {
            if next >= end {
                return None;
            }
            let child = NodeRef {
                forest,
                index: next,
            };
            next += 1 + child.num_descendants();
            Some(child)
        })
    }
}
