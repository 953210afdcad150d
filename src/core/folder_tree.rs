//! Folder tree reconciliation.
//!
//! Two steps:
//! - `assemble` merges the nested folder listing and the flat bookmark listing
//!   into one flat `Vec<Folder>` (the cached shape).
//! - `FolderTree::new` indexes those folders by resolved parent for rendering,
//!   applying the ignore-set.

use std::collections::{BTreeSet, HashMap};

use crate::domain::{
    FiledBookmark, Folder, FolderNode, ROOT_FOLDER_ID, UNFILED_FOLDER_ID, UNTITLED_FOLDER,
};

/// Flatten the nested folder listing and file each bookmark into its folder.
///
/// Folders come out in pre-order, followed by placeholders for folder ids that
/// bookmarks mention but the listing does not. Bookmarks keep arrival order.
pub fn assemble(nodes: &[FolderNode], bookmarks: Vec<FiledBookmark>) -> Vec<Folder> {
    let mut folders = Vec::new();
    for node in nodes {
        // The service marks top-level folders with the unfiled id
        let parent_id = match node.parent_id {
            Some(id) if id != UNFILED_FOLDER_ID => id,
            _ => ROOT_FOLDER_ID,
        };
        flatten_into(node, parent_id, &mut folders);
    }

    let mut positions: HashMap<i64, usize> = HashMap::new();
    let mut unique: Vec<Folder> = Vec::with_capacity(folders.len());
    for folder in folders {
        // First occurrence wins when the listing repeats an id
        if !positions.contains_key(&folder.id) {
            positions.insert(folder.id, unique.len());
            unique.push(folder);
        }
    }

    for filed in bookmarks {
        let index = match positions.get(&filed.folder_id) {
            Some(index) => *index,
            None => {
                positions.insert(filed.folder_id, unique.len());
                unique.push(Folder::placeholder(filed.folder_id));
                unique.len() - 1
            }
        };
        unique[index].bookmarks.push(filed.bookmark);
    }

    unique
}

fn flatten_into(node: &FolderNode, parent_id: i64, out: &mut Vec<Folder>) {
    let title = node.title.trim();
    let title = if title.is_empty() { UNTITLED_FOLDER } else { title };

    out.push(Folder::new(node.id, title, parent_id));
    for child in &node.children {
        flatten_into(child, node.id, out);
    }
}

/// Folders indexed by id and by resolved parent
#[derive(Debug, Clone)]
pub struct FolderTree {
    folders: HashMap<i64, Folder>,

    /// Resolved parent id -> child ids, sorted by title
    children: HashMap<i64, Vec<i64>>,

    ignored_parents: BTreeSet<i64>,
}

impl FolderTree {
    /// Build the index. Folders whose literal parent is in `ignored_parents`
    /// are placed at root level.
    pub fn new(folders: Vec<Folder>, ignored_parents: &BTreeSet<i64>) -> Self {
        let mut order: Vec<i64> = Vec::with_capacity(folders.len());
        let mut by_id: HashMap<i64, Folder> = HashMap::with_capacity(folders.len());

        for folder in folders {
            match by_id.get_mut(&folder.id) {
                Some(existing) => existing.bookmarks.extend(folder.bookmarks),
                None => {
                    order.push(folder.id);
                    by_id.insert(folder.id, folder);
                }
            }
        }

        let mut tree = Self {
            folders: by_id,
            children: HashMap::new(),
            ignored_parents: ignored_parents.clone(),
        };

        let mut children: HashMap<i64, Vec<i64>> = HashMap::new();
        for id in order {
            let parent = tree.parent_of(&tree.folders[&id]);
            children.entry(parent).or_default().push(id);
        }
        for siblings in children.values_mut() {
            // Stable: equal titles keep listing order
            siblings.sort_by(|a, b| tree.folders[a].title.cmp(&tree.folders[b].title));
        }
        tree.children = children;

        tree
    }

    /// The folder a given folder is placed under.
    ///
    /// Root when the literal parent is ignored, is the folder itself, is the
    /// unfiled bucket, or does not exist in the collection.
    pub fn parent_of(&self, folder: &Folder) -> i64 {
        let parent = folder.parent_id;
        if parent == folder.id
            || parent == UNFILED_FOLDER_ID
            || self.ignored_parents.contains(&parent)
            || !self.folders.contains_key(&parent)
        {
            ROOT_FOLDER_ID
        } else {
            parent
        }
    }

    /// Child folders placed under `parent_id`, in title order
    pub fn children(&self, parent_id: i64) -> impl Iterator<Item = &Folder> {
        self.children
            .get(&parent_id)
            .map(|ids| ids.as_slice())
            .unwrap_or(&[])
            .iter()
            .filter_map(move |id| self.folders.get(id))
    }

    /// Look up a folder by id
    pub fn get(&self, id: i64) -> Option<&Folder> {
        self.folders.get(&id)
    }

    /// All folder ids
    pub fn ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.folders.keys().copied()
    }

    /// Number of folders
    pub fn len(&self) -> usize {
        self.folders.len()
    }

    /// Check if the tree holds no folders
    pub fn is_empty(&self) -> bool {
        self.folders.is_empty()
    }

    /// Total number of bookmarks across all folders
    pub fn bookmark_count(&self) -> usize {
        self.folders.values().map(|f| f.bookmarks.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Bookmark, PLACEHOLDER_FOLDER};
    use chrono::{TimeZone, Utc};

    fn node(id: i64, title: &str, children: Vec<FolderNode>) -> FolderNode {
        FolderNode {
            id,
            title: title.to_string(),
            parent_id: None,
            children,
        }
    }

    fn filed(folder_id: i64, title: &str) -> FiledBookmark {
        FiledBookmark {
            folder_id,
            bookmark: Bookmark::new(
                title,
                format!("https://example.com/{}", title),
                Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap(),
            ),
        }
    }

    fn child_titles(tree: &FolderTree, parent: i64) -> Vec<String> {
        tree.children(parent).map(|f| f.title.clone()).collect()
    }

    #[test]
    fn test_assemble_flattens_pre_order() {
        let nodes = vec![
            node(1, "Tech", vec![node(2, "Rust", vec![node(3, "Async", vec![])])]),
            node(4, "Food", vec![]),
        ];

        let folders = assemble(&nodes, Vec::new());
        let ids: Vec<i64> = folders.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        let parents: Vec<i64> = folders.iter().map(|f| f.parent_id).collect();
        assert_eq!(parents, vec![ROOT_FOLDER_ID, 1, 2, ROOT_FOLDER_ID]);
    }

    #[test]
    fn test_assemble_blank_title_and_placeholders() {
        let nodes = vec![node(1, "   ", vec![])];
        let bookmarks = vec![filed(1, "a"), filed(99, "b"), filed(UNFILED_FOLDER_ID, "c"), filed(99, "d")];

        let folders = assemble(&nodes, bookmarks);
        assert_eq!(folders.len(), 3);
        assert_eq!(folders[0].title, UNTITLED_FOLDER);
        assert_eq!(folders[0].bookmarks.len(), 1);

        assert_eq!(folders[1].id, 99);
        assert_eq!(folders[1].title, PLACEHOLDER_FOLDER);
        let titles: Vec<&str> = folders[1].bookmarks.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "d"]);

        assert_eq!(folders[2].id, UNFILED_FOLDER_ID);
        assert_eq!(folders[2].parent_id, ROOT_FOLDER_ID);
    }

    #[test]
    fn test_top_level_parent_from_listing() {
        let mut top = node(5, "Top", vec![]);
        top.parent_id = Some(UNFILED_FOLDER_ID);
        let mut under = node(6, "Under", vec![]);
        under.parent_id = Some(12);

        let folders = assemble(&[top, under], Vec::new());
        assert_eq!(folders[0].parent_id, ROOT_FOLDER_ID);
        assert_eq!(folders[1].parent_id, 12);
    }

    #[test]
    fn test_unfiled_bucket_is_never_a_parent() {
        let mut reading = node(10, "Reading", vec![]);
        reading.parent_id = Some(UNFILED_FOLDER_ID);
        let mut tech = node(20, "Tech", vec![]);
        tech.parent_id = Some(UNFILED_FOLDER_ID);

        let folders = assemble(&[reading, tech], vec![filed(UNFILED_FOLDER_ID, "Root")]);
        let tree = FolderTree::new(folders, &BTreeSet::new());
        assert_eq!(
            child_titles(&tree, ROOT_FOLDER_ID),
            vec!["(empty)", "Reading", "Tech"]
        );
        assert_eq!(child_titles(&tree, UNFILED_FOLDER_ID), Vec::<String>::new());

        // Caches written before top-level parents were normalized
        let stale = vec![
            Folder::new(10, "Reading", UNFILED_FOLDER_ID),
            Folder::placeholder(UNFILED_FOLDER_ID),
        ];
        let tree = FolderTree::new(stale, &BTreeSet::new());
        assert_eq!(tree.parent_of(tree.get(10).unwrap()), ROOT_FOLDER_ID);
    }

    #[test]
    fn test_siblings_sorted_by_title_case_sensitive() {
        let folders = vec![
            Folder::new(1, "beta", ROOT_FOLDER_ID),
            Folder::new(2, "Alpha", ROOT_FOLDER_ID),
            Folder::new(3, "Beta", ROOT_FOLDER_ID),
            Folder::new(4, "alpha", ROOT_FOLDER_ID),
        ];

        let tree = FolderTree::new(folders, &BTreeSet::new());
        assert_eq!(child_titles(&tree, ROOT_FOLDER_ID), vec!["Alpha", "Beta", "alpha", "beta"]);
    }

    #[test]
    fn test_equal_titles_keep_listing_order() {
        let folders = vec![
            Folder::new(7, "Same", ROOT_FOLDER_ID),
            Folder::new(3, "Same", ROOT_FOLDER_ID),
        ];

        let tree = FolderTree::new(folders, &BTreeSet::new());
        let ids: Vec<i64> = tree.children(ROOT_FOLDER_ID).map(|f| f.id).collect();
        assert_eq!(ids, vec![7, 3]);
    }

    #[test]
    fn test_parent_resolution() {
        let folders = vec![
            Folder::new(1, "Real parent", ROOT_FOLDER_ID),
            Folder::new(2, "Child", 1),
            Folder::new(3, "Orphan", 404),
            Folder::new(4, "Self", 4),
            Folder::new(5, "Under ignored", 12),
            Folder::new(12, "Ignored", ROOT_FOLDER_ID),
        ];
        let ignored: BTreeSet<i64> = [12].into_iter().collect();

        let tree = FolderTree::new(folders, &ignored);
        assert_eq!(tree.parent_of(tree.get(2).unwrap()), 1);
        assert_eq!(tree.parent_of(tree.get(3).unwrap()), ROOT_FOLDER_ID);
        assert_eq!(tree.parent_of(tree.get(4).unwrap()), ROOT_FOLDER_ID);
        assert_eq!(tree.parent_of(tree.get(5).unwrap()), ROOT_FOLDER_ID);

        assert_eq!(
            child_titles(&tree, ROOT_FOLDER_ID),
            vec!["Ignored", "Orphan", "Real parent", "Self", "Under ignored"]
        );
        assert_eq!(child_titles(&tree, 12), Vec::<String>::new());
    }

    #[test]
    fn test_duplicate_ids_merge_bookmarks() {
        let bookmark = filed(1, "x").bookmark;
        let folders = vec![
            Folder::new(1, "First", ROOT_FOLDER_ID).with_bookmark(bookmark.clone()),
            Folder::new(1, "Second", ROOT_FOLDER_ID).with_bookmark(bookmark),
        ];

        let tree = FolderTree::new(folders, &BTreeSet::new());
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.get(1).unwrap().title, "First");
        assert_eq!(tree.bookmark_count(), 2);
    }
}
