//! Folder Outline Integration Tests
//!
//! Reconciliation of the folder listing and the recursive outline.

use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use outline_sync::core::{assemble, FolderTree, OutlineTemplates, RenderError, Template, TreeRenderer};
use outline_sync::domain::{Bookmark, FiledBookmark, Folder, FolderNode, ROOT_FOLDER_ID, UNFILED_FOLDER_ID};
use pretty_assertions::assert_eq;

fn bookmark(title: &str, url: &str) -> Bookmark {
    Bookmark::new(title, url, Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap())
}

fn node(id: i64, title: &str, children: Vec<FolderNode>) -> FolderNode {
    FolderNode {
        id,
        title: title.to_string(),
        parent_id: None,
        children,
    }
}

#[test]
fn test_reading_folder_example() {
    let folders = vec![Folder::new(10, "Reading", ROOT_FOLDER_ID).with_bookmark(bookmark("A", "http://www.example.com/a"))];
    let tree = FolderTree::new(folders, &BTreeSet::new());

    let out = TreeRenderer::default().render_subtree(&tree, 0, ROOT_FOLDER_ID).unwrap();
    assert_eq!(out, "- **Reading**\n\t- [A](http://www.example.com/a) (example.com)\n");
}

#[test]
fn test_top_level_folders_stay_beside_root_bookmarks() {
    let mut reading = node(10, "Reading", vec![]);
    reading.parent_id = Some(UNFILED_FOLDER_ID);
    let mut tech = node(20, "Tech", vec![]);
    tech.parent_id = Some(UNFILED_FOLDER_ID);
    let filed = vec![FiledBookmark {
        folder_id: UNFILED_FOLDER_ID,
        bookmark: bookmark("Root", "https://x.org"),
    }];

    let tree = FolderTree::new(assemble(&[reading, tech], filed), &BTreeSet::new());
    let out = TreeRenderer::default().render(&tree).unwrap();
    assert_eq!(
        out,
        "- **(empty)**\n\t- [Root](https://x.org) (x.org)\n- **Reading**\n- **Tech**\n"
    );
}

#[test]
fn test_every_folder_and_bookmark_rendered_once() {
    let nodes = vec![
        node(1, "Tech", vec![node(2, "Rust", vec![node(3, "Async", vec![])]), node(4, "Go", vec![])]),
        node(5, "Food", vec![node(6, "Baking", vec![])]),
    ];
    let mut filed = Vec::new();
    for (i, folder_id) in [1, 2, 3, 3, 4, 5, 6, 6, -1].into_iter().enumerate() {
        filed.push(FiledBookmark {
            folder_id,
            bookmark: bookmark(&format!("b{}", i), &format!("https://site{}.example.org/", i)),
        });
    }

    let tree = FolderTree::new(assemble(&nodes, filed), &BTreeSet::new());
    let out = TreeRenderer::default().render(&tree).unwrap();

    for title in ["Tech", "Rust", "Async", "Go", "Food", "Baking", "(empty)"] {
        let heading = format!("- **{}**", title);
        assert_eq!(out.matches(&heading).count(), 1, "heading {}", title);
    }
    for i in 0..9 {
        let link = format!("[b{}](https://site{}.example.org/)", i, i);
        assert_eq!(out.matches(&link).count(), 1, "bookmark {}", i);
    }
}

#[test]
fn test_nested_outline_shape() {
    let nodes = vec![
        node(1, "Tech", vec![node(3, "Rust", vec![]), node(2, "Go", vec![])]),
        node(4, "Food", vec![]),
    ];
    let filed = vec![
        FiledBookmark { folder_id: 1, bookmark: bookmark("HN", "https://news.ycombinator.com/") },
        FiledBookmark { folder_id: 3, bookmark: bookmark("Book", "https://doc.rust-lang.org/book/") },
    ];

    let tree = FolderTree::new(assemble(&nodes, filed), &BTreeSet::new());
    let out = TreeRenderer::default().render_document(&tree).unwrap();

    assert_eq!(
        out,
        "public:: true\n\
         - **Food**\n\
         - **Tech**\n\
         \t- **Go**\n\
         \t- **Rust**\n\
         \t\t- [Book](https://doc.rust-lang.org/book/) (doc.rust-lang.org)\n\
         \t- [HN](https://news.ycombinator.com/) (news.ycombinator.com)\n"
    );
}

#[test]
fn test_ignored_parent_renders_child_at_root() {
    let folders = vec![
        Folder::new(12, "Bookmarks bar", ROOT_FOLDER_ID),
        Folder::new(20, "News", 12).with_bookmark(bookmark("NOS", "https://nos.nl/")),
    ];
    let ignored = BTreeSet::from([12]);

    let tree = FolderTree::new(folders, &ignored);
    let out = TreeRenderer::default().render(&tree).unwrap();
    assert_eq!(out, "- **Bookmarks bar**\n- **News**\n\t- [NOS](https://nos.nl/) (nos.nl)\n");
}

#[test]
fn test_sibling_titles_strictly_ascending() {
    let folders: Vec<Folder> = ["delta", "Alpha", "charlie", "Bravo"]
        .iter()
        .enumerate()
        .map(|(i, title)| Folder::new(i as i64 + 1, *title, ROOT_FOLDER_ID))
        .collect();

    let tree = FolderTree::new(folders, &BTreeSet::new());
    let titles: Vec<&str> = tree.children(ROOT_FOLDER_ID).map(|f| f.title.as_str()).collect();
    assert_eq!(titles, vec!["Alpha", "Bravo", "charlie", "delta"]);
}

#[test]
fn test_parent_cycle_fails_instead_of_dropping() {
    let folders = vec![Folder::new(1, "A", 2), Folder::new(2, "B", 1)];
    let tree = FolderTree::new(folders, &BTreeSet::new());

    let err = TreeRenderer::default().render(&tree).unwrap_err();
    assert_eq!(err, RenderError::Unreachable { folder_ids: vec![1, 2] });
}

#[test]
fn test_bookmark_template_placeholders() {
    let templates = OutlineTemplates {
        folder: Template::new("- {title}"),
        bookmark: Template::new("- {title} on {host}, {added} ({unknown})"),
        ..Default::default()
    };
    let renderer = TreeRenderer::new(templates, Default::default());
    let folders = vec![Folder::new(1, "F", ROOT_FOLDER_ID).with_bookmark(bookmark("T", "https://www.rust-lang.org"))];

    let out = renderer.render(&FolderTree::new(folders, &BTreeSet::new())).unwrap();
    assert_eq!(out, "- F\n\t- T on rust-lang.org, Tuesday 2 January 2024 ({unknown})\n");
}
