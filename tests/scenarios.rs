//! End-to-end scenarios exercising the core across process-like
//! boundaries: init, stage, commit, branch, checkout, corruption, and lock
//! contention, driven directly against the library surface (`Repository`,
//! `IndexManager`, `ObjectStore`, `RefStore`, `CommitManager`, `branch`)
//! rather than through the CLI, so tests can run fully in parallel without
//! touching the process's current directory.

use std::fs;
use std::path::Path;

use rit::branch::{self, CheckoutContext, HeadState};
use rit::commit_mgr::CommitManager;
use rit::error::Error;
use rit::hash::Hash;
use rit::path::RepoPath;
use rit::transaction::CancellationToken;
use rit::Repository;

use tempfile::tempdir;

fn stage(repo: &Repository, name: &str, content: &[u8]) {
    fs::write(repo.root.join(name), content).unwrap();
    let index = repo.index().unwrap();
    let store = repo.store();
    index
        .add(
            &[(RepoPath::from_relative(Path::new(name)).unwrap(), repo.root.join(name))],
            &store,
        )
        .unwrap();
}

fn commit(repo: &Repository, message: &str) -> Hash {
    let store = repo.store();
    let refs = repo.refs();
    let index = repo.index().unwrap();
    let mgr = CommitManager::new(&store, &refs);
    mgr.create_commit(&index.entries(), message, &repo.config).unwrap().hash
}

/// Perform one checkout the way the CLI does: open fresh store/refs/index
/// handles for this call only, so no stale in-memory index outlives the
/// operation (matching `commands::checkout::run`, which opens the index
/// anew on every invocation).
fn checkout_branch(repo: &Repository, name: &str, force: bool) -> rit::error::Result<()> {
    let store = repo.store();
    let refs = repo.refs();
    let index = repo.index().unwrap();
    let ctx = CheckoutContext {
        repo_root: &repo.root,
        meta_dir: &repo.meta_dir,
        store: &store,
        refs: &refs,
        index: &index,
        worker_count: 1,
    };
    ctx.checkout_branch(name, force, &CancellationToken::new())
}

/// Same handle-per-call discipline as [`checkout_branch`], for the
/// `--orphan` path.
fn checkout_orphan(repo: &Repository, name: &str, force: bool) -> rit::error::Result<()> {
    let store = repo.store();
    let refs = repo.refs();
    let index = repo.index().unwrap();
    let ctx = CheckoutContext {
        repo_root: &repo.root,
        meta_dir: &repo.meta_dir,
        store: &store,
        refs: &refs,
        index: &index,
        worker_count: 1,
    };
    ctx.checkout_orphan(name, force, &CancellationToken::new())
}

/// S1 — init, add, commit; `log` (via `CommitManager::history`) finds one
/// commit whose tree has exactly one blob entry matching the staged file.
#[test]
fn s1_single_commit_round_trips_through_history_and_tree() {
    let temp = tempdir().unwrap();
    let repo = Repository::init(temp.path(), None, false).unwrap();
    stage(&repo, "a.txt", b"x\n");
    let hash = commit(&repo, "one");

    let store = repo.store();
    let refs = repo.refs();
    let mgr = CommitManager::new(&store, &refs);
    let history = mgr.history(None, 10).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].0, hash);
    assert_eq!(history[0].1.message, "one");

    let tree = store.read(&history[0].1.tree).unwrap().as_tree().unwrap().clone();
    assert_eq!(tree.entries.len(), 1);
    assert_eq!(tree.entries[0].name, "a.txt");
    assert_eq!(tree.entries[0].mode, rit::objects::FileMode::Regular);
    assert_eq!(tree.entries[0].hash, Hash::of(b"x\n"));
}

/// S2 — branch, commit on it, checkout back to the original branch: the
/// working file and index entry revert to the original content.
#[test]
fn s2_checkout_between_branches_restores_original_content() {
    let temp = tempdir().unwrap();
    let repo = Repository::init(temp.path(), None, false).unwrap();
    stage(&repo, "a.txt", b"x\n");
    commit(&repo, "one");

    let refs = repo.refs();
    let head = branch::current_commit(&refs).unwrap().unwrap();
    branch::create_branch(&refs, "feat", head).unwrap();

    checkout_branch(&repo, "feat", false).unwrap();

    stage(&repo, "a.txt", b"y\n");
    commit(&repo, "two");

    checkout_branch(&repo, "master", false).unwrap();

    assert_eq!(fs::read(repo.root.join("a.txt")).unwrap(), b"x\n");
    let index = repo.index().unwrap();
    let entry = index.get(&RepoPath::from_relative(Path::new("a.txt")).unwrap()).unwrap();
    assert_eq!(entry.hash, Hash::of(b"x\n"));
}

/// S3 — an unstaged local modification blocks checkout unless forced.
#[test]
fn s3_dirty_working_tree_blocks_checkout_unless_forced() {
    let temp = tempdir().unwrap();
    let repo = Repository::init(temp.path(), None, false).unwrap();
    stage(&repo, "a.txt", b"x\n");
    let first = commit(&repo, "one");

    let refs = repo.refs();
    branch::create_branch(&refs, "feat", first).unwrap();

    fs::write(repo.root.join("a.txt"), b"z\n").unwrap();

    let result = checkout_branch(&repo, "feat", false);
    assert!(matches!(result, Err(Error::Conflict { .. })));
    assert_eq!(fs::read(repo.root.join("a.txt")).unwrap(), b"z\n");

    checkout_branch(&repo, "feat", true).unwrap();
    assert_eq!(fs::read(repo.root.join("a.txt")).unwrap(), b"x\n");
}

/// S4 — three staged paths sort `dir/x, dir/y, z`; the root tree groups
/// the directory into one subtree entry sorting before the sibling file.
#[test]
fn s4_index_and_root_tree_sort_directories_before_trailing_files() {
    let temp = tempdir().unwrap();
    let repo = Repository::init(temp.path(), None, false).unwrap();
    fs::create_dir_all(repo.root.join("dir")).unwrap();
    stage(&repo, "dir/x", b"1");
    stage(&repo, "dir/y", b"2");
    stage(&repo, "z", b"3");

    let index = repo.index().unwrap();
    assert_eq!(index.count(), 3);
    let paths: Vec<String> = index.paths().iter().map(|p| p.as_str().to_string()).collect();
    assert_eq!(paths, vec!["dir/x", "dir/y", "z"]);

    let hash = commit(&repo, "init");
    let store = repo.store();
    let root_commit = store.read(&hash).unwrap().as_commit().unwrap().clone();
    let root = store.read(&root_commit.tree).unwrap().as_tree().unwrap().clone();

    assert_eq!(root.entries.len(), 2);
    assert_eq!(root.entries[0].name, "dir");
    assert!(root.entries[0].mode.is_directory());
    assert_eq!(root.entries[1].name, "z");
    assert_eq!(root.entries[1].mode, rit::objects::FileMode::Regular);
}

/// S5 — `checkout --orphan` leaves HEAD symbolic to a branch with no ref
/// file and an empty index; the first commit creates the branch ref with
/// no parent.
#[test]
fn s5_orphan_checkout_then_first_commit_has_no_parent() {
    let temp = tempdir().unwrap();
    let repo = Repository::init(temp.path(), None, false).unwrap();
    stage(&repo, "a.txt", b"x\n");
    commit(&repo, "one");

    checkout_orphan(&repo, "new", false).unwrap();

    let refs = repo.refs();
    assert_eq!(branch::head_state(&refs).unwrap(), HeadState::Unborn("new".to_string()));
    assert!(!refs.exists(&branch::branch_ref("new")));
    assert!(!repo.root.join("a.txt").exists());
    assert_eq!(repo.index().unwrap().count(), 0);

    stage(&repo, "b.txt", b"new-history\n");
    let hash = commit(&repo, "root of new history");

    assert!(refs.exists(&branch::branch_ref("new")));
    let store = repo.store();
    let new_commit = store.read(&hash).unwrap().as_commit().unwrap().clone();
    assert!(new_commit.parents.is_empty());
}

/// S6 — renaming the current branch rewrites HEAD and removes the old ref.
#[test]
fn s6_rename_current_branch_rewrites_head_and_drops_old_ref() {
    let temp = tempdir().unwrap();
    let repo = Repository::init(temp.path(), None, false).unwrap();
    stage(&repo, "a.txt", b"x\n");
    commit(&repo, "one");

    let refs = repo.refs();
    branch::rename_branch(&refs, "master", "new", false).unwrap();

    assert_eq!(branch::head_state(&refs).unwrap(), HeadState::Attached("new".to_string()));
    assert!(!refs.exists(&branch::branch_ref("master")));
    assert!(refs.exists(&branch::branch_ref("new")));
}

/// S7 — corrupting the last byte of a written object's file makes a
/// subsequent read fail with `Corrupt`, never a silently wrong object.
#[test]
fn s7_corrupted_object_file_fails_read_as_corrupt() {
    let temp = tempdir().unwrap();
    let repo = Repository::init(temp.path(), None, false).unwrap();
    stage(&repo, "a.txt", b"hello\n");
    let index = repo.index().unwrap();
    let hash = index
        .get(&RepoPath::from_relative(Path::new("a.txt")).unwrap())
        .unwrap()
        .hash;

    let store = repo.store();
    assert!(store.read(&hash).is_ok());

    let (prefix, rest) = hash.to_path_components();
    let object_path = repo.objects_dir().join(prefix).join(rest);
    let mut bytes = fs::read(&object_path).unwrap();
    *bytes.last_mut().unwrap() ^= 0xFF;
    fs::write(&object_path, bytes).unwrap();

    let result = store.read(&hash);
    assert!(matches!(result, Err(Error::Corrupt { .. })));
}

/// S8 — a manually created `index.lock` causes the transaction manager to
/// fail fast with `LockHeld` rather than proceeding.
#[test]
fn s8_preexisting_lock_file_is_reported_without_mutation() {
    let temp = tempdir().unwrap();
    let repo = Repository::init(temp.path(), None, false).unwrap();
    stage(&repo, "a.txt", b"x\n");
    let first = commit(&repo, "one");

    let refs = repo.refs();
    branch::create_branch(&refs, "feat", first).unwrap();

    fs::write(repo.meta_dir.join("index.lock"), b"").unwrap();

    stage(&repo, "a.txt", b"changed\n");
    commit(&repo, "two");

    let result = checkout_branch(&repo, "feat", true);
    assert!(matches!(result, Err(Error::LockHeld { .. })));
    // The working tree must be untouched by the failed attempt.
    assert_eq!(fs::read(repo.root.join("a.txt")).unwrap(), b"changed\n");
}

/// Property: hash stability — reading back any written object and
/// rehashing its payload yields the same hash (§8.1).
#[test]
fn property_hash_stability_across_object_kinds() {
    let temp = tempdir().unwrap();
    let repo = Repository::init(temp.path(), None, false).unwrap();
    stage(&repo, "a.txt", b"stable content\n");
    let hash = commit(&repo, "one");

    let store = repo.store();
    let commit_obj = store.read(&hash).unwrap();
    let payload = commit_obj.serialize_payload();
    assert_eq!(rit::objects::frame_hash(commit_obj.kind(), &payload), hash);

    let tree_hash = commit_obj.as_commit().unwrap().tree;
    let tree_obj = store.read(&tree_hash).unwrap();
    let tree_payload = tree_obj.serialize_payload();
    assert_eq!(rit::objects::frame_hash(tree_obj.kind(), &tree_payload), tree_hash);
}

/// Property: no-op idempotence — re-adding an unchanged file does not
/// change the index, and committing with nothing staged fails (§8.7).
#[test]
fn property_add_is_idempotent_and_empty_commit_is_rejected() {
    let temp = tempdir().unwrap();
    let repo = Repository::init(temp.path(), None, false).unwrap();
    stage(&repo, "a.txt", b"x\n");
    let before = repo.index().unwrap().entries();

    stage(&repo, "a.txt", b"x\n");
    let after = repo.index().unwrap().entries();
    assert_eq!(before.len(), after.len());
    assert_eq!(before[0].hash, after[0].hash);
    assert_eq!(before[0].path, after[0].path);

    commit(&repo, "one");

    let store = repo.store();
    let refs = repo.refs();
    let mgr = CommitManager::new(&store, &refs);
    let entries = repo.index().unwrap().entries();
    let result = mgr.create_commit(&entries, "again, nothing changed", &repo.config);
    assert!(matches!(result, Err(Error::InvalidArgument { .. })));
}
