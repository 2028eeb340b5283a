/* tests/path_tests.rs */

use std::fs;
use std::path::Path;

use tempfile::tempdir;
use vitals::collect::path::{PathError, validate};

#[test]
fn accepts_descendant_of_root() {
	let root = tempdir().unwrap();
	let file = root.path().join("data.txt");
	fs::write(&file, "ok").unwrap();

	let resolved = validate(&file, root.path()).unwrap();
	assert!(resolved.ends_with("data.txt"));
}

#[test]
fn accepts_the_root_itself() {
	let root = tempdir().unwrap();
	assert!(validate(root.path(), root.path()).is_ok());
}

#[test]
fn joins_relative_candidates_onto_the_root() {
	let root = tempdir().unwrap();
	fs::create_dir(root.path().join("sub")).unwrap();
	fs::write(root.path().join("sub/inner.txt"), "ok").unwrap();

	let resolved = validate(Path::new("sub/inner.txt"), root.path()).unwrap();
	assert!(resolved.starts_with(root.path().canonicalize().unwrap()));
}

#[test]
fn rejects_parent_dir_traversal() {
	let root = tempdir().unwrap();
	let candidate = root.path().join("../../etc/passwd");

	match validate(&candidate, root.path()) {
		Err(PathError::Traversal { .. }) => {}
		other => panic!("expected Traversal, got {:?}", other),
	}
}

#[test]
fn rejects_relative_traversal_deterministically() {
	let root = tempdir().unwrap();
	// The target does not even need to exist for the rejection to hold.
	match validate(Path::new("../outside/whatever"), root.path()) {
		Err(PathError::Traversal { .. }) => {}
		other => panic!("expected Traversal, got {:?}", other),
	}
}

#[test]
fn rejects_absolute_path_outside_root() {
	let root = tempdir().unwrap();
	match validate(Path::new("/etc/passwd"), root.path()) {
		Err(PathError::Traversal { .. }) => {}
		other => panic!("expected Traversal, got {:?}", other),
	}
}

#[test]
fn missing_path_inside_root_is_not_found() {
	let root = tempdir().unwrap();
	match validate(Path::new("nope.txt"), root.path()) {
		Err(PathError::NotFound { .. }) => {}
		other => panic!("expected NotFound, got {:?}", other),
	}
}

#[cfg(unix)]
#[test]
fn rejects_symlink_escaping_the_root() {
	let root = tempdir().unwrap();
	let link = root.path().join("sneaky");
	std::os::unix::fs::symlink("/etc", &link).unwrap();

	match validate(&link.join("passwd"), root.path()) {
		Err(PathError::Traversal { .. }) => {}
		other => panic!("expected Traversal, got {:?}", other),
	}
}

#[test]
fn rejects_sensitive_subpaths_inside_root() {
	let root = tempdir().unwrap();
	fs::create_dir(root.path().join(".ssh")).unwrap();
	fs::write(root.path().join(".ssh/id_rsa"), "key").unwrap();

	match validate(Path::new(".ssh/id_rsa"), root.path()) {
		Err(PathError::Traversal { .. }) => {}
		other => panic!("expected Traversal, got {:?}", other),
	}
}
