/* src/collect/path.rs */

//!
//! Path validation against an allowed root.

use std::path::{Component, Path, PathBuf};

/// Rejection reasons for a candidate path.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PathError {
	/// The canonical path is not the allowed root or a descendant of it.
	#[error("path escapes allowed root: {path:?}")]
	Traversal { path: PathBuf },
	/// The path (or the root itself) does not exist.
	#[error("path not found: {path:?}")]
	NotFound { path: PathBuf },
}

/// Subpaths that are never readable, even inside the allowed root.
const SENSITIVE_COMPONENTS: &[&str] = &[".ssh", ".gnupg", ".aws", "secrets"];

/// Verifies that `candidate` resolves inside `allowed_root`.
///
/// Relative candidates are joined onto the root. The candidate is
/// canonicalized (symlinks and `..` resolved) and must be the root or a
/// descendant of it; anything else is [`PathError::Traversal`]. The check
/// is deterministic on adversarial input and performs no reads.
pub fn validate(candidate: &Path, allowed_root: &Path) -> Result<PathBuf, PathError> {
	let full = if candidate.is_absolute() {
		candidate.to_path_buf()
	} else {
		allowed_root.join(candidate)
	};

	// Reject `..` before touching the filesystem so nonexistent traversal
	// attempts fail the same way existing ones do.
	if full.components().any(|c| matches!(c, Component::ParentDir)) {
		return Err(PathError::Traversal { path: full });
	}

	let canonical_root = allowed_root
		.canonicalize()
		.map_err(|_| PathError::NotFound {
			path: allowed_root.to_path_buf(),
		})?;

	let canonical = full.canonicalize().map_err(|_| PathError::NotFound {
		path: full.clone(),
	})?;

	if !canonical.starts_with(&canonical_root) {
		return Err(PathError::Traversal { path: full });
	}

	let sensitive = canonical.components().any(|c| {
		c.as_os_str()
			.to_str()
			.is_some_and(|s| SENSITIVE_COMPONENTS.contains(&s))
	});
	if sensitive {
		return Err(PathError::Traversal { path: full });
	}

	Ok(canonical)
}

/// Makes a path presentable for diagnostics, relative to the root where
/// possible.
pub fn display_for_log(path: &Path, allowed_root: &Path) -> String {
	match path.strip_prefix(allowed_root) {
		Ok(rel) => format!("{}", rel.display()),
		Err(_) => format!("{}", path.display()),
	}
}
