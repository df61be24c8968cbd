//! Derives the branch to filter workflow runs by from a git reference.

use regex::Regex;
use tracing::debug;

use crate::static_lazy_lock;

static_lazy_lock! {
    HEAD_REF: Regex = Regex::new(r"/?refs/heads/(.+)").expect("valid branch ref pattern");
}

static_lazy_lock! {
    TAG_REF: Regex = Regex::new(r"/?refs/tags/").expect("valid tag ref pattern");
}

/// Returns whether `git_ref` points at a tag.
pub fn is_tag_ref(git_ref: &str) -> bool {
    TAG_REF.is_match(git_ref)
}

/// Returns the branch name of a git reference, or [`None`] for tags, which runs cannot be filtered by.
///
/// `refs/heads/main` and `/refs/heads/main` yield `main`. Anything else, like a plain `main` or a malformed
/// `refs/heads/`, is passed through unchanged.
pub fn branch_name_from_ref(git_ref: &str) -> Option<&str> {
    if is_tag_ref(git_ref) {
        debug!("unable to filter runs by branch, unsupported ref: {git_ref}");
        return None;
    }

    Some(
        HEAD_REF
            .captures(git_ref)
            .and_then(|captures| captures.get(1))
            .map_or(git_ref, |branch| branch.as_str()),
    )
}
