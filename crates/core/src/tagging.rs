//! Tag association reconciliation.

use std::collections::HashSet;

use crate::error::CoreError;
use crate::types::DbId;

/// Maximum number of tags attached to one task or case.
pub const MAX_TAGS_PER_TARGET: usize = 50;

/// Maximum length of a tag name.
pub const MAX_TAG_NAME_LENGTH: usize = 100;

/// Rows to remove and insert to turn the current tag set into the desired one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    pub to_delete: Vec<DbId>,
    pub to_add: Vec<DbId>,
}

impl TagDiff {
    pub fn is_empty(&self) -> bool {
        self.to_delete.is_empty() && self.to_add.is_empty()
    }
}

/// Diff `existing` against `desired`, keeping input order and collapsing
/// duplicates in `desired`.
pub fn reconcile(existing: &[DbId], desired: &[DbId]) -> TagDiff {
    let existing_set: HashSet<DbId> = existing.iter().copied().collect();
    let desired_set: HashSet<DbId> = desired.iter().copied().collect();

    let to_delete = existing
        .iter()
        .copied()
        .filter(|id| !desired_set.contains(id))
        .collect();

    let mut seen = HashSet::new();
    let to_add = desired
        .iter()
        .copied()
        .filter(|id| !existing_set.contains(id) && seen.insert(*id))
        .collect();

    TagDiff { to_delete, to_add }
}

/// Deduplicate a requested tag set and enforce the per-target cap.
pub fn normalize_tag_ids(tag_ids: &[DbId]) -> Result<Vec<DbId>, CoreError> {
    let mut seen = HashSet::new();
    let ids: Vec<DbId> = tag_ids.iter().copied().filter(|id| seen.insert(*id)).collect();
    if ids.len() > MAX_TAGS_PER_TARGET {
        return Err(CoreError::Validation(format!(
            "At most {MAX_TAGS_PER_TARGET} tags can be attached"
        )));
    }
    Ok(ids)
}

pub fn normalize_tag_name(name: &str) -> Result<String, CoreError> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_TAG_NAME_LENGTH {
        return Err(CoreError::Validation(format!(
            "Tag name must be 1 to {MAX_TAG_NAME_LENGTH} characters"
        )));
    }
    Ok(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconcile_computes_both_sides() {
        let diff = reconcile(&[1, 2, 3], &[3, 4, 1, 5]);
        assert_eq!(diff.to_delete, vec![2]);
        assert_eq!(diff.to_add, vec![4, 5]);
    }

    #[test]
    fn same_set_is_noop() {
        assert!(reconcile(&[1, 2], &[2, 1]).is_empty());
    }

    #[test]
    fn empty_desired_removes_all() {
        let diff = reconcile(&[7, 8], &[]);
        assert_eq!(diff.to_delete, vec![7, 8]);
        assert!(diff.to_add.is_empty());
    }

    #[test]
    fn duplicates_collapse() {
        let diff = reconcile(&[], &[4, 4, 9, 4]);
        assert_eq!(diff.to_add, vec![4, 9]);
    }

    #[test]
    fn cap_applies_after_dedup() {
        let many: Vec<DbId> = (0..MAX_TAGS_PER_TARGET as DbId).chain([0, 1]).collect();
        assert_eq!(normalize_tag_ids(&many).unwrap().len(), MAX_TAGS_PER_TARGET);
        let too_many: Vec<DbId> = (0..=MAX_TAGS_PER_TARGET as DbId).collect();
        assert!(normalize_tag_ids(&too_many).is_err());
    }

    #[test]
    fn tag_name_trimmed() {
        assert_eq!(normalize_tag_name(" smoke ").unwrap(), "smoke");
        assert!(normalize_tag_name("").is_err());
    }
}
