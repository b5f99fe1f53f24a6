//! Mod-list compatibility between a recording and a replay session.
//!
//! A mismatch does not stop playback; determinism is attempted anyway and
//! the differences are reported in both directions.

use std::fmt;

use cairn_core::{ModList, RESERVED_USER_MOD};
use indexmap::IndexSet;

/// One difference between the recorded and the active mod lists.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModMismatch {
    /// The recording used this mod but the session does not have it.
    RequiredButMissing(String),
    /// The session has this mod but the recording did not use it.
    PresentButUnused(String),
}

impl fmt::Display for ModMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RequiredButMissing(id) => write!(
                f,
                "the mod '{id}' is required by the replay file, but is not active"
            ),
            Self::PresentButUnused(id) => write!(
                f,
                "the mod '{id}' was not used when creating this replay file, but is active"
            ),
        }
    }
}

/// Compare the recorded mod list with the active one.
///
/// Missing mods are listed first in recorded order, then unused mods in
/// active order. Duplicates are reported once and the reserved `user` mod
/// is ignored.
///
/// # Examples
///
/// ```
/// use cairn_core::ModList;
/// use cairn_replay::{check_mod_compatibility, ModMismatch};
///
/// let recorded: ModList = ["public"].into_iter().collect();
/// let active: ModList = ["public", "mod-a"].into_iter().collect();
/// assert_eq!(
///     check_mod_compatibility(&recorded, &active),
///     vec![ModMismatch::PresentButUnused("mod-a".into())],
/// );
/// ```
pub fn check_mod_compatibility(recorded: &ModList, active: &ModList) -> Vec<ModMismatch> {
    let recorded: IndexSet<&str> = recorded.iter().filter(|m| *m != RESERVED_USER_MOD).collect();
    let active: IndexSet<&str> = active.iter().filter(|m| *m != RESERVED_USER_MOD).collect();

    let missing = recorded
        .iter()
        .filter(|m| !active.contains(*m))
        .map(|m| ModMismatch::RequiredButMissing((*m).to_string()));
    let unused = active
        .iter()
        .filter(|m| !recorded.contains(*m))
        .map(|m| ModMismatch::PresentButUnused((*m).to_string()));
    missing.chain(unused).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mods(ids: &[&str]) -> ModList {
        ids.iter().copied().collect()
    }

    #[test]
    fn identical_lists_are_compatible() {
        let m = mods(&["public", "mod-a"]);
        assert!(check_mod_compatibility(&m, &m).is_empty());
    }

    #[test]
    fn order_is_not_a_mismatch() {
        assert!(
            check_mod_compatibility(&mods(&["a", "b"]), &mods(&["b", "a"])).is_empty()
        );
    }

    #[test]
    fn both_directions_reported() {
        let got = check_mod_compatibility(&mods(&["public", "old"]), &mods(&["public", "new"]));
        assert_eq!(
            got,
            vec![
                ModMismatch::RequiredButMissing("old".into()),
                ModMismatch::PresentButUnused("new".into()),
            ]
        );
    }

    #[test]
    fn user_mod_ignored_both_ways() {
        assert!(check_mod_compatibility(&mods(&["public", "user"]), &mods(&["public"])).is_empty());
        assert!(check_mod_compatibility(&mods(&["public"]), &mods(&["user", "public"])).is_empty());
    }

    #[test]
    fn duplicates_reported_once() {
        let got = check_mod_compatibility(&mods(&["x", "x"]), &mods(&[]));
        assert_eq!(got, vec![ModMismatch::RequiredButMissing("x".into())]);
    }
}
