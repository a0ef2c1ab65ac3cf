use std::collections::HashSet;

use super::interaction::UserId;

/// Users allowed to run owner-only commands.
///
/// Built once from configuration and shared by `Arc`; never mutated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnerSet {
    ids: HashSet<UserId>,
}

impl OwnerSet {
    pub fn new(ids: impl IntoIterator<Item = UserId>) -> Self {
        Self {
            ids: ids.into_iter().collect(),
        }
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.ids.contains(&user_id)
    }
}

impl FromIterator<UserId> for OwnerSet {
    fn from_iter<I: IntoIterator<Item = UserId>>(iter: I) -> Self {
        Self::new(iter)
    }
}
