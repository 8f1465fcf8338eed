//! Merging for collections that arrive pre-grouped (history by date).

/// An item that is itself a group of members under a key.
pub trait Grouped {
  type Member;

  fn group_key(&self) -> &str;

  fn members(&self) -> &[Self::Member];

  fn members_mut(&mut self) -> &mut Vec<Self::Member>;
}

/// Merge a freshly fetched page of groups into the existing groups.
///
/// A group whose key already exists gets its members appended to the
/// existing group; otherwise it is appended as a new group. The result holds
/// at most one group per key, members in arrival order. Matching is a linear
/// scan, fine for history-sized lists.
pub fn merge_by_group_key<G, K, F>(new_page: Vec<G>, existing: Vec<G>, group_key: F) -> Vec<G>
where
  G: Grouped,
  K: PartialEq,
  F: Fn(&G) -> K,
{
  let mut merged: Vec<G> = Vec::with_capacity(existing.len() + new_page.len());

  for mut group in existing.into_iter().chain(new_page) {
    let key = group_key(&group);
    match merged.iter().position(|g| group_key(g) == key) {
      Some(i) => merged[i].members_mut().append(group.members_mut()),
      None => merged.push(group),
    }
  }

  merged
}

/// `merge_by_group_key` keyed by `Grouped::group_key`, in merge-fn shape.
pub(crate) fn merge_grouped<G: Grouped>(existing: Vec<G>, new_page: Vec<G>) -> Vec<G> {
  merge_by_group_key(new_page, existing, |g| g.group_key().to_owned())
}

/// Drop members matching `predicate`, then drop groups left empty.
pub(crate) fn remove_members<G, P>(groups: &mut Vec<G>, predicate: P) -> usize
where
  G: Grouped,
  P: Fn(&G::Member) -> bool,
{
  let mut removed = 0;
  for group in groups.iter_mut() {
    let members = group.members_mut();
    let before = members.len();
    members.retain(|m| !predicate(m));
    removed += before - members.len();
  }
  groups.retain(|g| !g.members().is_empty());
  removed
}
