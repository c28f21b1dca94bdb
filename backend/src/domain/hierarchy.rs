//! Reporting-line resolution over the staff directory.
//!
//! Staff records point upward through `senior_id`. Those pointers are user
//! data and may dangle, point at the user itself, or form cycles, so every
//! walk here carries a visited set and terminates on arbitrary input.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::Serialize;
use tracing::warn;

use super::user::{StaffUser, UserId};

/// Outcome of following a user's `senior_id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeniorRef<'a> {
    /// The user reports to nobody.
    Root,
    /// The senior exists in the supplied set.
    Resolved(&'a StaffUser),
    /// The senior id matches no user in the supplied set.
    Unresolved(&'a UserId),
}

/// Defect found while auditing reporting lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum HierarchyIssue {
    /// `senior_id` names a user that does not exist.
    #[serde(rename_all = "camelCase")]
    DanglingSenior { user_id: UserId, senior_id: UserId },
    /// `senior_id` names the user itself.
    #[serde(rename_all = "camelCase")]
    SelfReference { user_id: UserId },
    /// Following `senior_id` from this user leads back to it.
    #[serde(rename_all = "camelCase")]
    Cycle { user_id: UserId },
}

/// Look up the senior of `user` among `users`.
pub fn resolve_senior<'a>(user: &'a StaffUser, users: &'a [StaffUser]) -> SeniorRef<'a> {
    match &user.senior_id {
        None => SeniorRef::Root,
        Some(senior_id) => users
            .iter()
            .find(|candidate| &candidate.id == senior_id)
            .map_or(SeniorRef::Unresolved(senior_id), SeniorRef::Resolved),
    }
}

fn children_index(users: &[StaffUser]) -> HashMap<&UserId, Vec<usize>> {
    let mut children: HashMap<&UserId, Vec<usize>> = HashMap::new();
    for (index, user) in users.iter().enumerate() {
        if let Some(senior) = &user.senior_id {
            children.entry(senior).or_default().push(index);
        }
    }
    children
}

/// All transitive subordinates of `user_id`, excluding the user itself.
///
/// Results are in breadth-first order, each user at most once. Cycles and
/// self-references are cut at the first revisit.
///
/// # Examples
/// ```
/// use leads_backend::domain::{hierarchy::resolve_subordinates, StaffUser, UserId};
///
/// let id = |raw: &str| UserId::new(raw).expect("valid id");
/// let users = vec![
///     StaffUser::new(id("m"), "Manager", None),
///     StaffUser::new(id("t"), "Lead", None).with_senior(id("m")),
///     StaffUser::new(id("e"), "Exec", None).with_senior(id("t")),
/// ];
/// let names: Vec<_> = resolve_subordinates(&id("m"), &users)
///     .into_iter()
///     .map(|user| user.name.as_str())
///     .collect();
/// assert_eq!(names, ["Lead", "Exec"]);
/// ```
pub fn resolve_subordinates<'a>(user_id: &UserId, users: &'a [StaffUser]) -> Vec<&'a StaffUser> {
    let children = children_index(users);
    let mut visited: HashSet<&UserId> = HashSet::from([user_id]);
    let mut queue: VecDeque<&UserId> = VecDeque::from([user_id]);
    let mut found = Vec::new();

    while let Some(current) = queue.pop_front() {
        let Some(direct) = children.get(current) else {
            continue;
        };
        for user in direct.iter().filter_map(|&index| users.get(index)) {
            if visited.insert(&user.id) {
                found.push(user);
                queue.push_back(&user.id);
            }
        }
    }
    found
}

/// Ids of every subordinate of `user_id`.
pub fn subordinate_ids(user_id: &UserId, users: &[StaffUser]) -> Vec<UserId> {
    resolve_subordinates(user_id, users)
        .into_iter()
        .map(|user| user.id.clone())
        .collect()
}

/// Report every malformed reporting line in `users`.
///
/// Issues are also logged at `warn` so operators notice broken data without
/// any request failing.
pub fn audit(users: &[StaffUser]) -> Vec<HierarchyIssue> {
    let by_id: HashMap<&UserId, &StaffUser> = users.iter().map(|user| (&user.id, user)).collect();
    let mut issues = Vec::new();

    for user in users {
        let Some(senior_id) = &user.senior_id else {
            continue;
        };
        if senior_id == &user.id {
            issues.push(HierarchyIssue::SelfReference {
                user_id: user.id.clone(),
            });
            continue;
        }
        if !by_id.contains_key(senior_id) {
            issues.push(HierarchyIssue::DanglingSenior {
                user_id: user.id.clone(),
                senior_id: senior_id.clone(),
            });
            continue;
        }
        if leads_back_to_self(user, &by_id) {
            issues.push(HierarchyIssue::Cycle {
                user_id: user.id.clone(),
            });
        }
    }

    for issue in &issues {
        warn!(?issue, "malformed reporting line in staff directory");
    }
    issues
}

fn leads_back_to_self(user: &StaffUser, by_id: &HashMap<&UserId, &StaffUser>) -> bool {
    let mut seen: HashSet<&UserId> = HashSet::new();
    let mut cursor = user.senior_id.as_ref();
    while let Some(current) = cursor {
        if current == &user.id {
            return true;
        }
        if !seen.insert(current) {
            // Entered a loop that does not include `user`.
            return false;
        }
        cursor = by_id.get(current).and_then(|next| next.senior_id.as_ref());
    }
    false
}

/// Node of the team tree returned to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamNode {
    #[serde(flatten)]
    pub user: StaffUser,
    pub team_members: Vec<TeamNode>,
}

impl TeamNode {
    /// Number of users below this node.
    pub fn descendant_count(&self) -> usize {
        self.team_members
            .iter()
            .map(|member| 1 + member.descendant_count())
            .sum()
    }
}

/// Group active users under their seniors.
///
/// Users with no senior, or whose senior is not an active user, become roots.
/// Roots with descendants come first, childless roots follow; both keep input
/// order. Users trapped in a cycle are surfaced as roots rather than lost.
pub fn build_team_tree(users: &[StaffUser]) -> Vec<TeamNode> {
    let active: Vec<&StaffUser> = users.iter().filter(|user| user.is_active).collect();
    let positions: HashMap<&UserId, usize> = active
        .iter()
        .enumerate()
        .map(|(index, user)| (&user.id, index))
        .collect();

    let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
    let mut roots = Vec::new();
    for (index, user) in active.iter().enumerate() {
        let senior = user
            .senior_id
            .as_ref()
            .filter(|senior| *senior != &user.id)
            .and_then(|senior| positions.get(senior));
        match senior {
            Some(&parent) => children.entry(parent).or_default().push(index),
            None => roots.push(index),
        }
    }

    let mut placed = HashSet::new();
    let mut trees: Vec<(usize, TeamNode)> = Vec::new();
    for root in roots {
        trees.extend(build_node(root, &active, &children, &mut placed).map(|node| (root, node)));
    }
    for index in 0..active.len() {
        if !placed.contains(&index) {
            trees.extend(
                build_node(index, &active, &children, &mut placed).map(|node| (index, node)),
            );
        }
    }
    trees.sort_by_key(|(index, _)| *index);

    let (with_team, orphans): (Vec<_>, Vec<_>) = trees
        .into_iter()
        .map(|(_, node)| node)
        .partition(|node| !node.team_members.is_empty());
    with_team.into_iter().chain(orphans).collect()
}

fn build_node(
    index: usize,
    users: &[&StaffUser],
    children: &HashMap<usize, Vec<usize>>,
    placed: &mut HashSet<usize>,
) -> Option<TeamNode> {
    let user = users.get(index)?;
    placed.insert(index);
    let mut team_members = Vec::new();
    for &child in children.get(&index).map(Vec::as_slice).unwrap_or_default() {
        if !placed.contains(&child) {
            team_members.extend(build_node(child, users, children, placed));
        }
    }
    Some(TeamNode {
        user: (*user).clone(),
        team_members,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn id(raw: &str) -> UserId {
        UserId::new(raw).expect("valid id")
    }

    fn user(raw: &str, senior: Option<&str>) -> StaffUser {
        let base = StaffUser::new(id(raw), raw.to_uppercase(), None);
        match senior {
            Some(senior) => base.with_senior(id(senior)),
            None => base,
        }
    }

    fn ids(users: &[&StaffUser]) -> Vec<String> {
        users.iter().map(|user| user.id.to_string()).collect()
    }

    #[test]
    fn resolves_transitive_subordinates() {
        let users = vec![user("1", None), user("2", Some("1")), user("3", Some("2"))];
        assert_eq!(ids(&resolve_subordinates(&id("1"), &users)), ["2", "3"]);
        assert_eq!(ids(&resolve_subordinates(&id("2"), &users)), ["3"]);
        assert!(resolve_subordinates(&id("3"), &users).is_empty());
    }

    #[test]
    fn terminates_on_cycles() {
        let users = vec![user("a", Some("b")), user("b", Some("a"))];
        assert_eq!(ids(&resolve_subordinates(&id("a"), &users)), ["b"]);
        assert_eq!(ids(&resolve_subordinates(&id("b"), &users)), ["a"]);
    }

    #[test]
    fn self_reference_is_not_its_own_subordinate() {
        let users = vec![user("a", Some("a")), user("b", Some("a"))];
        assert_eq!(ids(&resolve_subordinates(&id("a"), &users)), ["b"]);
    }

    #[test]
    fn unknown_user_has_no_subordinates() {
        let users = vec![user("a", None)];
        assert!(resolve_subordinates(&id("zzz"), &users).is_empty());
    }

    #[rstest]
    #[case(None, "root")]
    #[case(Some("1"), "resolved")]
    #[case(Some("ghost"), "unresolved")]
    fn senior_resolution_distinguishes_cases(#[case] senior: Option<&str>, #[case] kind: &str) {
        let users = vec![user("1", None), user("2", senior)];
        let resolved = resolve_senior(&users[1], &users);
        let observed = match resolved {
            SeniorRef::Root => "root",
            SeniorRef::Resolved(_) => "resolved",
            SeniorRef::Unresolved(_) => "unresolved",
        };
        assert_eq!(observed, kind);
    }

    #[test]
    fn audit_reports_each_defect_kind() {
        let users = vec![
            user("ok", None),
            user("dangling", Some("ghost")),
            user("selfish", Some("selfish")),
            user("x", Some("y")),
            user("y", Some("x")),
            user("tail", Some("x")),
        ];

        let issues = audit(&users);

        assert_eq!(
            issues,
            vec![
                HierarchyIssue::DanglingSenior {
                    user_id: id("dangling"),
                    senior_id: id("ghost"),
                },
                HierarchyIssue::SelfReference {
                    user_id: id("selfish"),
                },
                HierarchyIssue::Cycle { user_id: id("x") },
                HierarchyIssue::Cycle { user_id: id("y") },
            ]
        );
    }

    #[test]
    fn team_tree_places_orphans_after_teams() {
        let users = vec![
            user("solo", None),
            user("m", None),
            user("t", Some("m")),
            user("e", Some("t")),
        ];

        let tree = build_team_tree(&users);

        let roots: Vec<_> = tree.iter().map(|node| node.user.id.to_string()).collect();
        assert_eq!(roots, ["m", "solo"]);
        assert_eq!(tree[0].descendant_count(), 2);
        assert_eq!(tree[0].team_members[0].team_members[0].user.id, id("e"));
    }

    #[test]
    fn team_tree_promotes_users_with_missing_or_inactive_seniors() {
        let mut inactive = user("gone", None);
        inactive.is_active = false;
        let users = vec![inactive, user("a", Some("gone")), user("b", Some("ghost"))];

        let tree = build_team_tree(&users);

        let roots: Vec<_> = tree.iter().map(|node| node.user.id.to_string()).collect();
        assert_eq!(roots, ["a", "b"]);
    }

    #[test]
    fn team_tree_surfaces_cycle_members() {
        let users = vec![user("x", Some("y")), user("y", Some("x"))];

        let tree = build_team_tree(&users);

        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].user.id, id("x"));
        assert_eq!(tree[0].team_members[0].user.id, id("y"));
    }
}
