//! Manager-chain resolution over profiles.
//!
//! The `manager_id` pointers are expected to form a forest. Nothing in the
//! store enforces that, so every walk here carries a visited set and stops on
//! the first repeated id.

pub mod members;

use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::database::models::Profile;

pub use members::{
    fetch_manager_team_members, fetch_nested_team_members, manages, reassign_manager, TeamError,
};

/// True iff `target_manager_id` appears anywhere in the chain of managers
/// above `user`. The walk starts at the user's manager, so a user is only
/// their own ancestor when the data contains a loop back to them.
pub fn has_user_as_manager(user: &Profile, target_manager_id: Uuid, all_users: &[Profile]) -> bool {
    let by_id: HashMap<Uuid, &Profile> = all_users.iter().map(|p| (p.id, p)).collect();
    chain_contains(user.manager_id, target_manager_id, &by_id)
}

fn chain_contains(start: Option<Uuid>, target: Uuid, by_id: &HashMap<Uuid, &Profile>) -> bool {
    let mut visited = HashSet::new();
    let mut current = start;

    while let Some(manager_id) = current {
        if manager_id == target {
            return true;
        }
        if !visited.insert(manager_id) {
            return false;
        }
        current = by_id.get(&manager_id).and_then(|p| p.manager_id);
    }

    false
}

/// The manager chain above `user`, nearest first. Stops at a missing profile
/// or a repeated id.
pub fn manager_chain(user: &Profile, all_users: &[Profile]) -> Vec<Uuid> {
    let by_id: HashMap<Uuid, &Profile> = all_users.iter().map(|p| (p.id, p)).collect();
    let mut chain = Vec::new();
    let mut seen = HashSet::from([user.id]);
    let mut current = user.manager_id;

    while let Some(manager_id) = current {
        if !seen.insert(manager_id) {
            break;
        }
        chain.push(manager_id);
        current = by_id.get(&manager_id).and_then(|p| p.manager_id);
    }

    chain
}

/// Profiles that may be offered as `user`'s new manager: everyone except the
/// user and anyone who already reports to the user, directly or not.
pub fn manager_candidates<'a>(user: &Profile, all_users: &'a [Profile]) -> Vec<&'a Profile> {
    let by_id: HashMap<Uuid, &Profile> = all_users.iter().map(|p| (p.id, p)).collect();
    all_users
        .iter()
        .filter(|candidate| candidate.id != user.id)
        .filter(|candidate| !chain_contains(candidate.manager_id, user.id, &by_id))
        .collect()
}

pub fn direct_reports<'a>(manager_id: Uuid, all_users: &'a [Profile]) -> Vec<&'a Profile> {
    all_users
        .iter()
        .filter(|p| p.manager_id == Some(manager_id))
        .collect()
}

/// Two levels down: reports of the manager's direct reports who hold a
/// manager-tier role (`managers`). Does not descend further.
pub fn nested_reports<'a>(
    manager_id: Uuid,
    all_users: &'a [Profile],
    managers: &HashSet<Uuid>,
) -> Vec<&'a Profile> {
    let sub_managers: HashSet<Uuid> = direct_reports(manager_id, all_users)
        .into_iter()
        .filter(|p| managers.contains(&p.id))
        .map(|p| p.id)
        .collect();

    all_users
        .iter()
        .filter(|p| p.manager_id.map_or(false, |m| sub_managers.contains(&m)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::profile;

    fn ids(profiles: &[&Profile]) -> Vec<Uuid> {
        profiles.iter().map(|p| p.id).collect()
    }

    #[test]
    fn finds_direct_and_indirect_managers() {
        let a = profile("a@x.io", None);
        let b = profile("b@x.io", Some(a.id));
        let c = profile("c@x.io", Some(b.id));
        let all = vec![a.clone(), b.clone(), c.clone()];

        assert!(has_user_as_manager(&b, a.id, &all));
        assert!(has_user_as_manager(&c, a.id, &all));
        assert!(!has_user_as_manager(&a, c.id, &all));
    }

    #[test]
    fn unrelated_users_are_not_managers() {
        let a = profile("a@x.io", None);
        let b = profile("b@x.io", None);
        let all = vec![a.clone(), b.clone()];
        assert!(!has_user_as_manager(&b, a.id, &all));
    }

    #[test]
    fn self_check_follows_the_chain() {
        let a = profile("a@x.io", None);
        let all = vec![a.clone()];
        assert!(!has_user_as_manager(&a, a.id, &all));
    }

    #[test]
    fn cycles_terminate() {
        let mut a = profile("a@x.io", None);
        let b = profile("b@x.io", Some(a.id));
        a.manager_id = Some(b.id);
        let stranger = profile("s@x.io", None);
        let all = vec![a.clone(), b.clone(), stranger.clone()];

        assert!(!has_user_as_manager(&a, stranger.id, &all));
        // a -> b -> a: a is in its own chain.
        assert!(has_user_as_manager(&a, a.id, &all));
        assert_eq!(manager_chain(&a, &all), vec![b.id]);
    }

    #[test]
    fn missing_manager_ends_the_walk() {
        let ghost = Uuid::new_v4();
        let a = profile("a@x.io", Some(ghost));
        let all = vec![a.clone()];
        assert!(has_user_as_manager(&a, ghost, &all));
        assert!(!has_user_as_manager(&a, Uuid::new_v4(), &all));
    }

    #[test]
    fn candidates_exclude_self_and_subordinates() {
        let top = profile("top@x.io", None);
        let mid = profile("mid@x.io", Some(top.id));
        let low = profile("low@x.io", Some(mid.id));
        let peer = profile("peer@x.io", Some(top.id));
        let all = vec![top.clone(), mid.clone(), low.clone(), peer.clone()];

        let offered = ids(&manager_candidates(&mid, &all));
        assert!(offered.contains(&top.id));
        assert!(offered.contains(&peer.id));
        assert!(!offered.contains(&mid.id));
        assert!(!offered.contains(&low.id));

        let offered_top = ids(&manager_candidates(&top, &all));
        assert!(offered_top.is_empty());
    }

    #[test]
    fn nested_reports_stop_at_two_levels() {
        let boss = profile("boss@x.io", None);
        let sub = profile("sub@x.io", Some(boss.id));
        let agent = profile("agent@x.io", Some(boss.id));
        let under_sub = profile("u1@x.io", Some(sub.id));
        let under_agent = profile("u2@x.io", Some(agent.id));
        let deep = profile("deep@x.io", Some(under_sub.id));
        let all = vec![
            boss.clone(),
            sub.clone(),
            agent.clone(),
            under_sub.clone(),
            under_agent.clone(),
            deep.clone(),
        ];
        let managers = HashSet::from([sub.id, under_sub.id]);

        assert_eq!(ids(&direct_reports(boss.id, &all)), vec![sub.id, agent.id]);
        assert_eq!(ids(&nested_reports(boss.id, &all, &managers)), vec![under_sub.id]);
    }
}
