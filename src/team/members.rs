use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use super::{has_user_as_manager, manager_chain};
use crate::database::models::Profile;
use crate::database::DatabaseError;
use crate::roles::{check_system_admin_role, RoleSet};
use crate::services::Directory;

#[derive(Debug, Error)]
pub enum TeamError {
    #[error("a user cannot be their own manager")]
    SelfAssignment,

    #[error("{candidate} reports to {user} and cannot become their manager")]
    SubordinateAssignment { user: Uuid, candidate: Uuid },

    #[error("profile {0} not found")]
    NotFound(Uuid),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

/// Everyone whose `manager_id` is `manager_id`. Store failures are logged and
/// reported as an empty team.
pub async fn fetch_manager_team_members(directory: &dyn Directory, manager_id: Uuid) -> Vec<Profile> {
    match directory.profiles_managed_by(manager_id).await {
        Ok(members) => members,
        Err(e) => {
            error!(manager_id = %manager_id, error = %e, "Failed to fetch team members");
            Vec::new()
        }
    }
}

/// Reports of the manager's sub-managers (two levels, no further). Store
/// failures are logged and reported as an empty team.
pub async fn fetch_nested_team_members(directory: &dyn Directory, manager_id: Uuid) -> Vec<Profile> {
    let sub_managers = match directory.sub_managers_of(manager_id).await {
        Ok(subs) => subs,
        Err(e) => {
            error!(manager_id = %manager_id, error = %e, "Failed to fetch sub-managers");
            return Vec::new();
        }
    };

    if sub_managers.is_empty() {
        return Vec::new();
    }

    let ids: Vec<Uuid> = sub_managers.iter().map(|p| p.id).collect();
    match directory.profiles_managed_by_any(&ids).await {
        Ok(members) => members,
        Err(e) => {
            error!(manager_id = %manager_id, error = %e, "Failed to fetch nested team members");
            Vec::new()
        }
    }
}

/// Point `user_id` at a new manager, or clear it with `None`.
///
/// Rejects self-assignment and assigning one of the user's own reports. The
/// check reads a snapshot of all profiles; two sessions editing at once can
/// still produce a loop (last write wins).
pub async fn reassign_manager(
    directory: &dyn Directory,
    user_id: Uuid,
    new_manager_id: Option<Uuid>,
) -> Result<Profile, TeamError> {
    let Some(manager_id) = new_manager_id else {
        directory.profile(user_id).await?.ok_or(TeamError::NotFound(user_id))?;
        let updated = directory.set_manager(user_id, None).await?;
        info!(user_id = %user_id, "Manager cleared");
        return Ok(updated);
    };

    if manager_id == user_id {
        return Err(TeamError::SelfAssignment);
    }

    let all = directory.profiles().await?;
    all.iter()
        .find(|p| p.id == user_id)
        .ok_or(TeamError::NotFound(user_id))?;
    let candidate = all
        .iter()
        .find(|p| p.id == manager_id)
        .ok_or(TeamError::NotFound(manager_id))?;

    if has_user_as_manager(candidate, user_id, &all) {
        return Err(TeamError::SubordinateAssignment {
            user: user_id,
            candidate: manager_id,
        });
    }

    let updated = directory.set_manager(user_id, Some(manager_id)).await?;
    info!(user_id = %user_id, manager_id = %manager_id, "Manager reassigned");
    Ok(updated)
}

/// Whether `viewer` may see `manager_id`'s team: the viewer is that manager,
/// sits above them in the chain, or is a system admin.
pub async fn manages(
    directory: &dyn Directory,
    viewer_id: Uuid,
    viewer_roles: &RoleSet,
    manager_id: Uuid,
) -> Result<bool, DatabaseError> {
    if viewer_id == manager_id || check_system_admin_role(viewer_roles) {
        return Ok(true);
    }

    let all = directory.profiles().await?;
    Ok(all
        .iter()
        .find(|p| p.id == manager_id)
        .map_or(false, |manager| manager_chain(manager, &all).contains(&viewer_id)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::Role;
    use crate::testing::{profile, MemoryDirectory};

    #[tokio::test]
    async fn fetches_single_level_team() {
        let dir = MemoryDirectory::new();
        let boss = profile("boss@x.io", None);
        let a = profile("a@x.io", Some(boss.id));
        let b = profile("b@x.io", Some(a.id));
        dir.insert(boss.clone(), &[Role::ManagerPro]);
        dir.insert(a.clone(), &[Role::ManagerPro]);
        dir.insert(b.clone(), &[Role::Agent]);

        let team = fetch_manager_team_members(&dir, boss.id).await;
        assert_eq!(team.iter().map(|p| p.id).collect::<Vec<_>>(), vec![a.id]);

        let nested = fetch_nested_team_members(&dir, boss.id).await;
        assert_eq!(nested.iter().map(|p| p.id).collect::<Vec<_>>(), vec![b.id]);
    }

    #[tokio::test]
    async fn nested_fetch_skips_non_manager_reports() {
        let dir = MemoryDirectory::new();
        let boss = profile("boss@x.io", None);
        let agent = profile("agent@x.io", Some(boss.id));
        let under = profile("under@x.io", Some(agent.id));
        dir.insert(boss.clone(), &[Role::ManagerProGold]);
        dir.insert(agent.clone(), &[Role::AgentPro]);
        dir.insert(under.clone(), &[Role::Agent]);

        assert!(fetch_nested_team_members(&dir, boss.id).await.is_empty());
    }

    #[tokio::test]
    async fn store_errors_degrade_to_empty() {
        let dir = MemoryDirectory::new();
        let boss = profile("boss@x.io", None);
        dir.insert(boss.clone(), &[Role::ManagerPro]);
        dir.insert(profile("a@x.io", Some(boss.id)), &[]);
        dir.fail_queries(true);

        assert!(fetch_manager_team_members(&dir, boss.id).await.is_empty());
        assert!(fetch_nested_team_members(&dir, boss.id).await.is_empty());
    }

    #[tokio::test]
    async fn reassignment_rejects_subordinates_and_self() {
        let dir = MemoryDirectory::new();
        let top = profile("top@x.io", None);
        let mid = profile("mid@x.io", Some(top.id));
        let low = profile("low@x.io", Some(mid.id));
        dir.insert(top.clone(), &[]);
        dir.insert(mid.clone(), &[]);
        dir.insert(low.clone(), &[]);

        assert!(matches!(
            reassign_manager(&dir, mid.id, Some(mid.id)).await,
            Err(TeamError::SelfAssignment)
        ));
        assert!(matches!(
            reassign_manager(&dir, top.id, Some(low.id)).await,
            Err(TeamError::SubordinateAssignment { .. })
        ));

        let moved = reassign_manager(&dir, low.id, Some(top.id)).await.unwrap();
        assert_eq!(moved.manager_id, Some(top.id));

        let cleared = reassign_manager(&dir, mid.id, None).await.unwrap();
        assert_eq!(cleared.manager_id, None);
    }

    #[tokio::test]
    async fn reassignment_reports_missing_profiles() {
        let dir = MemoryDirectory::new();
        let a = profile("a@x.io", None);
        dir.insert(a.clone(), &[]);
        let ghost = Uuid::new_v4();

        assert!(matches!(
            reassign_manager(&dir, a.id, Some(ghost)).await,
            Err(TeamError::NotFound(id)) if id == ghost
        ));
        assert!(matches!(
            reassign_manager(&dir, ghost, None).await,
            Err(TeamError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn manager_scope() {
        let dir = MemoryDirectory::new();
        let top = profile("top@x.io", None);
        let mid = profile("mid@x.io", Some(top.id));
        let outsider = profile("out@x.io", None);
        dir.insert(top.clone(), &[Role::ManagerProPlatinum]);
        dir.insert(mid.clone(), &[Role::ManagerPro]);
        dir.insert(outsider.clone(), &[Role::ManagerPro]);

        let none = RoleSet::new();
        assert!(manages(&dir, mid.id, &none, mid.id).await.unwrap());
        assert!(manages(&dir, top.id, &none, mid.id).await.unwrap());
        assert!(!manages(&dir, mid.id, &none, top.id).await.unwrap());
        assert!(!manages(&dir, outsider.id, &none, mid.id).await.unwrap());

        let admin = RoleSet::from_iter([Role::SystemAdmin]);
        assert!(manages(&dir, outsider.id, &admin, mid.id).await.unwrap());
    }
}
