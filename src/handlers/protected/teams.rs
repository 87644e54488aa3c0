use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::access::DEFAULT_FALLBACK;
use crate::database::models::{Team, TeamMember, TeamRole};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Viewer, MANAGER_ROLES};
use crate::roles::check_required_role;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTeam {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct MemberRole {
    #[serde(default = "default_member_role")]
    pub role: TeamRole,
}

fn default_member_role() -> TeamRole {
    TeamRole::Member
}

/// GET /api/teams - teams the viewer belongs to
pub async fn teams_get(State(state): State<AppState>, Extension(viewer): Extension<Viewer>) -> ApiResult<Vec<Team>> {
    Ok(ApiResponse::success(state.teams().teams_for_user(viewer.id()).await?))
}

/// POST /api/teams - managers (and admins) create teams they own
pub async fn teams_post(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(body): Json<CreateTeam>,
) -> ApiResult<Team> {
    if !check_required_role(&viewer.roles, Some(MANAGER_ROLES)) {
        return Err(ApiError::access_denied("Only managers can create teams", DEFAULT_FALLBACK));
    }
    let team = state.teams().create_team(viewer.id(), &body.name).await?;
    Ok(ApiResponse::created(team))
}

/// DELETE /api/teams/:id - owner or admin
pub async fn team_delete(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<()> {
    let teams = state.teams();
    let team = teams
        .team(team_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Team not found"))?;

    if team.manager_id != viewer.id() && !viewer.is_admin() {
        return Err(ApiError::forbidden("Only the team owner can delete the team"));
    }

    teams.delete_team(team_id).await?;
    Ok(ApiResponse::no_content())
}

/// GET /api/teams/:id/members
pub async fn members_get(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path(team_id): Path<Uuid>,
) -> ApiResult<Vec<TeamMember>> {
    let teams = state.teams();
    if !teams.can_view(team_id, viewer.id(), &viewer.roles).await? {
        return Err(ApiError::forbidden("You are not a member of this team"));
    }
    Ok(ApiResponse::success(teams.members(team_id).await?))
}

/// PUT /api/teams/:id/members/:user_id - add or change a member's role
pub async fn member_put(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<MemberRole>,
) -> ApiResult<TeamMember> {
    let teams = state.teams();
    if !teams.can_moderate(team_id, viewer.id(), &viewer.roles).await? {
        return Err(ApiError::forbidden("Only team owners and managers can manage members"));
    }
    if state.directory.profile(user_id).await?.is_none() {
        return Err(ApiError::not_found(format!("Profile {} not found", user_id)));
    }
    Ok(ApiResponse::success(teams.add_member(team_id, user_id, body.role).await?))
}

/// DELETE /api/teams/:id/members/:user_id - moderators remove anyone but the
/// owner; members may remove themselves
pub async fn member_delete(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Path((team_id, user_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<()> {
    let teams = state.teams();
    if user_id != viewer.id() && !teams.can_moderate(team_id, viewer.id(), &viewer.roles).await? {
        return Err(ApiError::forbidden("Only team owners and managers can manage members"));
    }
    if !teams.remove_member(team_id, user_id).await? {
        return Err(ApiError::not_found("Membership not found"));
    }
    Ok(ApiResponse::no_content())
}
