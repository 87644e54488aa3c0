mod common;

use std::str::FromStr;
use std::time::Duration;

use agencyhub_api::database::models::TeamRole;
use agencyhub_api::forms::{FormLayout, LayoutField, LayoutTarget};
use agencyhub_api::metrics::DailyMetricInput;
use agencyhub_api::realtime::{ChangeFeed, Table};
use agencyhub_api::services::{BulletinService, FormLayoutService, MetricsService, NewBulletin, ServiceError, TeamService};
use agencyhub_api::types::DateRange;
use anyhow::Result;
use common::{date, insert_profile};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

fn bulletin(title: &str, pinned: bool) -> NewBulletin {
    NewBulletin {
        title: title.to_string(),
        body: format!("{} body", title),
        pinned,
    }
}

async fn backdate(pool: &PgPool, bulletin_id: Uuid, minutes: i32) -> Result<()> {
    sqlx::query("UPDATE team_bulletins SET created_at = now() - ($2::int * interval '1 minute') WHERE id = $1")
        .bind(bulletin_id)
        .bind(minutes)
        .execute(pool)
        .await?;
    Ok(())
}

fn field(key: &str, section: &str) -> LayoutField {
    LayoutField {
        key: key.to_string(),
        section: section.to_string(),
    }
}

#[tokio::test]
async fn bulletins_list_pinned_first_then_newest_with_read_flags() -> Result<()> {
    let Some(pool) = common::database().await? else {
        return Ok(());
    };
    let owner = insert_profile(&pool, "owner").await?;
    let agent = insert_profile(&pool, "agent").await?;

    let teams = TeamService::new(pool.clone(), ChangeFeed::new(16));
    let team = teams.create_team(owner, "North").await?;
    teams.add_member(team.id, agent, TeamRole::Member).await?;

    let bulletins = BulletinService::new(pool.clone(), ChangeFeed::new(16));
    let oldest = bulletins.post(team.id, owner, &bulletin("Oldest", false)).await?;
    let pinned = bulletins.post(team.id, owner, &bulletin("Pinned", true)).await?;
    let newest = bulletins.post(team.id, owner, &bulletin("Newest", false)).await?;
    backdate(&pool, oldest.id, 30).await?;
    backdate(&pool, pinned.id, 60).await?;
    backdate(&pool, newest.id, 1).await?;

    bulletins.mark_read(oldest.id, agent).await?;

    let seen = bulletins.list(team.id, agent).await?;
    let order: Vec<Uuid> = seen.iter().map(|v| v.bulletin.id).collect();
    assert_eq!(order, vec![pinned.id, newest.id, oldest.id]);
    let read: Vec<bool> = seen.iter().map(|v| v.read).collect();
    assert_eq!(read, vec![false, false, true]);

    // Receipts belong to the viewer who wrote them.
    let owner_view = bulletins.list(team.id, owner).await?;
    assert!(owner_view.iter().all(|v| !v.read));

    Ok(())
}

#[tokio::test]
async fn marking_read_twice_keeps_first_timestamp() -> Result<()> {
    let Some(pool) = common::database().await? else {
        return Ok(());
    };
    let owner = insert_profile(&pool, "owner").await?;

    let teams = TeamService::new(pool.clone(), ChangeFeed::new(16));
    let team = teams.create_team(owner, "Receipts").await?;
    let bulletins = BulletinService::new(pool.clone(), ChangeFeed::new(16));
    let posted = bulletins.post(team.id, owner, &bulletin("Quarterly goals", false)).await?;

    let first = bulletins.mark_read(posted.id, owner).await?;
    tokio::time::sleep(Duration::from_millis(20)).await;
    let second = bulletins.mark_read(posted.id, owner).await?;
    assert_eq!(first.read_at, second.read_at);

    let (receipts,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM bulletin_read_receipts WHERE bulletin_id = $1 AND user_id = $2")
            .bind(posted.id)
            .bind(owner)
            .fetch_one(&pool)
            .await?;
    assert_eq!(receipts, 1);

    Ok(())
}

#[tokio::test]
async fn unread_count_spans_every_team_of_the_viewer() -> Result<()> {
    let Some(pool) = common::database().await? else {
        return Ok(());
    };
    let owner = insert_profile(&pool, "owner").await?;
    let outsider = insert_profile(&pool, "outsider").await?;
    let agent = insert_profile(&pool, "agent").await?;

    let teams = TeamService::new(pool.clone(), ChangeFeed::new(16));
    let east = teams.create_team(owner, "East").await?;
    let west = teams.create_team(owner, "West").await?;
    let elsewhere = teams.create_team(outsider, "Elsewhere").await?;
    teams.add_member(east.id, agent, TeamRole::Member).await?;
    teams.add_member(west.id, agent, TeamRole::Manager).await?;

    let bulletins = BulletinService::new(pool.clone(), ChangeFeed::new(16));
    let first = bulletins.post(east.id, owner, &bulletin("East one", false)).await?;
    bulletins.post(east.id, owner, &bulletin("East two", true)).await?;
    bulletins.post(west.id, owner, &bulletin("West one", false)).await?;
    bulletins.post(elsewhere.id, outsider, &bulletin("Not yours", false)).await?;

    assert_eq!(bulletins.unread_count(agent).await?, 3);

    bulletins.mark_read(first.id, agent).await?;
    assert_eq!(bulletins.unread_count(agent).await?, 2);
    assert_eq!(bulletins.unread_count(outsider).await?, 1);

    Ok(())
}

#[tokio::test]
async fn metric_upsert_keeps_one_row_per_day() -> Result<()> {
    let Some(pool) = common::database().await? else {
        return Ok(());
    };
    let agent = insert_profile(&pool, "agent").await?;
    let metrics = MetricsService::new(pool.clone(), ChangeFeed::new(16));
    let day = date(2025, 3, 14);

    metrics
        .upsert(
            agent,
            &DailyMetricInput {
                metric_date: Some(day),
                calls: 10,
                contacts: 4,
                ..Default::default()
            },
        )
        .await?;
    let saved = metrics
        .upsert(
            agent,
            &DailyMetricInput {
                metric_date: Some(day),
                calls: 25,
                contacts: 9,
                sales: 1,
                ap: Decimal::from_str("500.00")?,
                ..Default::default()
            },
        )
        .await?;
    assert_eq!(saved.calls, 25);

    let rows = metrics
        .range(
            &[agent],
            DateRange {
                from: Some(day),
                to: Some(day),
            },
        )
        .await?;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].calls, 25);
    assert_eq!(rows[0].contacts, 9);
    assert_eq!(rows[0].sales, 1);
    assert_eq!(rows[0].ap, Decimal::from_str("500.00")?);

    let rejected = metrics
        .upsert(
            agent,
            &DailyMetricInput {
                metric_date: Some(day),
                calls: -1,
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(rejected, Err(ServiceError::Invalid(_))));

    Ok(())
}

#[tokio::test]
async fn team_owner_row_cannot_be_changed_or_removed() -> Result<()> {
    let Some(pool) = common::database().await? else {
        return Ok(());
    };
    let owner = insert_profile(&pool, "owner").await?;
    let agent = insert_profile(&pool, "agent").await?;

    let teams = TeamService::new(pool.clone(), ChangeFeed::new(16));
    let team = teams.create_team(owner, "Central").await?;

    let demoted = teams.add_member(team.id, owner, TeamRole::Member).await;
    assert!(matches!(demoted, Err(ServiceError::Forbidden(_))));

    let crowned = teams.add_member(team.id, agent, TeamRole::Owner).await;
    assert!(matches!(crowned, Err(ServiceError::Invalid(_))));

    assert!(!teams.remove_member(team.id, owner).await?);

    let membership = teams.membership(team.id, owner).await?;
    assert_eq!(membership.map(|m| m.team_role()), Some(TeamRole::Owner));

    // Ordinary members can be re-roled and removed.
    teams.add_member(team.id, agent, TeamRole::Member).await?;
    let promoted = teams.add_member(team.id, agent, TeamRole::Manager).await?;
    assert_eq!(promoted.team_role(), TeamRole::Manager);
    assert_eq!(teams.members(team.id).await?.len(), 2);
    assert!(teams.remove_member(team.id, agent).await?);
    assert_eq!(teams.members(team.id).await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn layout_replace_renumbers_and_drops_old_rows() -> Result<()> {
    let Some(pool) = common::database().await? else {
        return Ok(());
    };
    let agent = insert_profile(&pool, "agent").await?;
    let feed = ChangeFeed::new(16);
    let mut events = feed.subscribe();
    let layouts = FormLayoutService::new(pool.clone(), feed);

    let full = FormLayout {
        sections: vec!["contact".to_string(), "policy".to_string()],
        fields: vec![field("email", "contact"), field("phone", "contact"), field("carrier", "policy")],
    };
    layouts.replace(agent, "client_intake", &full).await?;
    assert_eq!(layouts.load(agent, "client_intake").await?, full);

    let positions: Vec<(String, i32)> = sqlx::query_as(
        "SELECT field_key, position FROM form_field_positions WHERE user_id = $1 AND form_key = $2 ORDER BY position",
    )
    .bind(agent)
    .bind("client_intake")
    .fetch_all(&pool)
    .await?;
    assert_eq!(
        positions,
        vec![("email".to_string(), 0), ("phone".to_string(), 1), ("carrier".to_string(), 2)]
    );

    let moved = layouts
        .move_item(agent, "client_intake", LayoutTarget::Section, 1, 0)
        .await?;
    assert_eq!(moved.sections, vec!["policy".to_string(), "contact".to_string()]);
    let sections: Vec<(String, i32)> = sqlx::query_as(
        "SELECT section_key, position FROM form_section_positions WHERE user_id = $1 AND form_key = $2 ORDER BY position",
    )
    .bind(agent)
    .bind("client_intake")
    .fetch_all(&pool)
    .await?;
    assert_eq!(sections, vec![("policy".to_string(), 0), ("contact".to_string(), 1)]);

    let trimmed = FormLayout {
        sections: vec!["policy".to_string()],
        fields: vec![field("carrier", "policy")],
    };
    layouts.replace(agent, "client_intake", &trimmed).await?;
    assert_eq!(layouts.load(agent, "client_intake").await?, trimmed);

    let (position,): (i32,) = sqlx::query_as(
        "SELECT position FROM form_field_positions WHERE user_id = $1 AND form_key = $2 AND field_key = 'carrier'",
    )
    .bind(agent)
    .bind("client_intake")
    .fetch_one(&pool)
    .await?;
    assert_eq!(position, 0);

    // Other forms of the same user are untouched.
    assert_eq!(layouts.load(agent, "policy_review").await?, FormLayout::default());

    let mut tables = Vec::new();
    while let Ok(event) = events.try_recv() {
        tables.push(event.table);
    }
    assert_eq!(tables.len(), 6);
    assert_eq!(tables[0], Table::FormSectionPositions);
    assert_eq!(tables[1], Table::FormFieldPositions);

    Ok(())
}
