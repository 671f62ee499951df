// SPDX-FileCopyrightText: 2026 Vigia Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Organization, group, and admin lookups.
//!
//! These rows are owned by the surrounding dashboard CRUD; the pipeline
//! only reads them (context fetch, admin resolution, scheduler input) and
//! stamps `last_summary_date` after a scheduled run.

use rusqlite::params;
use vigia_core::VigiaError;

use crate::database::Database;
use crate::models::{AdminContact, Group, GroupContext, Organization};

const ORG_COLUMNS: &str = "id, name, plan, summary_schedule_time, summary_delivery_days, \
                           last_summary_date, is_active, created_at";

const GROUP_COLUMNS: &str = "id, organization_id, name, description, preset_name, \
                             preset_description, is_active, created_at";

fn org_from_row(row: &rusqlite::Row<'_>) -> Result<Organization, rusqlite::Error> {
    Ok(Organization {
        id: row.get(0)?,
        name: row.get(1)?,
        plan: row.get(2)?,
        summary_schedule_time: row.get(3)?,
        summary_delivery_days: row.get(4)?,
        last_summary_date: row.get(5)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn group_from_row(row: &rusqlite::Row<'_>) -> Result<Group, rusqlite::Error> {
    Ok(Group {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        preset_name: row.get(4)?,
        preset_description: row.get(5)?,
        is_active: row.get(6)?,
        created_at: row.get(7)?,
    })
}

/// Fetch a group joined with its owning organization.
pub async fn group_context(
    db: &Database,
    group_id: &str,
) -> Result<Option<GroupContext>, VigiaError> {
    let group_id = group_id.to_string();
    db.connection()
        .call(move |conn| {
            let group = {
                let result = conn.query_row(
                    &format!("SELECT {GROUP_COLUMNS} FROM groups WHERE id = ?1"),
                    params![group_id],
                    group_from_row,
                );
                match result {
                    Ok(group) => group,
                    Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
                    Err(e) => return Err(e.into()),
                }
            };

            let organization = conn.query_row(
                &format!("SELECT {ORG_COLUMNS} FROM organizations WHERE id = ?1"),
                params![group.organization_id],
                org_from_row,
            )?;

            Ok(Some(GroupContext {
                group,
                organization,
            }))
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Return the notification contacts of an organization's admins.
pub async fn organization_admins(
    db: &Database,
    organization_id: &str,
) -> Result<Vec<AdminContact>, VigiaError> {
    let organization_id = organization_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT organization_id, user_id, email, whatsapp,
                        email_summary_enabled, whatsapp_summary_enabled
                 FROM organization_admins
                 WHERE organization_id = ?1
                 ORDER BY user_id ASC",
            )?;
            let rows = stmt.query_map(params![organization_id], |row| {
                Ok(AdminContact {
                    organization_id: row.get(0)?,
                    user_id: row.get(1)?,
                    email: row.get(2)?,
                    whatsapp: row.get(3)?,
                    email_summary_enabled: row.get(4)?,
                    whatsapp_summary_enabled: row.get(5)?,
                })
            })?;
            let mut admins = Vec::new();
            for row in rows {
                admins.push(row?);
            }
            Ok(admins)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Return all active organizations.
pub async fn active_organizations(db: &Database) -> Result<Vec<Organization>, VigiaError> {
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {ORG_COLUMNS} FROM organizations
                 WHERE is_active = 1
                 ORDER BY created_at ASC"
            ))?;
            let rows = stmt.query_map([], org_from_row)?;
            let mut orgs = Vec::new();
            for row in rows {
                orgs.push(row?);
            }
            Ok(orgs)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Return an organization's active groups.
pub async fn active_groups(
    db: &Database,
    organization_id: &str,
) -> Result<Vec<Group>, VigiaError> {
    let organization_id = organization_id.to_string();
    db.connection()
        .call(move |conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {GROUP_COLUMNS} FROM groups
                 WHERE organization_id = ?1 AND is_active = 1
                 ORDER BY created_at ASC"
            ))?;
            let rows = stmt.query_map(params![organization_id], group_from_row)?;
            let mut groups = Vec::new();
            for row in rows {
                groups.push(row?);
            }
            Ok(groups)
        })
        .await
        .map_err(crate::database::map_tr_err)
}

/// Stamp the date of the last scheduler-triggered summary run.
pub async fn set_last_summary_date(
    db: &Database,
    organization_id: &str,
    date: &str,
) -> Result<(), VigiaError> {
    let organization_id = organization_id.to_string();
    let date = date.to_string();
    db.connection()
        .call(move |conn| {
            conn.execute(
                "UPDATE organizations SET last_summary_date = ?2 WHERE id = ?1",
                params![organization_id, date],
            )?;
            Ok(())
        })
        .await
        .map_err(crate::database::map_tr_err)
}
