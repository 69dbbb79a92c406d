// [libs/infra/db/src/repositories/notification.rs]
/*!
 * User-visible match alerts. `read_at` starts `NULL` and is stamped once,
 * on first acknowledgement; the 90-day retention class only ever touches
 * rows where it is already set.
 */

use super::mapping::{parse_timestamp, parse_uuid};
use crate::errors::DbError;
use libsql::{params, Connection};
use sentinel_domain_models::notification::Notification;
use tracing::instrument;
use uuid::Uuid;

pub struct NotificationRepository {
    connection: Connection,
}

impl NotificationRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    #[instrument(skip(self))]
    pub async fn insert(&self, contributor_id: Uuid, match_id: Uuid) -> Result<Notification, DbError> {
        let notification = Notification {
            id: Uuid::new_v4(),
            contributor_id,
            match_id,
            created_at: chrono::Utc::now(),
            read_at: None,
        };

        self.connection
            .execute(
                "INSERT INTO notifications (id, contributor_id, match_id, created_at, read_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    notification.id.to_string(),
                    notification.contributor_id.to_string(),
                    notification.match_id.to_string(),
                    notification.created_at.to_rfc3339(),
                    notification.read_at.map(|ts| ts.to_rfc3339()),
                ],
            )
            .await?;

        Ok(notification)
    }

    #[instrument(skip(self))]
    pub async fn mark_read(&self, notification_id: Uuid) -> Result<(), DbError> {
        let affected = self
            .connection
            .execute(
                "UPDATE notifications SET read_at = ?2 WHERE id = ?1 AND read_at IS NULL",
                params![notification_id.to_string(), chrono::Utc::now().to_rfc3339()],
            )
            .await?;

        if affected == 0 {
            return Err(DbError::NotFound { entity: "notification", key: notification_id.to_string() });
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn unread_for_contributor(&self, contributor_id: Uuid, limit: i64) -> Result<Vec<Notification>, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT id, contributor_id, match_id, created_at, read_at
                 FROM notifications WHERE contributor_id = ?1 AND read_at IS NULL
                 ORDER BY created_at DESC LIMIT ?2",
                params![contributor_id.to_string(), limit],
            )
            .await?;

        let mut notifications = Vec::new();
        while let Some(row) = rows.next().await? {
            notifications.push(map_row_to_notification(&row)?);
        }
        Ok(notifications)
    }
}

fn map_row_to_notification(row: &libsql::Row) -> Result<Notification, DbError> {
    let id: String = row.get(0)?;
    let contributor_id: String = row.get(1)?;
    let match_id: String = row.get(2)?;
    let created_at: String = row.get(3)?;
    let read_at: Option<String> = row.get(4)?;

    Ok(Notification {
        id: parse_uuid(&id)?,
        contributor_id: parse_uuid(&contributor_id)?,
        match_id: parse_uuid(&match_id)?,
        created_at: parse_timestamp(&created_at)?,
        read_at: read_at.map(|raw| parse_timestamp(&raw)).transpose()?,
    })
}
