// [libs/infra/db/src/repositories/contributor.rs]
/*!
 * Contributors, their reference embeddings, and their known-account
 * allowlist. The matching stage's registry scan reads `embeddings_for` and
 * `known_accounts_for`; nothing in this crate mutates a contributor's tier,
 * that is an external provisioning concern.
 */

use super::mapping::{parse_timestamp, parse_uuid};
use crate::errors::DbError;
use libsql::{params, Connection};
use sentinel_domain_models::contributor::{Contributor, ContributorTier, Embedding, KnownAccount};
use tracing::instrument;
use uuid::Uuid;

pub struct ContributorRepository {
    connection: Connection,
}

impl ContributorRepository {
    pub fn new(connection: Connection) -> Self {
        Self { connection }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, contributor_id: Uuid) -> Result<Contributor, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT id, display_name, tier, created_at FROM contributors WHERE id = ?1",
                params![contributor_id.to_string()],
            )
            .await?;

        let row = rows
            .next()
            .await?
            .ok_or_else(|| DbError::NotFound { entity: "contributor", key: contributor_id.to_string() })?;

        let id: String = row.get(0)?;
        let display_name: String = row.get(1)?;
        let tier_raw: String = row.get(2)?;
        let created_at: String = row.get(3)?;

        Ok(Contributor {
            id: parse_uuid(&id)?,
            display_name,
            tier: ContributorTier::parse_or_free(&tier_raw),
            created_at: parse_timestamp(&created_at)?,
        })
    }

    /// All embeddings owned by every contributor, for the comparator's
    /// registry scan. `primary_only` restricts to primary embeddings, which
    /// is the only kind the free tier may match against.
    #[instrument(skip(self))]
    pub async fn all_embeddings(&self, primary_only: bool) -> Result<Vec<Embedding>, DbError> {
        let sql = if primary_only {
            "SELECT id, contributor_id, vector_json, is_primary, created_at FROM embeddings WHERE is_primary = 1"
        } else {
            "SELECT id, contributor_id, vector_json, is_primary, created_at FROM embeddings"
        };

        let mut rows = self.connection.query(sql, ()).await?;
        let mut embeddings = Vec::new();
        while let Some(row) = rows.next().await? {
            embeddings.push(map_row_to_embedding(&row)?);
        }
        Ok(embeddings)
    }

    /// The registry scan for matching: every embedding that is eligible to
    /// be matched against, per its owner's tier. A free-tier contributor's
    /// secondary embeddings are excluded, since `TierConfig::crawl_registry_primary_only`
    /// restricts the free tier to primary-only matching; every other tier's
    /// embeddings are included unconditionally.
    #[instrument(skip(self))]
    pub async fn matching_registry(&self) -> Result<Vec<Embedding>, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT e.id, e.contributor_id, e.vector_json, e.is_primary, e.created_at
                 FROM embeddings e
                 JOIN contributors c ON c.id = e.contributor_id
                 WHERE e.is_primary = 1 OR c.tier != 'free'",
                (),
            )
            .await?;

        let mut embeddings = Vec::new();
        while let Some(row) = rows.next().await? {
            embeddings.push(map_row_to_embedding(&row)?);
        }
        Ok(embeddings)
    }

    #[instrument(skip(self, vector))]
    pub async fn insert_embedding(
        &self,
        contributor_id: Uuid,
        vector: &[f32],
        primary: bool,
    ) -> Result<Uuid, DbError> {
        let id = Uuid::new_v4();
        let vector_json = serde_json::to_string(vector)
            .map_err(|e| DbError::MappingError(format!("embedding vector serialization failed: {}", e)))?;

        self.connection
            .execute(
                "INSERT INTO embeddings (id, contributor_id, vector_json, is_primary) VALUES (?1, ?2, ?3, ?4)",
                params![id.to_string(), contributor_id.to_string(), vector_json, primary as i64],
            )
            .await?;
        Ok(id)
    }

    /// Adds a known account to a contributor's allowlist, enforcing
    /// `TierConfig::max_known_accounts`. Allowlist size is the only per-tier
    /// cap that isn't a pipeline gate, so the repository owns the check
    /// rather than leaving it to the caller.
    #[instrument(skip(self, handle, domain))]
    pub async fn insert_known_account(
        &self,
        contributor_id: Uuid,
        platform: Option<&str>,
        handle: Option<&str>,
        domain: Option<&str>,
        max_allowed: u32,
    ) -> Result<KnownAccount, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT COUNT(*) FROM known_accounts WHERE contributor_id = ?1",
                params![contributor_id.to_string()],
            )
            .await?;
        let current: i64 = rows.next().await?.expect("COUNT(*) always returns a row").get(0)?;

        if current as u32 >= max_allowed {
            return Err(DbError::CapacityExceeded { entity: "known_accounts", current: current as u32, max: max_allowed });
        }

        let account = KnownAccount {
            id: Uuid::new_v4(),
            contributor_id,
            platform: platform.map(str::to_string),
            handle: handle.map(str::to_string),
            domain: domain.map(str::to_string),
        };
        self.connection
            .execute(
                "INSERT INTO known_accounts (id, contributor_id, platform, handle, domain) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![account.id.to_string(), contributor_id.to_string(), platform, handle, domain],
            )
            .await?;
        Ok(account)
    }

    #[instrument(skip(self))]
    pub async fn known_accounts_for(&self, contributor_id: Uuid) -> Result<Vec<KnownAccount>, DbError> {
        let mut rows = self
            .connection
            .query(
                "SELECT id, contributor_id, platform, handle, domain FROM known_accounts WHERE contributor_id = ?1",
                params![contributor_id.to_string()],
            )
            .await?;

        let mut accounts = Vec::new();
        while let Some(row) = rows.next().await? {
            let id: String = row.get(0)?;
            let contributor_id: String = row.get(1)?;
            accounts.push(KnownAccount {
                id: parse_uuid(&id)?,
                contributor_id: parse_uuid(&contributor_id)?,
                platform: row.get(2)?,
                handle: row.get(3)?,
                domain: row.get(4)?,
            });
        }
        Ok(accounts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::TursoClient;

    async fn repository() -> ContributorRepository {
        let client = TursoClient::connect(":memory:", None).await.expect("in-memory connect");
        ContributorRepository::new(client.get_connection().expect("connection"))
    }

    async fn seed_contributor(contributor: &ContributorRepository, tier: &str) -> Uuid {
        let id = Uuid::new_v4();
        contributor
            .connection
            .execute(
                "INSERT INTO contributors (id, display_name, tier) VALUES (?1, ?2, ?3)",
                params![id.to_string(), "seed", tier],
            )
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn matching_registry_excludes_free_tier_secondary_embeddings() {
        let contributors = repository().await;
        let free_contributor = seed_contributor(&contributors, "free").await;
        let premium_contributor = seed_contributor(&contributors, "premium").await;

        contributors.insert_embedding(free_contributor, &[1.0, 0.0], true).await.unwrap();
        contributors.insert_embedding(free_contributor, &[0.0, 1.0], false).await.unwrap();
        contributors.insert_embedding(premium_contributor, &[1.0, 0.0], true).await.unwrap();
        contributors.insert_embedding(premium_contributor, &[0.0, 1.0], false).await.unwrap();

        let registry = contributors.matching_registry().await.unwrap();

        let free_embeddings: Vec<_> = registry.iter().filter(|e| e.contributor_id == free_contributor).collect();
        let premium_embeddings: Vec<_> = registry.iter().filter(|e| e.contributor_id == premium_contributor).collect();

        assert_eq!(free_embeddings.len(), 1);
        assert!(free_embeddings[0].primary);
        assert_eq!(premium_embeddings.len(), 2);
    }

    #[tokio::test]
    async fn insert_known_account_rejects_once_the_tier_cap_is_reached() {
        let contributors = repository().await;
        let contributor_id = seed_contributor(&contributors, "free").await;

        contributors.insert_known_account(contributor_id, Some("instagram"), Some("a"), None, 2).await.unwrap();
        contributors.insert_known_account(contributor_id, Some("instagram"), Some("b"), None, 2).await.unwrap();

        let rejected = contributors.insert_known_account(contributor_id, Some("instagram"), Some("c"), None, 2).await;
        assert!(matches!(rejected, Err(DbError::CapacityExceeded { current: 2, max: 2, .. })));

        let accounts = contributors.known_accounts_for(contributor_id).await.unwrap();
        assert_eq!(accounts.len(), 2);
    }
}

fn map_row_to_embedding(row: &libsql::Row) -> Result<Embedding, DbError> {
    let id: String = row.get(0)?;
    let contributor_id: String = row.get(1)?;
    let vector_json: String = row.get(2)?;
    let is_primary: i64 = row.get(3)?;
    let created_at: String = row.get(4)?;

    let vector: Vec<f32> = serde_json::from_str(&vector_json)
        .map_err(|e| DbError::MappingError(format!("embedding vector deserialization failed: {}", e)))?;

    Ok(Embedding {
        id: parse_uuid(&id)?,
        contributor_id: parse_uuid(&contributor_id)?,
        vector,
        primary: is_primary != 0,
        created_at: parse_timestamp(&created_at)?,
    })
}
