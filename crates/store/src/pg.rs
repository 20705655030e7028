//! The production [`Store`] implementation, backed by PostgreSQL.
//!
//! The schema DDL lives in the (out of scope) deployment repository; this
//! module only depends on table/column names, mirroring the original
//! service's `gorm`-mapped tables (`users`, `zones`, `records`,
//! `credentials`).

use chrono::Utc;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::models::{Credential, DnssecKey, Record, RecordId, RecordType, User, UserId, Zone, ZoneId};
use crate::Store;

/// A [`Store`] backed by a Postgres connection pool.
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self { pool })
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend<E: std::fmt::Display>(e: E) -> StoreError {
    StoreError::Backend(e.to_string())
}

fn record_type_from_str(s: &str) -> StoreResult<RecordType> {
    Ok(match s {
        "A" => RecordType::A,
        "AAAA" => RecordType::Aaaa,
        "CNAME" => RecordType::Cname,
        "TXT" => RecordType::Txt,
        "MX" => RecordType::Mx,
        "SRV" => RecordType::Srv,
        "NS" => RecordType::Ns,
        "SCRIPT" => RecordType::Script,
        other => return Err(StoreError::InvalidRecord(format!("unknown record type {other}"))),
    })
}

fn row_to_record(row: &sqlx::postgres::PgRow) -> StoreResult<Record> {
    Ok(Record {
        id: RecordId(row.try_get::<Uuid, _>("id").map_err(backend)?),
        zone_id: ZoneId(row.try_get::<Uuid, _>("zone_id").map_err(backend)?),
        kind: record_type_from_str(&row.try_get::<String, _>("type").map_err(backend)?)?,
        label: row.try_get("label").map_err(backend)?,
        value: row.try_get("value").map_err(backend)?,
        ttl: row.try_get::<i32, _>("ttl").map_err(backend)? as u32,
        proxy: row.try_get("proxy").map_err(backend)?,
        created_at: row.try_get("created_at").map_err(backend)?,
        updated_at: row.try_get("updated_at").map_err(backend)?,
    })
}

fn row_to_zone(row: &sqlx::postgres::PgRow) -> StoreResult<Zone> {
    let users: Vec<Uuid> = row.try_get("users").map_err(backend)?;
    let user_emails: Vec<String> = row.try_get("user_emails").map_err(backend)?;
    Ok(Zone {
        id: ZoneId(row.try_get::<Uuid, _>("id").map_err(backend)?),
        fqdn: row.try_get("fqdn").map_err(backend)?,
        serial: row.try_get::<i64, _>("serial").map_err(backend)? as u32,
        dnssec: DnssecKey {
            base: row.try_get("dnssec_base").map_err(backend)?,
            public_key: row.try_get("dnssec_key").map_err(backend)?,
            private_key: row.try_get("dnssec_private").map_err(backend)?,
            ds_key_tag: row.try_get::<i32, _>("dnssec_ds_key_tag").map_err(backend)? as u16,
            ds_algorithm: row.try_get::<i32, _>("dnssec_ds_algo").map_err(backend)? as u8,
            ds_digest_type: row.try_get::<i32, _>("dnssec_ds_digest_type").map_err(backend)? as u8,
            ds_digest: row.try_get("dnssec_ds_digest").map_err(backend)?,
            ds_record: row.try_get("dnssec_ds_record").map_err(backend)?,
        },
        users: users.into_iter().map(UserId).collect(),
        user_emails,
        created_at: row.try_get("created_at").map_err(backend)?,
        updated_at: row.try_get("updated_at").map_err(backend)?,
    })
}

fn row_to_user(row: &sqlx::postgres::PgRow) -> StoreResult<User> {
    Ok(User {
        id: UserId(row.try_get::<Uuid, _>("id").map_err(backend)?),
        email: row.try_get("email").map_err(backend)?,
        password_hash: row.try_get("password_hash").map_err(backend)?,
        api_key: row.try_get("api_key").map_err(backend)?,
        session_token: row.try_get("session_token").map_err(backend)?,
        groups: row.try_get("groups").map_err(backend)?,
        refer: row.try_get("refer").map_err(backend)?,
        password_reset_token: row.try_get("password_reset_token").map_err(backend)?,
        password_reset_token_created_at: row.try_get("password_reset_token_created_at").map_err(backend)?,
        created_at: row.try_get("created_at").map_err(backend)?,
        updated_at: row.try_get("updated_at").map_err(backend)?,
    })
}

fn row_to_credential(row: &sqlx::postgres::PgRow) -> StoreResult<Credential> {
    Ok(Credential {
        fqdn: row.try_get("fqdn").map_err(backend)?,
        certificate_pem: row.try_get("certificate_pem").map_err(backend)?,
        private_key_pem: row.try_get("private_key_pem").map_err(backend)?,
        created_at: row.try_get("created_at").map_err(backend)?,
        updated_at: row.try_get("updated_at").map_err(backend)?,
    })
}

impl Store for PgStore {
    async fn list_zones(&self) -> StoreResult<Vec<Zone>> {
        let rows = sqlx::query("SELECT * FROM zones ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(row_to_zone).collect()
    }

    async fn find_zone_by_fqdn(&self, fqdn: &str) -> StoreResult<Option<Zone>> {
        let row = sqlx::query("SELECT * FROM zones WHERE fqdn = $1")
            .bind(fqdn)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(row_to_zone).transpose()
    }

    async fn find_zone(&self, id: ZoneId) -> StoreResult<Option<Zone>> {
        let row = sqlx::query("SELECT * FROM zones WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(row_to_zone).transpose()
    }

    async fn create_zone(&self, fqdn: &str, owner: UserId) -> StoreResult<Zone> {
        let email: Option<String> = sqlx::query_scalar("SELECT email FROM users WHERE id = $1")
            .bind(owner.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        let email = email.ok_or(StoreError::UserNotFound)?;

        let row = sqlx::query(
            "INSERT INTO zones (id, fqdn, serial, users, user_emails, created_at, updated_at)
             VALUES ($1, $2, 0, $3, $4, $5, $5)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(fqdn)
        .bind(vec![owner.0])
        .bind(vec![email])
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::ZoneAlreadyExists,
            other => backend(other),
        })?;
        row_to_zone(&row)
    }

    async fn delete_zone(&self, id: ZoneId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM zones WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::ZoneNotFound);
        }
        Ok(())
    }

    async fn add_zone_user(&self, id: ZoneId, user: UserId) -> StoreResult<()> {
        let zone = self.find_zone(id).await?.ok_or(StoreError::ZoneNotFound)?;
        if zone.users.contains(&user) {
            return Err(StoreError::UserExistingZoneMember);
        }
        let email: Option<String> = sqlx::query_scalar("SELECT email FROM users WHERE id = $1")
            .bind(user.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        let email = email.ok_or(StoreError::UserNotFound)?;

        let mut users: Vec<Uuid> = zone.users.iter().map(|u| u.0).collect();
        users.push(user.0);
        let mut emails = zone.user_emails;
        emails.push(email);

        sqlx::query("UPDATE zones SET users = $1, user_emails = $2, updated_at = $3 WHERE id = $4")
            .bind(users)
            .bind(emails)
            .bind(Utc::now())
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn remove_zone_user(&self, id: ZoneId, user: UserId) -> StoreResult<()> {
        let zone = self.find_zone(id).await?.ok_or(StoreError::ZoneNotFound)?;
        if zone.users.len() == 1 {
            return Err(StoreError::LastZoneUser);
        }
        let Some(pos) = zone.users.iter().position(|&u| u == user) else {
            return Err(StoreError::UserNotFound);
        };
        let mut users = zone.users;
        let mut emails = zone.user_emails;
        users.remove(pos);
        emails.remove(pos);

        sqlx::query("UPDATE zones SET users = $1, user_emails = $2, updated_at = $3 WHERE id = $4")
            .bind(users.into_iter().map(|u| u.0).collect::<Vec<_>>())
            .bind(emails)
            .bind(Utc::now())
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }

    async fn list_records(&self, zone: ZoneId) -> StoreResult<Vec<Record>> {
        let rows = sqlx::query("SELECT * FROM records WHERE zone_id = $1 ORDER BY created_at")
            .bind(zone.0)
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(row_to_record).collect()
    }

    async fn list_script_records(&self) -> StoreResult<Vec<Record>> {
        let rows = sqlx::query("SELECT * FROM records WHERE type = 'SCRIPT' ORDER BY created_at")
            .fetch_all(&self.pool)
            .await
            .map_err(backend)?;
        rows.iter().map(row_to_record).collect()
    }

    async fn create_record(
        &self,
        zone: ZoneId,
        kind: RecordType,
        label: &str,
        value: &str,
        ttl: u32,
        proxy: bool,
    ) -> StoreResult<Record> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let row = sqlx::query(
            "INSERT INTO records (id, zone_id, type, label, value, ttl, proxy, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(zone.0)
        .bind(kind.to_string())
        .bind(label)
        .bind(value)
        .bind(ttl as i32)
        .bind(proxy)
        .bind(Utc::now())
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;

        sqlx::query("UPDATE zones SET serial = serial + 1, updated_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(zone.0)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;

        tx.commit().await.map_err(backend)?;
        row_to_record(&row)
    }

    async fn delete_record(&self, id: RecordId) -> StoreResult<()> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        let zone_id: Option<Uuid> = sqlx::query_scalar("DELETE FROM records WHERE id = $1 RETURNING zone_id")
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await
            .map_err(backend)?;
        let zone_id = zone_id.ok_or(StoreError::RecordNotFound)?;

        sqlx::query("UPDATE zones SET serial = serial + 1, updated_at = $1 WHERE id = $2")
            .bind(Utc::now())
            .bind(zone_id)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn bump_zone_serial(&self, zone: ZoneId) -> StoreResult<u32> {
        let serial: i64 = sqlx::query_scalar(
            "UPDATE zones SET serial = serial + 1, updated_at = $1 WHERE id = $2 RETURNING serial",
        )
        .bind(Utc::now())
        .bind(zone.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?
        .ok_or(StoreError::ZoneNotFound)?;
        Ok(serial as u32)
    }

    async fn list_credentials(&self) -> StoreResult<Vec<Credential>> {
        let rows = sqlx::query("SELECT * FROM credentials").fetch_all(&self.pool).await.map_err(backend)?;
        rows.iter().map(row_to_credential).collect()
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;
        row.as_ref().map(row_to_user).transpose()
    }

    async fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        let row = sqlx::query(
            "INSERT INTO users (id, email, password_hash, groups, created_at, updated_at)
             VALUES ($1, $2, $3, '{}', $4, $4)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::UserAlreadyExists,
            other => backend(other),
        })?;
        row_to_user(&row)
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        let owns_zones: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM zones WHERE $1 = ANY(users))")
            .bind(id.0)
            .fetch_one(&self.pool)
            .await
            .map_err(backend)?;
        if owns_zones {
            return Err(StoreError::UserOwnsZones);
        }
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::UserNotFound);
        }
        Ok(())
    }

    async fn rotate_session_token(&self, id: UserId, token: &str) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET session_token = $1, updated_at = $2 WHERE id = $3")
            .bind(token)
            .bind(Utc::now())
            .bind(id.0)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        if result.rows_affected() == 0 {
            return Err(StoreError::UserNotFound);
        }
        Ok(())
    }
}
