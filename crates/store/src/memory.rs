//! An in-memory [`Store`] used by this workspace's tests.

use std::sync::Mutex;

use chrono::Utc;
use foldhash::HashMap;

use crate::error::{StoreError, StoreResult};
use crate::models::{Credential, DnssecKey, Record, RecordId, RecordType, User, UserId, Zone, ZoneId};
use crate::Store;

/// A [`Store`] backed by in-process hash maps, guarded by a single mutex.
///
/// Mirrors the shape of `packetframe-orchestrator`'s own queue state (one
/// writer at a time, no partial views) so tests exercise the same
/// concurrency discipline production code relies on.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    zones: HashMap<ZoneId, Zone>,
    /// Insertion order, since zone-file generation must be deterministic.
    records: Vec<Record>,
    credentials: HashMap<String, Credential>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    async fn list_zones(&self) -> StoreResult<Vec<Zone>> {
        let inner = self.inner.lock().unwrap();
        let mut zones: Vec<_> = inner.zones.values().cloned().collect();
        zones.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(zones)
    }

    async fn find_zone_by_fqdn(&self, fqdn: &str) -> StoreResult<Option<Zone>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.zones.values().find(|z| z.fqdn == fqdn).cloned())
    }

    async fn find_zone(&self, id: ZoneId) -> StoreResult<Option<Zone>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.zones.get(&id).cloned())
    }

    async fn create_zone(&self, fqdn: &str, owner: UserId) -> StoreResult<Zone> {
        let mut inner = self.inner.lock().unwrap();
        if inner.zones.values().any(|z| z.fqdn == fqdn) {
            return Err(StoreError::ZoneAlreadyExists);
        }
        let owner_email = inner
            .users
            .get(&owner)
            .map(|u| u.email.clone())
            .ok_or(StoreError::UserNotFound)?;

        let now = Utc::now();
        let zone = Zone {
            id: ZoneId::new(),
            fqdn: fqdn.to_string(),
            serial: 0,
            dnssec: DnssecKey::default(),
            users: vec![owner],
            user_emails: vec![owner_email],
            created_at: now,
            updated_at: now,
        };
        inner.zones.insert(zone.id, zone.clone());
        Ok(zone)
    }

    async fn delete_zone(&self, id: ZoneId) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        inner.zones.remove(&id).ok_or(StoreError::ZoneNotFound)?;
        inner.records.retain(|r| r.zone_id != id);
        Ok(())
    }

    async fn add_zone_user(&self, id: ZoneId, user: UserId) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let email = inner.users.get(&user).map(|u| u.email.clone()).ok_or(StoreError::UserNotFound)?;
        let zone = inner.zones.get_mut(&id).ok_or(StoreError::ZoneNotFound)?;
        if zone.users.contains(&user) {
            return Err(StoreError::UserExistingZoneMember);
        }
        zone.users.push(user);
        zone.user_emails.push(email);
        Ok(())
    }

    async fn remove_zone_user(&self, id: ZoneId, user: UserId) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let zone = inner.zones.get_mut(&id).ok_or(StoreError::ZoneNotFound)?;
        if zone.users.len() == 1 {
            return Err(StoreError::LastZoneUser);
        }
        let Some(pos) = zone.users.iter().position(|&u| u == user) else {
            return Err(StoreError::UserNotFound);
        };
        zone.users.remove(pos);
        zone.user_emails.remove(pos);
        Ok(())
    }

    async fn list_records(&self, zone: ZoneId) -> StoreResult<Vec<Record>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.records.iter().filter(|r| r.zone_id == zone).cloned().collect())
    }

    async fn list_script_records(&self) -> StoreResult<Vec<Record>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .records
            .iter()
            .filter(|r| r.kind == RecordType::Script)
            .cloned()
            .collect())
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
        let mut inner = self.inner.lock().unwrap();
        if !inner.zones.contains_key(&zone) {
            return Err(StoreError::ZoneNotFound);
        }
        let now = Utc::now();
        let record = Record {
            id: RecordId::new(),
            zone_id: zone,
            kind,
            label: label.to_string(),
            value: value.to_string(),
            ttl,
            proxy,
            created_at: now,
            updated_at: now,
        };
        inner.records.push(record.clone());
        if let Some(z) = inner.zones.get_mut(&zone) {
            z.serial += 1;
            z.updated_at = now;
        }
        Ok(record)
    }

    async fn delete_record(&self, id: RecordId) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let Some(pos) = inner.records.iter().position(|r| r.id == id) else {
            return Err(StoreError::RecordNotFound);
        };
        let zone_id = inner.records[pos].zone_id;
        inner.records.remove(pos);
        if let Some(z) = inner.zones.get_mut(&zone_id) {
            z.serial += 1;
            z.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn bump_zone_serial(&self, zone: ZoneId) -> StoreResult<u32> {
        let mut inner = self.inner.lock().unwrap();
        let z = inner.zones.get_mut(&zone).ok_or(StoreError::ZoneNotFound)?;
        z.serial += 1;
        Ok(z.serial)
    }

    async fn list_credentials(&self) -> StoreResult<Vec<Credential>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.credentials.values().cloned().collect())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner.users.get(&id).cloned())
    }

    async fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        let mut inner = self.inner.lock().unwrap();
        if inner.users.values().any(|u| u.email == email) {
            return Err(StoreError::UserAlreadyExists);
        }
        let now = Utc::now();
        let user = User {
            id: UserId::new(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            api_key: None,
            session_token: None,
            groups: Vec::new(),
            refer: None,
            password_reset_token: None,
            password_reset_token_created_at: None,
            created_at: now,
            updated_at: now,
        };
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.zones.values().any(|z| z.users.contains(&id)) {
            return Err(StoreError::UserOwnsZones);
        }
        inner.users.remove(&id).ok_or(StoreError::UserNotFound)?;
        Ok(())
    }

    async fn rotate_session_token(&self, id: UserId, token: &str) -> StoreResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let user = inner.users.get_mut(&id).ok_or(StoreError::UserNotFound)?;
        user.session_token = Some(token.to_string());
        Ok(())
    }
}

impl MemoryStore {
    /// Test-only helper: insert a user directly.
    #[doc(hidden)]
    pub fn seed_user(&self, user: User) {
        self.inner.lock().unwrap().users.insert(user.id, user);
    }

    #[doc(hidden)]
    pub fn seed_credential(&self, cred: Credential) {
        self.inner.lock().unwrap().credentials.insert(cred.fqdn.clone(), cred);
    }

    #[doc(hidden)]
    pub fn clear_credentials(&self) {
        self.inner.lock().unwrap().credentials.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> (MemoryStore, UserId) {
        let store = MemoryStore::new();
        let user = User {
            id: UserId::new(),
            email: "alice@example.com".into(),
            password_hash: String::new(),
            api_key: None,
            session_token: None,
            groups: vec!["admin".into()],
            refer: None,
            password_reset_token: None,
            password_reset_token_created_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let id = user.id;
        store.seed_user(user);
        (store, id)
    }

    #[tokio::test]
    async fn record_add_bumps_serial() {
        let (store, user) = seeded_store();
        let zone = store.create_zone("example.com.", user).await.unwrap();
        assert_eq!(zone.serial, 0);

        store
            .create_record(zone.id, RecordType::A, "@", "192.0.2.1", 300, false)
            .await
            .unwrap();

        let zone = store.find_zone(zone.id).await.unwrap().unwrap();
        assert_eq!(zone.serial, 1);
    }

    #[tokio::test]
    async fn last_zone_user_cannot_be_removed() {
        let (store, user) = seeded_store();
        let zone = store.create_zone("example.com.", user).await.unwrap();
        let err = store.remove_zone_user(zone.id, user).await.unwrap_err();
        assert!(matches!(err, StoreError::LastZoneUser));
    }

    #[tokio::test]
    async fn user_with_zones_cannot_be_deleted() {
        let (store, user) = seeded_store();
        store.create_zone("example.com.", user).await.unwrap();
        let err = store.delete_user(user).await.unwrap_err();
        assert!(matches!(err, StoreError::UserOwnsZones));
    }

    #[tokio::test]
    async fn duplicate_zone_is_rejected() {
        let (store, user) = seeded_store();
        store.create_zone("example.com.", user).await.unwrap();
        let err = store.create_zone("example.com.", user).await.unwrap_err();
        assert!(matches!(err, StoreError::ZoneAlreadyExists));
    }
}
