//! The authoritative data model: users, zones, records, and credentials.
//!
//! The relational schema itself is out of scope for this workspace; what's
//! here is the contract the orchestrator and edge agent consume ([`Store`]),
//! a Postgres-backed implementation ([`PgStore`]), and an in-memory
//! implementation ([`memory::MemoryStore`]) used throughout this workspace's
//! tests so the core logic is testable without a live database.

pub mod auth;
pub mod error;
pub mod memory;
pub mod models;
pub mod pg;
pub mod suffix;

pub use error::{StoreError, StoreResult};
pub use models::{Credential, DnssecKey, Record, RecordId, RecordType, User, UserId, Zone, ZoneId};
pub use pg::PgStore;

/// The operations the orchestrator, edge agent, and (out of scope) API
/// server perform against the authoritative store.
///
/// Implemented by [`memory::MemoryStore`] for tests and by [`PgStore`] for
/// production. Packetframe's services are generic over `S: Store` rather
/// than reaching for a trait object, since each process picks exactly one
/// backend at startup.
pub trait Store: Send + Sync {
    /// All zones currently configured, in creation order.
    fn list_zones(&self) -> impl Future<Output = StoreResult<Vec<Zone>>> + Send;

    fn find_zone_by_fqdn(&self, fqdn: &str) -> impl Future<Output = StoreResult<Option<Zone>>> + Send;

    fn find_zone(&self, id: ZoneId) -> impl Future<Output = StoreResult<Option<Zone>>> + Send;

    fn create_zone(&self, fqdn: &str, owner: UserId) -> impl Future<Output = StoreResult<Zone>> + Send;

    fn delete_zone(&self, id: ZoneId) -> impl Future<Output = StoreResult<()>> + Send;

    fn add_zone_user(&self, id: ZoneId, user: UserId) -> impl Future<Output = StoreResult<()>> + Send;

    fn remove_zone_user(&self, id: ZoneId, user: UserId) -> impl Future<Output = StoreResult<()>> + Send;

    /// All records in a zone, ordered by creation time (zone-file builders
    /// depend on this ordering for deterministic output).
    fn list_records(&self, zone: ZoneId) -> impl Future<Output = StoreResult<Vec<Record>>> + Send;

    /// All records of type `SCRIPT`, across every zone, for the script-DNS
    /// runtime's refresh loop.
    fn list_script_records(&self) -> impl Future<Output = StoreResult<Vec<Record>>> + Send;

    fn create_record(
        &self,
        zone: ZoneId,
        kind: RecordType,
        label: &str,
        value: &str,
        ttl: u32,
        proxy: bool,
    ) -> impl Future<Output = StoreResult<Record>> + Send;

    fn delete_record(&self, id: RecordId) -> impl Future<Output = StoreResult<()>> + Send;

    /// Bump a zone's serial; called by every record mutation.
    fn bump_zone_serial(&self, zone: ZoneId) -> impl Future<Output = StoreResult<u32>> + Send;

    fn list_credentials(&self) -> impl Future<Output = StoreResult<Vec<Credential>>> + Send;

    fn find_user_by_email(&self, email: &str) -> impl Future<Output = StoreResult<Option<User>>> + Send;

    fn find_user(&self, id: UserId) -> impl Future<Output = StoreResult<Option<User>>> + Send;

    fn create_user(&self, email: &str, password_hash: &str) -> impl Future<Output = StoreResult<User>> + Send;

    fn delete_user(&self, id: UserId) -> impl Future<Output = StoreResult<()>> + Send;

    fn rotate_session_token(&self, id: UserId, token: &str) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Either backend, chosen once at process startup from [`crate::pg::PgStore`]
/// (when a database URL is configured) or [`memory::MemoryStore`] (otherwise,
/// e.g. in tests or a `--db-url`-less demo run).
///
/// `Store`'s methods return `impl Future`, which isn't object-safe, so this
/// enum - rather than `Box<dyn Store>` - is what lets the orchestrator and
/// edge agent stay generic over "a store" without picking the backend at
/// compile time.
pub enum AnyStore {
    Memory(memory::MemoryStore),
    Pg(PgStore),
}

macro_rules! delegate {
    ($self:ident . $method:ident ( $($arg:ident),* )) => {
        match $self {
            AnyStore::Memory(s) => s.$method($($arg),*).await,
            AnyStore::Pg(s) => s.$method($($arg),*).await,
        }
    };
}

impl Store for AnyStore {
    async fn list_zones(&self) -> StoreResult<Vec<Zone>> {
        delegate!(self.list_zones())
    }

    async fn find_zone_by_fqdn(&self, fqdn: &str) -> StoreResult<Option<Zone>> {
        delegate!(self.find_zone_by_fqdn(fqdn))
    }

    async fn find_zone(&self, id: ZoneId) -> StoreResult<Option<Zone>> {
        delegate!(self.find_zone(id))
    }

    async fn create_zone(&self, fqdn: &str, owner: UserId) -> StoreResult<Zone> {
        delegate!(self.create_zone(fqdn, owner))
    }

    async fn delete_zone(&self, id: ZoneId) -> StoreResult<()> {
        delegate!(self.delete_zone(id))
    }

    async fn add_zone_user(&self, id: ZoneId, user: UserId) -> StoreResult<()> {
        delegate!(self.add_zone_user(id, user))
    }

    async fn remove_zone_user(&self, id: ZoneId, user: UserId) -> StoreResult<()> {
        delegate!(self.remove_zone_user(id, user))
    }

    async fn list_records(&self, zone: ZoneId) -> StoreResult<Vec<Record>> {
        delegate!(self.list_records(zone))
    }

    async fn list_script_records(&self) -> StoreResult<Vec<Record>> {
        delegate!(self.list_script_records())
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
        delegate!(self.create_record(zone, kind, label, value, ttl, proxy))
    }

    async fn delete_record(&self, id: RecordId) -> StoreResult<()> {
        delegate!(self.delete_record(id))
    }

    async fn bump_zone_serial(&self, zone: ZoneId) -> StoreResult<u32> {
        delegate!(self.bump_zone_serial(zone))
    }

    async fn list_credentials(&self) -> StoreResult<Vec<Credential>> {
        delegate!(self.list_credentials())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        delegate!(self.find_user_by_email(email))
    }

    async fn find_user(&self, id: UserId) -> StoreResult<Option<User>> {
        delegate!(self.find_user(id))
    }

    async fn create_user(&self, email: &str, password_hash: &str) -> StoreResult<User> {
        delegate!(self.create_user(email, password_hash))
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        delegate!(self.delete_user(id))
    }

    async fn rotate_session_token(&self, id: UserId, token: &str) -> StoreResult<()> {
        delegate!(self.rotate_session_token(id, token))
    }
}
