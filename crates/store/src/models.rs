//! Plain data types mirroring the authoritative relational schema.
//!
//! The schema itself (DDL, migrations) lives outside this workspace; these
//! types are the shape the orchestrator and edge agent read and write
//! through the [`crate::Store`] trait.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

id_newtype!(UserId);
id_newtype!(ZoneId);
id_newtype!(RecordId);

/// A registered operator of the service.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub api_key: Option<String>,
    pub session_token: Option<String>,
    pub groups: Vec<String>,
    pub refer: Option<String>,
    pub password_reset_token: Option<String>,
    pub password_reset_token_created_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.groups.iter().any(|g| g == "admin")
    }
}

/// A DNSSEC signing keypair and its published DS record, embedded in a [`Zone`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DnssecKey {
    pub base: String,
    pub public_key: String,
    pub private_key: String,
    pub ds_key_tag: u16,
    pub ds_algorithm: u8,
    pub ds_digest_type: u8,
    pub ds_digest: String,
    pub ds_record: String,
}

/// A zone this service is authoritative for.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    /// Fully-qualified, trailing-dot form, e.g. `"example.com."`.
    pub fqdn: String,
    pub serial: u32,
    pub dnssec: DnssecKey,
    pub users: Vec<UserId>,
    pub user_emails: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The closed set of record types Packetframe understands.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordType {
    A,
    Aaaa,
    Cname,
    Txt,
    Mx,
    Srv,
    Ns,
    Script,
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Txt => "TXT",
            Self::Mx => "MX",
            Self::Srv => "SRV",
            Self::Ns => "NS",
            Self::Script => "SCRIPT",
        };
        f.write_str(s)
    }
}

/// A single record within a [`Zone`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub zone_id: ZoneId,
    #[serde(rename = "type")]
    pub kind: RecordType,
    pub label: String,
    pub value: String,
    pub ttl: u32,
    pub proxy: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A TLS certificate/key pair for a proxied domain, issued out of band.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Credential {
    pub fqdn: String,
    pub certificate_pem: String,
    pub private_key_pem: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
