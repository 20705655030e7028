//! Builders for the artifacts the orchestrator and edge agent deploy:
//! per-zone BIND-style zone files, the nameserver manifest, and the
//! reverse-proxy configuration, plus the shared write-on-diff disk writer.

pub mod diskwrite;
pub mod manifest;
pub mod proxy;
pub mod zonefile;

pub use diskwrite::write_if_diff;
pub use manifest::build_manifest;
pub use proxy::{build_proxy_config, ProxyParams};
pub use zonefile::{build_zone_file, zone_file_name, ZoneFileParams};
