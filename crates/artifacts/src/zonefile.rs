//! BIND-style zone file generation.

use std::fmt::Write as _;

use packetframe_store::{Record, RecordType, Zone};

/// SOA refresh/retry/expire/negative-TTL, and the shared NS TTL.
const SOA_REFRESH: u32 = 7200;
const SOA_RETRY: u32 = 3600;
const SOA_EXPIRE: u32 = 1209600;
const SOA_NEGATIVE_TTL: u32 = 300;
const NS_TTL: u32 = 86400;
const SCRIPT_DELEGATION_TTL: u32 = 3600;

/// The fleet-wide constants a zone file is rendered against.
pub struct ZoneFileParams<'a> {
    pub ns1_host: &'a str,
    pub ns2_host: &'a str,
    pub soa_admin: &'a str,
    pub script_ns_host: &'a str,
    pub proxy_anycast_v4: &'a str,
    pub proxy_anycast_v6: &'a str,
}

/// Render `zone`'s records into a BIND-compatible zone file.
///
/// `records` must be in the zone's creation order for the output to be
/// deterministic across calls with the same input (the builder never
/// reorders them itself).
pub fn build_zone_file(zone: &Zone, records: &[Record], params: &ZoneFileParams) -> String {
    let mut out = String::new();

    writeln!(
        out,
        "@ IN SOA {} {} {} {} {} {} {}",
        params.ns1_host, params.soa_admin, zone.serial, SOA_REFRESH, SOA_RETRY, SOA_EXPIRE, SOA_NEGATIVE_TTL
    )
    .unwrap();
    writeln!(out, "@ {NS_TTL} IN NS {}", params.ns1_host).unwrap();
    writeln!(out, "@ {NS_TTL} IN NS {}", params.ns2_host).unwrap();

    for record in records {
        render_record(&mut out, record, params);
    }

    out
}

fn render_record(out: &mut String, record: &Record, params: &ZoneFileParams) {
    if record.kind == RecordType::Script {
        writeln!(out, "{} {SCRIPT_DELEGATION_TTL} IN NS {}", record.label, params.script_ns_host).unwrap();
        return;
    }

    if record.proxy {
        writeln!(out, "{} {} IN A {}", record.label, record.ttl, params.proxy_anycast_v4).unwrap();
        writeln!(out, "{} {} IN AAAA {}", record.label, record.ttl, params.proxy_anycast_v6).unwrap();
        return;
    }

    writeln!(out, "{} {} IN {} {}", record.label, record.ttl, record.kind, record.value).unwrap();
}

/// The filename (relative to a zones directory) a zone's file is written at.
pub fn zone_file_name(zone: &Zone) -> String {
    format!("db.{}", zone.fqdn.trim_end_matches('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use packetframe_store::{DnssecKey, RecordId, ZoneId};

    fn params() -> ZoneFileParams<'static> {
        ZoneFileParams {
            ns1_host: "ns1.packetframe.com.",
            ns2_host: "ns2.packetframe.com.",
            soa_admin: "info.packetframe.com.",
            script_ns_host: "script-ns.packetframe.com.",
            proxy_anycast_v4: "66.248.234.7",
            proxy_anycast_v6: "2602:809:3004::7",
        }
    }

    fn zone(serial: u32) -> Zone {
        Zone {
            id: ZoneId::new(),
            fqdn: "example.com.".into(),
            serial,
            dnssec: DnssecKey::default(),
            users: vec![],
            user_emails: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn record(kind: RecordType, label: &str, value: &str, proxy: bool) -> Record {
        Record {
            id: RecordId::new(),
            zone_id: ZoneId::new(),
            kind,
            label: label.into(),
            value: value.into(),
            ttl: 300,
            proxy,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn renders_soa_and_ns_lines() {
        let text = build_zone_file(&zone(5), &[], &params());
        assert!(text.starts_with("@ IN SOA ns1.packetframe.com. info.packetframe.com. 5 7200 3600 1209600 300\n"));
        assert!(text.contains("@ 86400 IN NS ns1.packetframe.com.\n"));
        assert!(text.contains("@ 86400 IN NS ns2.packetframe.com.\n"));
    }

    #[test]
    fn proxy_record_expands_to_anycast_a_and_aaaa() {
        let records = [record(RecordType::A, "www", "203.0.113.5", true)];
        let text = build_zone_file(&zone(1), &records, &params());
        assert!(text.contains("www 300 IN A 66.248.234.7\n"));
        assert!(text.contains("www 300 IN AAAA 2602:809:3004::7\n"));
        assert!(!text.contains("203.0.113.5"));
    }

    #[test]
    fn script_record_becomes_ns_delegation() {
        let records = [record(RecordType::Script, "api", "async function handleQuery(q) {}", false)];
        let text = build_zone_file(&zone(1), &records, &params());
        assert!(text.contains("api 3600 IN NS script-ns.packetframe.com.\n"));
    }

    #[test]
    fn identical_input_produces_identical_output() {
        let records = [record(RecordType::Txt, "@", "hello", false)];
        let a = build_zone_file(&zone(3), &records, &params());
        let b = build_zone_file(&zone(3), &records, &params());
        assert_eq!(a, b);
    }
}
