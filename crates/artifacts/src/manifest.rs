//! Nameserver manifest generation: the file the authoritative server reads
//! to learn which zones exist and where their zone files live.

use std::fmt::Write as _;

use packetframe_store::Zone;

/// Render the manifest stanza set for the given zones.
///
/// Each zone gets its own `zone:` stanza referencing the shared `default`
/// template, and the file path convention used by [`crate::zonefile`].
pub fn build_manifest(zones: &[Zone]) -> String {
    let mut out = String::new();
    writeln!(out, "template:").unwrap();
    writeln!(out, "  - id: default").unwrap();
    writeln!(out).unwrap();
    writeln!(out, "zone:").unwrap();

    let mut sorted: Vec<&Zone> = zones.iter().collect();
    sorted.sort_by(|a, b| a.fqdn.cmp(&b.fqdn));

    for zone in sorted {
        let fqdn = zone.fqdn.trim_end_matches('.');
        writeln!(out, "  - domain: {fqdn}").unwrap();
        writeln!(out, "    template: default").unwrap();
        writeln!(out, "    file: db.{fqdn}").unwrap();
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use packetframe_store::{DnssecKey, ZoneId};

    fn zone(fqdn: &str) -> Zone {
        Zone {
            id: ZoneId::new(),
            fqdn: fqdn.into(),
            serial: 1,
            dnssec: DnssecKey::default(),
            users: vec![],
            user_emails: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn lists_each_zone_sorted_by_fqdn() {
        let zones = [zone("b.com."), zone("a.com.")];
        let text = build_manifest(&zones);
        let a_pos = text.find("a.com").unwrap();
        let b_pos = text.find("b.com").unwrap();
        assert!(a_pos < b_pos);
        assert!(text.contains("file: db.a.com"));
    }

    #[test]
    fn empty_zone_list_still_emits_template() {
        let text = build_manifest(&[]);
        assert!(text.contains("template:"));
        assert!(text.contains("zone:"));
    }
}
