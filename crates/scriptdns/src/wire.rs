//! Turning a script's `{name, ttl, type, value}` answers into DNS
//! wire-format resource records.

use std::net::{Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use domain::base::{Name, Ttl};
use domain::rdata::{Aaaa, Cname, Mx, Ns, Srv, Txt, A};

use crate::error::ScriptError;
use crate::schema::AnswerRr;

/// A typed resource record ready to be pushed into a DNS answer section.
///
/// [`domain`]'s record data types don't share an object-safe trait, so
/// scripted answers (whose type is only known at runtime, from the `type`
/// field in the script's JSON response) are lifted into this enum instead.
pub enum WireRecord {
    A(Name<Vec<u8>>, Ttl, A),
    Aaaa(Name<Vec<u8>>, Ttl, Aaaa),
    Cname(Name<Vec<u8>>, Ttl, Cname<Name<Vec<u8>>>),
    Txt(Name<Vec<u8>>, Ttl, Txt<Vec<u8>>),
    Mx(Name<Vec<u8>>, Ttl, Mx<Name<Vec<u8>>>),
    Srv(Name<Vec<u8>>, Ttl, Srv<Name<Vec<u8>>>),
    Ns(Name<Vec<u8>>, Ttl, Ns<Name<Vec<u8>>>),
}

/// Parse one scripted answer record into its wire-format representation.
///
/// `"<name> <ttl> IN <type> <value>"` is the presentation form every record
/// in this codebase is built from (see `packetframe-artifacts::zonefile`);
/// this is its DNS-message-answer-section counterpart.
pub fn wire_record(rr: &AnswerRr) -> Result<WireRecord, ScriptError> {
    let name = parse_name(&rr.name)?;
    let ttl = Ttl::from_secs(rr.ttl);
    let invalid = |value: &str| ScriptError::InvalidRecordValue {
        rtype: rr.rtype.clone(),
        value: value.to_string(),
    };

    match rr.rtype.to_ascii_uppercase().as_str() {
        "A" => {
            let addr = Ipv4Addr::from_str(&rr.value).map_err(|_| invalid(&rr.value))?;
            Ok(WireRecord::A(name, ttl, A::new(addr)))
        }
        "AAAA" => {
            let addr = Ipv6Addr::from_str(&rr.value).map_err(|_| invalid(&rr.value))?;
            Ok(WireRecord::Aaaa(name, ttl, Aaaa::new(addr)))
        }
        "CNAME" => Ok(WireRecord::Cname(name, ttl, Cname::new(parse_name(&rr.value)?))),
        "TXT" => {
            let txt = Txt::build_from_slice(rr.value.as_bytes()).map_err(|_| invalid(&rr.value))?;
            Ok(WireRecord::Txt(name, ttl, txt))
        }
        "MX" => {
            let (priority, exchange) = rr.value.split_once(' ').ok_or_else(|| invalid(&rr.value))?;
            let priority: u16 = priority.parse().map_err(|_| invalid(&rr.value))?;
            Ok(WireRecord::Mx(name, ttl, Mx::new(priority, parse_name(exchange)?)))
        }
        "SRV" => {
            let mut parts = rr.value.split(' ');
            let (Some(priority), Some(weight), Some(port), Some(target)) =
                (parts.next(), parts.next(), parts.next(), parts.next())
            else {
                return Err(invalid(&rr.value));
            };
            let priority: u16 = priority.parse().map_err(|_| invalid(&rr.value))?;
            let weight: u16 = weight.parse().map_err(|_| invalid(&rr.value))?;
            let port: u16 = port.parse().map_err(|_| invalid(&rr.value))?;
            Ok(WireRecord::Srv(name, ttl, Srv::new(priority, weight, port, parse_name(target)?)))
        }
        "NS" => Ok(WireRecord::Ns(name, ttl, Ns::new(parse_name(&rr.value)?))),
        other => Err(ScriptError::UnsupportedRecordType(other.to_string())),
    }
}

fn parse_name(text: &str) -> Result<Name<Vec<u8>>, ScriptError> {
    Name::from_str(text.trim_end_matches('.')).map_err(|_| ScriptError::InvalidRecordValue {
        rtype: "NAME".into(),
        value: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rr(rtype: &str, value: &str) -> AnswerRr {
        AnswerRr {
            name: "api.example.com".into(),
            ttl: 300,
            rtype: rtype.into(),
            value: value.into(),
        }
    }

    #[test]
    fn parses_a_record() {
        assert!(matches!(wire_record(&rr("A", "203.0.113.5")), Ok(WireRecord::A(..))));
    }

    #[test]
    fn rejects_invalid_address() {
        assert!(wire_record(&rr("A", "not-an-ip")).is_err());
    }

    #[test]
    fn parses_mx_priority_and_exchange() {
        assert!(matches!(wire_record(&rr("MX", "10 mail.example.com")), Ok(WireRecord::Mx(..))));
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(matches!(
            wire_record(&rr("PTR", "example.com")),
            Err(ScriptError::UnsupportedRecordType(_))
        ));
    }
}
