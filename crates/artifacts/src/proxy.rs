//! Reverse-proxy (Caddy-style) configuration generation.

use std::fmt::Write as _;
use std::net::SocketAddr;

/// One proxied domain and the upstream addresses it load-balances across.
pub struct ProxyDomain {
    pub domain: String,
    pub upstreams: Vec<String>,
}

/// The fleet-wide settings a proxy config is rendered against.
pub struct ProxyParams<'a> {
    pub node_label: &'a str,
    pub acme_responder_addr: SocketAddr,
}

/// Render the reverse-proxy configuration for a set of proxied domains.
pub fn build_proxy_config(domains: &[ProxyDomain], params: &ProxyParams) -> String {
    let mut out = String::new();

    for domain in domains {
        writeln!(out, "{} {{", domain.domain).unwrap();
        writeln!(out, "\ttls").unwrap();
        writeln!(out).unwrap();
        writeln!(out, "\t@acme_challenge path /.well-known/acme-challenge/*").unwrap();
        writeln!(out, "\thandle @acme_challenge {{").unwrap();
        writeln!(out, "\t\treverse_proxy {}", params.acme_responder_addr).unwrap();
        writeln!(out, "\t}}").unwrap();
        writeln!(out).unwrap();

        writeln!(out, "\treverse_proxy {{").unwrap();
        for upstream in &domain.upstreams {
            writeln!(out, "\t\tto {}", bracket_literal_ipv6(upstream)).unwrap();
        }
        writeln!(out, "\t\tlb_policy round_robin").unwrap();
        writeln!(out, "\t\theader_up X-Packetframe-PoP {}", params.node_label).unwrap();
        writeln!(out, "\t\theader_up Host {}", domain.domain).unwrap();
        writeln!(out, "\t\ttransport http {{").unwrap();
        writeln!(out, "\t\t\ttls").unwrap();
        writeln!(out, "\t\t\ttls_insecure_skip_verify").unwrap();
        writeln!(out, "\t\t\ttls_server_name {}", domain.domain).unwrap();
        writeln!(out, "\t\t\tdial_timeout 5s").unwrap();
        writeln!(out, "\t\t\tresponse_header_timeout 30s").unwrap();
        writeln!(out, "\t\t}}").unwrap();
        writeln!(out, "\t}}").unwrap();
        writeln!(out, "}}").unwrap();
        writeln!(out).unwrap();
    }

    out
}

/// Caddy requires bare IPv6 literals to be bracketed in upstream addresses;
/// IPv4 literals and hostnames pass through untouched.
fn bracket_literal_ipv6(upstream: &str) -> String {
    if upstream.parse::<std::net::Ipv6Addr>().is_ok() {
        format!("[{upstream}]")
    } else {
        upstream.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ProxyParams<'static> {
        ProxyParams {
            node_label: "ams1",
            acme_responder_addr: "127.0.0.1:8079".parse().unwrap(),
        }
    }

    #[test]
    fn brackets_ipv6_upstreams() {
        let domains = [ProxyDomain {
            domain: "example.com".into(),
            upstreams: vec!["2001:db8::1".into(), "203.0.113.5".into()],
        }];
        let text = build_proxy_config(&domains, &params());
        assert!(text.contains("to [2001:db8::1]"));
        assert!(text.contains("to 203.0.113.5"));
    }

    #[test]
    fn emits_acme_challenge_route_and_transport_settings() {
        let domains = [ProxyDomain {
            domain: "example.com".into(),
            upstreams: vec!["203.0.113.5".into()],
        }];
        let text = build_proxy_config(&domains, &params());
        assert!(text.contains("/.well-known/acme-challenge/*"));
        assert!(text.contains("lb_policy round_robin"));
        assert!(text.contains("header_up X-Packetframe-PoP ams1"));
        assert!(text.contains("tls_insecure_skip_verify"));
        assert!(text.contains("dial_timeout 5s"));
        assert!(text.contains("response_header_timeout 30s"));
    }
}
