//! The script-DNS UDP+TCP listener.
//!
//! Each question is matched to a `SCRIPT` record by its first label (the
//! same `label` a zone file renders as an `NS` delegation to this
//! listener), dispatched to the registered isolate, and turned back into a
//! wire-format answer.

use std::future::{ready, Future};
use std::pin::Pin;
use std::sync::Arc;

use domain::base::iana::Rcode;
use domain::base::opt::AllOptData;
use domain::base::Message;
use domain::net::server::buf::VecBufSource;
use domain::net::server::dgram::DgramServer;
use domain::net::server::message::Request;
use domain::net::server::service::{CallResult, Service, ServiceResult};
use domain::net::server::stream::StreamServer;
use domain::net::server::util::mk_builder_for_target;
use packetframe_scriptdns::wire::{wire_record, WireRecord};
use packetframe_scriptdns::Question;
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::center::Center;

pub async fn run(center: Arc<Center>, mut shutdown: oneshot::Receiver<()>) {
    let svc = ScriptDnsService { center: center.clone() };

    let udp = match UdpSocket::bind(center.config.dns_listen).await {
        Ok(sock) => sock,
        Err(err) => {
            tracing::error!(%err, addr = %center.config.dns_listen, "dns: failed to bind UDP socket");
            return;
        }
    };
    let tcp = match TcpListener::bind(center.config.dns_listen).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%err, addr = %center.config.dns_listen, "dns: failed to bind TCP listener");
            return;
        }
    };
    info!(addr = %center.config.dns_listen, "dns: listening");

    let udp_srv = Arc::new(DgramServer::new(udp, VecBufSource, svc.clone()));
    let tcp_srv = Arc::new(StreamServer::new(tcp, VecBufSource, svc));

    tokio::select! {
        _ = udp_srv.run() => {}
        _ = tcp_srv.run() => {}
        _ = &mut shutdown => {
            info!("dns: listener shutting down");
        }
    }
}

#[derive(Clone)]
struct ScriptDnsService {
    center: Arc<Center>,
}

impl Service<Vec<u8>> for ScriptDnsService {
    type Target = Vec<u8>;
    type Stream = Pin<Box<dyn futures_util::Stream<Item = ServiceResult<Vec<u8>>> + Send>>;
    type Future = Pin<Box<dyn Future<Output = Self::Stream> + Send>>;

    fn call(&self, request: Request<Vec<u8>>) -> Self::Future {
        let center = self.center.clone();
        Box::pin(async move {
            let result = answer(&center, &request).await;
            Box::pin(ready(result)) as Self::Stream
        })
    }
}

async fn answer(center: &Arc<Center>, request: &Request<Vec<u8>>) -> ServiceResult<Vec<u8>> {
    let Ok(question) = request.message().sole_question() else {
        let builder = mk_builder_for_target();
        let answer = builder.start_answer(request.message(), Rcode::FORMERR).unwrap();
        return Ok(CallResult::new(answer.additional()));
    };

    let qname = question.qname().to_string();
    let label = first_label(&qname);
    let (cookie, subnet) = edns_cookie_and_subnet(request.message());

    let scripted = Question {
        name: qname.clone(),
        qtype: question.qtype().to_string(),
        cookie,
        subnet,
    };

    let builder = mk_builder_for_target();
    match center.registry.dispatch(&label, &scripted).await {
        None => {
            let answer = builder.start_answer(request.message(), Rcode::NXDOMAIN).unwrap();
            Ok(CallResult::new(answer.additional()))
        }
        Some(Err(err)) => {
            warn!(%err, label, "dns: script handler failed; replying with an empty answer");
            let answer = builder.start_answer(request.message(), Rcode::NOERROR).unwrap();
            Ok(CallResult::new(answer.additional()))
        }
        Some(Ok(resolved)) => {
            let mut answer = builder.start_answer(request.message(), Rcode::NOERROR).unwrap();
            answer.header_mut().set_aa(resolved.authoritative);
            for rr in &resolved.rrs {
                let pushed = match wire_record(rr) {
                    Ok(WireRecord::A(name, ttl, rdata)) => answer.push((name, ttl, rdata)),
                    Ok(WireRecord::Aaaa(name, ttl, rdata)) => answer.push((name, ttl, rdata)),
                    Ok(WireRecord::Cname(name, ttl, rdata)) => answer.push((name, ttl, rdata)),
                    Ok(WireRecord::Txt(name, ttl, rdata)) => answer.push((name, ttl, rdata)),
                    Ok(WireRecord::Mx(name, ttl, rdata)) => answer.push((name, ttl, rdata)),
                    Ok(WireRecord::Srv(name, ttl, rdata)) => answer.push((name, ttl, rdata)),
                    Ok(WireRecord::Ns(name, ttl, rdata)) => answer.push((name, ttl, rdata)),
                    Err(err) => {
                        warn!(%err, label, "dns: dropping malformed record from script answer");
                        continue;
                    }
                };
                if let Err(err) = pushed {
                    warn!(%err, label, "dns: answer section full; dropping record");
                }
            }
            Ok(CallResult::new(answer.additional()))
        }
    }
}

/// Pulls the EDNS Cookie and Client-Subnet options (RFC 7873, RFC 7871) off
/// the query's OPT record, if present, for the script handler to see.
fn edns_cookie_and_subnet(msg: &Message<Vec<u8>>) -> (Option<String>, Option<String>) {
    let mut cookie = None;
    let mut subnet = None;
    let Some(opt) = msg.opt() else {
        return (cookie, subnet);
    };
    for data in opt.iter::<AllOptData<_, _>>().flatten() {
        match data {
            AllOptData::Cookie(c) => cookie = Some(c.to_string()),
            AllOptData::ClientSubnet(cs) => subnet = Some(cs.to_string()),
            _ => {}
        }
    }
    (cookie, subnet)
}

fn first_label(qname: &str) -> String {
    let trimmed = qname.trim_end_matches('.');
    trimmed.split_once('.').map(|(label, _)| label).unwrap_or(trimmed).to_string()
}
