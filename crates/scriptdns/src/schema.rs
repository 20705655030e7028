//! The JSON shape exchanged with `handleQuery`.

use serde::{Deserialize, Serialize};

/// The DNS question handed to a script's `handleQuery(q)` entry point.
#[derive(Clone, Debug, Default, Serialize)]
pub struct Question {
    pub name: String,
    #[serde(rename = "type")]
    pub qtype: String,
    /// The EDNS Cookie option value, if the client sent one, hex-encoded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cookie: Option<String>,
    /// The EDNS Client Subnet address, if present, as a bare IP literal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subnet: Option<String>,
}

/// The value a script's `handleQuery` promise must resolve to.
#[derive(Clone, Debug, Deserialize)]
pub struct ScriptAnswer {
    #[serde(default)]
    pub authoritative: bool,
    #[serde(default)]
    pub rrs: Vec<AnswerRr>,
}

/// One resource record returned by a script.
#[derive(Clone, Debug, Deserialize)]
pub struct AnswerRr {
    pub name: String,
    pub ttl: u32,
    #[serde(rename = "type")]
    pub rtype: String,
    pub value: String,
}
