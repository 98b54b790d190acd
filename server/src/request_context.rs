use crate::user_agent::ClientInfo;
use actix_web::{http::header, HttpRequest};
use std::net::{IpAddr, SocketAddr};

const MAX_LANGUAGE_LEN: usize = 10;
const MAX_USER_AGENT_LEN: usize = 512;

/// Request metadata captured alongside every stored answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub source_address: String,
    pub user_agent: String,
    pub client: ClientInfo,
    pub language: Option<String>,
}

impl RequestContext {
    /// Forwarding headers are client controlled and only honoured when `trust_forwarded` is set
    pub fn from_request(req: &HttpRequest, trust_forwarded: bool) -> Self {
        let forwarded = if trust_forwarded {
            req.connection_info().realip_remote_addr().map(strip_port)
        } else {
            None
        };
        let source_address = forwarded
            .or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()))
            .unwrap_or_else(|| "unknown".to_string());

        let user_agent = req
            .headers()
            .get(header::USER_AGENT)
            .and_then(|h| h.to_str().ok());

        let accept_language = req
            .headers()
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|h| h.to_str().ok());

        Self {
            source_address,
            user_agent: user_agent
                .unwrap_or_default()
                .chars()
                .take(MAX_USER_AGENT_LEN)
                .collect(),
            client: ClientInfo::from_user_agent(user_agent),
            language: preferred_language(accept_language),
        }
    }
}

/// `10.0.0.1:5555` and `[::1]:80` become bare addresses; anything unparseable is kept as is
pub fn strip_port(addr: &str) -> String {
    if let Ok(socket) = addr.parse::<SocketAddr>() {
        return socket.ip().to_string();
    }
    if let Ok(ip) = addr.parse::<IpAddr>() {
        return ip.to_string();
    }
    addr.to_string()
}

/// First tag of an `Accept-Language` header, quality values ignored
pub fn preferred_language(header: Option<&str>) -> Option<String> {
    let first = header?.split(',').next()?.split(';').next()?.trim();
    if first.is_empty() || first == "*" {
        return None;
    }
    Some(first.chars().take(MAX_LANGUAGE_LEN).collect())
}
