// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use anyhow::bail;
use anyhow::Context;
use anyhow::Result;
use serde::Deserialize;
use serde::Serialize;
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RpcProtocol {
    Http,
    Https,
    Ws,
    Wss,
}

impl RpcProtocol {
    pub fn is_websocket(&self) -> bool {
        matches!(self, RpcProtocol::Ws | RpcProtocol::Wss)
    }
}

/// A ledger RPC endpoint that has been checked to carry a supported scheme and a host.
#[derive(Clone, Debug)]
pub struct RPC {
    protocol: RpcProtocol,
    url: Url,
}

impl RPC {
    pub fn from_url(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).context("Invalid URL format")?;
        let protocol = match parsed.scheme() {
            "http" => RpcProtocol::Http,
            "https" => RpcProtocol::Https,
            "ws" => RpcProtocol::Ws,
            "wss" => RpcProtocol::Wss,
            _ => bail!("Invalid protocol. Expected: http://, https://, ws://, wss://"),
        };

        if parsed.host_str().is_none() {
            bail!("URL must contain a host");
        }

        Ok(RPC {
            protocol,
            url: parsed,
        })
    }

    pub fn protocol(&self) -> RpcProtocol {
        self.protocol
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn is_websocket(&self) -> bool {
        self.protocol.is_websocket()
    }
}

/// Relayer endpoints are plain HTTP(S).
pub fn parse_relayer_url(url: &str) -> Result<Url> {
    if url.trim().is_empty() {
        bail!("relayer url is empty");
    }
    let parsed = Url::parse(url).with_context(|| format!("Invalid relayer url '{url}'"))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        bail!("relayer url '{url}' must use http:// or https://");
    }
    if parsed.host_str().is_none() {
        bail!("relayer url '{url}' must contain a host");
    }
    Ok(parsed)
}

#[derive(Debug, Hash, Eq, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(tag = "type", content = "credentials")]
pub enum RpcAuth {
    #[default]
    None,
    Basic {
        username: String,
        password: String,
    },
    Bearer(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_accepts_known_schemes_only() -> Result<()> {
        assert_eq!(RPC::from_url("http://localhost:8545")?.protocol(), RpcProtocol::Http);
        assert!(RPC::from_url("wss://node.example/ws")?.is_websocket());
        assert!(RPC::from_url("ftp://node.example").is_err());
        assert!(RPC::from_url("not a url").is_err());
        Ok(())
    }

    #[test]
    fn relayer_url_must_be_http() {
        assert!(parse_relayer_url("https://relayer.example").is_ok());
        assert!(parse_relayer_url("").is_err());
        assert!(parse_relayer_url("ws://relayer.example").is_err());
        assert!(parse_relayer_url("relayer.example").is_err());
    }
}
