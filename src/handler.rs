//! Server flavour detection from `MCDR_HANDLER`.

use std::convert::Infallible;
use std::str::FromStr;

use derive_more::Display;

/// Proxy servers share one launch shape: no argument file and no `--nogui`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ProxyKind {
    /// `velocity_handler`
    #[display("velocity")]
    Velocity,
    /// `bungeecord_handler`
    #[display("bungeecord")]
    BungeeCord,
    /// `waterfall_handler`
    #[display("waterfall")]
    Waterfall,
}

/// Server flavour selected by `MCDR_HANDLER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
pub enum HandlerKind {
    /// Plain `-jar` server; also used for any handler name that is not listed here.
    #[default]
    #[display("standard")]
    Standard,
    /// Forge or NeoForge, launched through the installer's `unix_args.txt`.
    #[display("forge")]
    Forge,
    /// One of the proxy servers.
    #[display("{_0}")]
    Proxy(ProxyKind),
}

impl HandlerKind {
    /// Resolve the raw `MCDR_HANDLER` value. Unset and unknown values both mean standard.
    pub fn from_env_value(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Self::Standard;
        };

        let kind = match raw {
            "forge_handler" => Self::Forge,
            "velocity_handler" => Self::Proxy(ProxyKind::Velocity),
            "bungeecord_handler" => Self::Proxy(ProxyKind::BungeeCord),
            "waterfall_handler" => Self::Proxy(ProxyKind::Waterfall),
            _ => Self::Standard,
        };
        tracing::debug!(handler = raw, %kind, "resolved handler");
        kind
    }

    /// Whether this is one of the proxy servers.
    pub fn is_proxy(&self) -> bool {
        matches!(self, Self::Proxy(_))
    }
}

impl FromStr for HandlerKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_env_value(Some(s)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macros::assert_matches;

    fn resolve(raw: &str) -> HandlerKind {
        HandlerKind::from_env_value(Some(raw))
    }

    #[test]
    fn known_handlers() {
        assert_eq!(resolve("forge_handler"), HandlerKind::Forge);
        assert_eq!(
            resolve("velocity_handler"),
            HandlerKind::Proxy(ProxyKind::Velocity)
        );
        assert_eq!(
            resolve("bungeecord_handler"),
            HandlerKind::Proxy(ProxyKind::BungeeCord)
        );
        assert_eq!(
            resolve("waterfall_handler"),
            HandlerKind::Proxy(ProxyKind::Waterfall)
        );
    }

    #[test]
    fn everything_else_is_standard() {
        let unknown = ["", "vanilla_handler", "Forge_Handler", "forge"];
        for raw in unknown.map(Some).into_iter().chain([None]) {
            let kind = HandlerKind::from_env_value(raw);
            assert_eq!(kind, HandlerKind::Standard, "{raw:?}");
        }
    }

    #[test]
    fn from_str_never_fails() {
        let parsed = "bukkit_handler".parse::<HandlerKind>();
        assert_matches!(parsed, Ok(HandlerKind::Standard));
        assert!(resolve(" waterfall_handler ").is_proxy());
    }

    #[test]
    fn display_names() {
        let bungee = HandlerKind::Proxy(ProxyKind::BungeeCord);
        assert_eq!(HandlerKind::Standard.to_string(), "standard");
        assert_eq!(bungee.to_string(), "bungeecord");
    }
}
