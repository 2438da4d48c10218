//! Remote target parsing

use crate::TransportError;
use std::fmt;
use std::str::FromStr;

/// Host placeholder meaning "run locally"
pub const LOCAL_HOST: &str = "-";

/// Parsed `[user@]host[:port]` target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressSpec {
    /// Login name, if given
    pub user: Option<String>,
    /// Remote host; `None` means local execution
    pub host: Option<String>,
    /// Remote port, if given
    pub port: Option<u16>,
}

impl AddressSpec {
    /// Address for local execution
    pub fn local() -> Self {
        Self::default()
    }

    /// Parse a `[user@]host[:port]`, `[user@][v6:addr]:port` or `-` target
    pub fn parse(input: &str) -> Result<Self, TransportError> {
        let invalid = |reason: String| TransportError::InvalidAddress {
            input: input.to_string(),
            reason,
        };

        // Only colons after the user part count towards IPv6 detection
        let (user, rest) = match input.rfind('@') {
            Some(at) => (Some(input[..at].to_string()), &input[at + 1..]),
            None => (None, input),
        };

        let (host, port) = if rest.matches(':').count() > 1 {
            if rest.contains(['[', ']']) {
                let mut parts = rest.split(']');
                let host = parts.next().unwrap_or_default().trim_matches('[');
                let port = parts.next().map(|p| p.trim_matches(':')).filter(|p| !p.is_empty());
                (host, port)
            } else {
                // A bare IPv6 literal cannot be told apart from host:port
                (rest, None)
            }
        } else {
            match rest.rsplit_once(':') {
                Some((host, port)) => (host, Some(port)),
                None => (rest, None),
            }
        };

        let port = port
            .map(|p| {
                p.parse::<u16>()
                    .map_err(|e| invalid(format!("port {:?}: {}", p, e)))
            })
            .transpose()?;

        if host.is_empty() {
            return Err(invalid("missing host".to_string()));
        }
        let host = (host != LOCAL_HOST).then(|| host.to_string());

        Ok(Self { user, host, port })
    }

    /// Whether the session runs without a remote transport
    pub fn is_local(&self) -> bool {
        self.host.is_none()
    }

    /// Destination argument for the transport (`user@host`), if remote
    pub fn destination(&self) -> Option<String> {
        let host = self.host.as_deref()?;
        Some(match &self.user {
            Some(user) => format!("{}@{}", user, host),
            None => host.to_string(),
        })
    }
}

impl FromStr for AddressSpec {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AddressSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(host) = &self.host else {
            return write!(f, "{}", LOCAL_HOST);
        };
        if let Some(user) = &self.user {
            write!(f, "{}@", user)?;
        }
        match (host.contains(':'), self.port) {
            (true, Some(port)) => write!(f, "[{}]:{}", host, port),
            (true, None) => write!(f, "[{}]", host),
            (false, Some(port)) => write!(f, "{}:{}", host, port),
            (false, None) => write!(f, "{}", host),
        }
    }
}
