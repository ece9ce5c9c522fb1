use crate::error::CouchError;
use std::fmt;
use std::str::FromStr;

/// `major.minor.patch` as reported in the `version` field of `GET /`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    /// First release that serves `POST .../_view/{view}/queries`.
    pub const MULTI_QUERY: ServerVersion = ServerVersion::new(2, 2, 0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self { major, minor, patch }
    }
}

impl FromStr for ServerVersion {
    type Err = CouchError;

    /// Accepts `3`, `2.1`, `3.3.3` and suffixed forms such as `2.2.0-rc1`;
    /// anything after the dotted numeric prefix is ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CouchError::InvalidVersion(s.to_string());

        let numeric = s
            .trim()
            .split(|c: char| !(c.is_ascii_digit() || c == '.'))
            .next()
            .unwrap_or_default();

        let mut parts = numeric.split('.');
        let mut component = |required: bool| -> Result<u32, CouchError> {
            match parts.next() {
                Some(p) if !p.is_empty() => p.parse().map_err(|_| invalid()),
                Some(_) | None if required => Err(invalid()),
                _ => Ok(0),
            }
        };

        let major = component(true)?;
        let minor = component(false)?;
        let patch = component(false)?;
        Ok(ServerVersion::new(major, minor, patch))
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// How a batch of view queries is sent to the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultiQueryStrategy {
    /// One `POST .../_view/{view}/queries` carrying every query.
    Native,
    /// One view request per query, issued in order.
    Sequential,
}

impl MultiQueryStrategy {
    pub fn for_version(version: ServerVersion) -> Self {
        if version >= ServerVersion::MULTI_QUERY {
            MultiQueryStrategy::Native
        } else {
            MultiQueryStrategy::Sequential
        }
    }
}
