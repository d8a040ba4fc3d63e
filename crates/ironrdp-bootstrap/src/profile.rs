//! Connection profiles in the `.rdp` file format.
//!
//! Each line has the form `key:type:value`, where type is `i` (integer) or `s` (string).

use core::fmt;
use std::collections::BTreeMap;

use crate::request::{ConnectionRequest, FormFields};

pub const DEFAULT_RDP_PORT: u16 = 3389;

const FULL_ADDRESS: &str = "full address";
const SERVER_PORT: &str = "server port";
const USERNAME: &str = "username";
const CLEAR_TEXT_PASSWORD: &str = "ClearTextPassword";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileErrorKind {
    UnknownType { ty: String },
    InvalidValue { ty: String, value: String },
    MalformedLine { line: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileError {
    pub kind: ProfileErrorKind,
    /// 0-based line index
    pub line: usize,
}

impl core::error::Error for ProfileError {}

impl fmt::Display for ProfileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let line_number = self.line;

        match &self.kind {
            ProfileErrorKind::UnknownType { ty } => write!(f, "unknown type at line {line_number} ({ty})"),
            ProfileErrorKind::InvalidValue { ty, value } => {
                write!(f, "invalid value at line {line_number} for type {ty} ({value})")
            }
            ProfileErrorKind::MalformedLine { line } => write!(f, "malformed line at line {line_number} ({line})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileValue {
    Int(i64),
    Str(String),
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionProfile {
    pub full_address: Option<String>,
    pub server_port: Option<i64>,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Keys this crate has no use for, kept as-is
    pub other: BTreeMap<String, ProfileValue>,
}

impl ConnectionProfile {
    /// Parses a profile, collecting every faulty line instead of stopping at the first one.
    pub fn parse(input: &str) -> (Self, Vec<ProfileError>) {
        let mut profile = Self::default();
        let mut errors = Vec::new();

        for (idx, line) in input.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let mut split = line.splitn(3, ':');

            let (Some(key), Some(ty), Some(value)) = (split.next(), split.next(), split.next()) else {
                errors.push(ProfileError {
                    kind: ProfileErrorKind::MalformedLine { line: line.to_owned() },
                    line: idx,
                });
                continue;
            };

            let value = match ty {
                "i" => match value.trim().parse::<i64>() {
                    Ok(value) => ProfileValue::Int(value),
                    Err(_) => {
                        errors.push(ProfileError {
                            kind: ProfileErrorKind::InvalidValue {
                                ty: ty.to_owned(),
                                value: value.to_owned(),
                            },
                            line: idx,
                        });
                        continue;
                    }
                },
                "s" => ProfileValue::Str(value.to_owned()),
                _ => {
                    errors.push(ProfileError {
                        kind: ProfileErrorKind::UnknownType { ty: ty.to_owned() },
                        line: idx,
                    });
                    continue;
                }
            };

            profile.insert(key, value);
        }

        if !errors.is_empty() {
            warn!(count = errors.len(), "Connection profile contains invalid lines");
        }

        (profile, errors)
    }

    fn insert(&mut self, key: &str, value: ProfileValue) {
        match (key, value) {
            (key, ProfileValue::Str(value)) if key.eq_ignore_ascii_case(FULL_ADDRESS) => {
                self.full_address = Some(value);
            }
            (key, ProfileValue::Int(value)) if key.eq_ignore_ascii_case(SERVER_PORT) => {
                self.server_port = Some(value);
            }
            (key, ProfileValue::Str(value)) if key.eq_ignore_ascii_case(USERNAME) => {
                self.username = Some(value);
            }
            (key, ProfileValue::Str(value)) if key.eq_ignore_ascii_case(CLEAR_TEXT_PASSWORD) => {
                self.password = Some(value);
            }
            (key, value) => {
                trace!(key, "Unused profile entry");
                self.other.insert(key.to_owned(), value);
            }
        }
    }

    /// Host part of `full address`.
    pub fn host(&self) -> Option<&str> {
        self.full_address.as_deref().map(|address| split_full_address(address).0)
    }

    /// `server port` if present, otherwise the port embedded in `full address`, otherwise the
    /// default RDP port.
    pub fn port(&self) -> String {
        if let Some(port) = self.server_port {
            return port.to_string();
        }

        self.full_address
            .as_deref()
            .and_then(|address| split_full_address(address).1)
            .map_or_else(|| DEFAULT_RDP_PORT.to_string(), str::to_owned)
    }

    pub fn to_request(&self) -> ConnectionRequest {
        ConnectionRequest::from_form(FormFields {
            host: self.host().unwrap_or_default().to_owned(),
            port: self.port(),
            username: self.username.clone().unwrap_or_default(),
            password: self.password.clone().unwrap_or_default(),
        })
    }
}

impl fmt::Debug for ConnectionProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionProfile")
            .field("full_address", &self.full_address)
            .field("server_port", &self.server_port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("other", &self.other)
            .finish()
    }
}

/// Splits `host:port`, `[ipv6]:port` and bare hosts. A bare IPv6 address has no port.
fn split_full_address(address: &str) -> (&str, Option<&str>) {
    if let Some((host, port)) = address.rsplit_once(':') {
        let is_port = !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit());
        let is_bracketed = host.starts_with('[') && host.ends_with(']');

        if is_port && (is_bracketed || !host.contains(':')) {
            return (host, Some(port));
        }
    }

    (address, None)
}
