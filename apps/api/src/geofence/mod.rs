//! Geofencing middleware: restricts the API to US clients in allow-listed states.
//!
//! Client IP is the first `X-Forwarded-For` entry, else the socket peer.
//! Private and loopback addresses always pass. Everything else needs a region
//! lookup that resolves to country `US` and a region on the allow-list.
//!
//! The allow-list file (one region code per line, `#` comments) is re-read
//! whenever its modification time changes, so it can be edited without a
//! restart.

use std::collections::BTreeSet;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::SystemTime;

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::errors::AppError;

#[derive(Debug, Error)]
pub enum GeofenceError {
    #[error("failed to open GeoIP database: {0}")]
    Database(#[from] maxminddb::MaxMindDBError),
}

// ────────────────────────────────────────────────────────────────────────────
// Allow-list
// ────────────────────────────────────────────────────────────────────────────

pub fn parse_allow_list(raw: &str) -> BTreeSet<String> {
    raw.lines()
        .map(|line| line.trim().to_uppercase())
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .collect()
}

pub fn blocked_message(states: &BTreeSet<String>) -> String {
    if states.is_empty() {
        return "Access denied".to_string();
    }
    let list = states.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
    format!("Access blocked by location restrictions. This service is only available in {list}.")
}

#[derive(Debug, Default)]
struct AllowListCache {
    modified: Option<SystemTime>,
    states: BTreeSet<String>,
}

/// Allow-list file with an mtime-keyed cache.
#[derive(Debug)]
pub struct AllowList {
    path: PathBuf,
    cache: Mutex<AllowListCache>,
}

impl AllowList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: Mutex::new(AllowListCache::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cache(&self) -> MutexGuard<'_, AllowListCache> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Current allowed region codes, re-reading the file if it changed.
    ///
    /// File access goes through `tokio::fs`, so the stat on every request stays
    /// off the runtime's worker threads. If the file cannot be stat'ed the
    /// cached contents stay in effect; if it changed but cannot be read the
    /// list becomes empty.
    pub async fn current(&self) -> BTreeSet<String> {
        let modified = match tokio::fs::metadata(&self.path)
            .await
            .and_then(|m| m.modified())
        {
            Ok(modified) => modified,
            Err(e) => {
                let cache = self.cache();
                if cache.states.is_empty() {
                    warn!("Failed to stat allow-list {}: {e}", self.path.display());
                }
                return cache.states.clone();
            }
        };

        {
            let cache = self.cache();
            if cache.modified == Some(modified) {
                return cache.states.clone();
            }
        }

        let states = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => parse_allow_list(&raw),
            Err(e) => {
                warn!("Failed to load allow-list {}: {e}", self.path.display());
                BTreeSet::new()
            }
        };
        info!(
            "Loaded {} allowed regions from {}",
            states.len(),
            self.path.display()
        );

        let mut cache = self.cache();
        cache.modified = Some(modified);
        cache.states = states.clone();
        states
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Client address
// ────────────────────────────────────────────────────────────────────────────

fn normalize_ip(ip: IpAddr) -> IpAddr {
    match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
        v4 => v4,
    }
}

/// First `X-Forwarded-For` entry if present and parseable, else the peer address.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    match forwarded {
        Some(value) => value.parse::<IpAddr>().ok().map(normalize_ip),
        None => peer.map(|addr| normalize_ip(addr.ip())),
    }
}

pub fn is_private_ip(ip: IpAddr) -> bool {
    match normalize_ip(ip) {
        IpAddr::V4(v4) => v4.is_loopback() || v4.is_private() || v4.is_link_local(),
        IpAddr::V6(v6) => {
            let first = v6.segments()[0];
            v6.is_loopback() || (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Region lookup
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionInfo {
    /// ISO 3166-1 country code.
    pub country: Option<String>,
    /// ISO 3166-2 subdivision code without the country prefix (e.g. `CA`).
    pub region: Option<String>,
}

pub trait RegionLookup: Send + Sync {
    fn lookup(&self, ip: IpAddr) -> Option<RegionInfo>;
}

/// Region lookup against a MaxMind GeoLite2 City database.
pub struct MaxMindLookup {
    reader: maxminddb::Reader<Vec<u8>>,
}

impl MaxMindLookup {
    pub fn open(path: &Path) -> Result<Self, GeofenceError> {
        let reader = maxminddb::Reader::open_readfile(path)?;
        Ok(Self { reader })
    }
}

impl RegionLookup for MaxMindLookup {
    fn lookup(&self, ip: IpAddr) -> Option<RegionInfo> {
        let city: maxminddb::geoip2::City = match self.reader.lookup(ip) {
            Ok(city) => city,
            Err(e) => {
                debug!("No GeoIP record for {ip}: {e}");
                return None;
            }
        };

        let country = city
            .country
            .and_then(|c| c.iso_code)
            .map(str::to_string);
        let region = city
            .subdivisions
            .and_then(|subs| subs.into_iter().next())
            .and_then(|s| s.iso_code)
            .map(str::to_string);

        Some(RegionInfo { country, region })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Policy + middleware
// ────────────────────────────────────────────────────────────────────────────

pub struct Geofence {
    allow_list: AllowList,
    lookup: Arc<dyn RegionLookup>,
}

impl Geofence {
    pub fn new(allow_list: AllowList, lookup: Arc<dyn RegionLookup>) -> Self {
        Self { allow_list, lookup }
    }

    /// `Err` carries the message returned to the blocked client.
    pub async fn check(&self, ip: Option<IpAddr>) -> Result<(), String> {
        let states = self.allow_list.current().await;

        let Some(ip) = ip else {
            return Err(blocked_message(&states));
        };
        if is_private_ip(ip) {
            return Ok(());
        }

        let allowed = self.lookup.lookup(ip).is_some_and(|info| {
            info.country.as_deref() == Some("US")
                && info
                    .region
                    .is_some_and(|region| states.contains(&region.to_uppercase()))
        });

        if allowed {
            Ok(())
        } else {
            Err(blocked_message(&states))
        }
    }
}

/// Axum middleware; install with `middleware::from_fn_with_state`.
pub async fn enforce_geofence(
    State(geofence): State<Arc<Geofence>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(request.headers(), peer);

    if let Err(message) = geofence.check(ip).await {
        debug!("Geofence blocked request from {ip:?}");
        return Err(AppError::Forbidden(message));
    }

    Ok(next.run(request).await)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
