use std::path::Path;

use facet::Facet;

use crate::error::SteadError;

// ── defaults ──────────────────────────────────────────────

pub const DEFAULT_PROVIDER: &str = "virtualbox";
pub const DEFAULT_IP: &str = "192.168.144.10";
pub const DEFAULT_MEMORY: u32 = 2048;
pub const DEFAULT_CPUS: u32 = 1;
pub const DEFAULT_PROTOCOL: &str = "tcp";

/// Guest identity is fixed: one box, one hostname.
pub const GUEST_BOX: &str = "ubuntu/trusty64";
pub const GUEST_HOSTNAME: &str = "stead";

/// Read by the external orchestrator at VM boot to pick the provider.
pub const DEFAULT_PROVIDER_ENV: &str = "STEAD_DEFAULT_PROVIDER";

/// Forwarded-port defaults (http, https, mysql, postgres), applied only
/// for guest ports the user has not claimed.
pub const DEFAULT_PORTS: [(u16, u16); 4] =
    [(80, 8000), (443, 44300), (3306, 33060), (5432, 54320)];

// ── raw settings ──────────────────────────────────────────

/// The user-edited settings file, as parsed. Every key may be absent;
/// `normalize` fills core defaults in place and `validate` rejects
/// malformed entries.
#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct Settings {
    pub provider: Option<String>,
    pub ip: Option<String>,
    pub memory: Option<u32>,
    pub cpus: Option<u32>,
    pub ports: Option<Vec<PortConfig>>,
    pub authorize: Option<String>,
    pub keys: Option<Vec<String>>,
    pub folders: Option<Vec<FolderConfig>>,
    pub sites: Option<Vec<SiteConfig>>,
    pub databases: Option<Vec<String>>,
    pub variables: Option<Vec<VariableConfig>>,
    pub blackfire: Option<Vec<BlackfireConfig>>,
}

#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct PortConfig {
    pub guest: Option<u16>,
    pub host: Option<u16>,
    /// Legacy alias for `guest`.
    pub to: Option<u16>,
    /// Legacy alias for `host`.
    pub send: Option<u16>,
    pub protocol: Option<String>,
}

#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct SiteConfig {
    pub map: Option<String>,
    pub to: Option<String>,
    pub port: Option<u16>,
    pub ssl: Option<u16>,
    #[facet(default)]
    pub hhvm: bool,
}

#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct FolderConfig {
    pub map: Option<String>,
    pub to: Option<String>,
    #[facet(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct VariableConfig {
    pub key: Option<String>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, Default, Facet)]
#[facet(default)]
pub struct BlackfireConfig {
    pub id: Option<String>,
    pub token: Option<String>,
    #[facet(rename = "client-id")]
    pub client_id: Option<String>,
    #[facet(rename = "client-token")]
    pub client_token: Option<String>,
}

// ── resolved records ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPort {
    pub guest: u16,
    pub host: u16,
    pub protocol: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedSite {
    pub map: String,
    pub to: String,
    pub port: u16,
    pub ssl: u16,
    pub hhvm: bool,
}

#[derive(Debug, Clone)]
pub struct ResolvedFolder {
    pub map: String,
    pub to: String,
    pub kind: Option<String>,
    pub mount_options: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ResolvedVariable {
    pub key: String,
    pub value: String,
}

/// Profiling-agent credentials, taken from the FIRST `blackfire` entry.
/// Repeated entries are ignored.
#[derive(Debug, Clone)]
pub struct BlackfireCredentials {
    pub id: String,
    pub token: String,
    pub client_id: String,
    pub client_token: String,
}

/// Fixed guest identity plus the normalized core facts, shown in the
/// plan header and `check` output.
#[derive(Debug, Clone)]
pub struct Machine {
    pub box_name: String,
    pub hostname: String,
    pub provider: String,
    pub ip: String,
    pub memory: u32,
    pub cpus: u32,
}

// ── normalization & resolution ────────────────────────────

impl Settings {
    /// Fill set-if-absent defaults for the core fields and resolve the
    /// legacy port aliases (`to` → `guest`, `send` → `host`).
    ///
    /// Idempotent: running it on already-normalized settings changes
    /// nothing. Explicit values are never overwritten.
    pub fn normalize(&mut self) {
        self.provider.get_or_insert_with(|| DEFAULT_PROVIDER.into());
        self.ip.get_or_insert_with(|| DEFAULT_IP.into());
        self.memory.get_or_insert(DEFAULT_MEMORY);
        self.cpus.get_or_insert(DEFAULT_CPUS);

        let ports = self.ports.get_or_insert_with(Vec::new);
        for port in ports {
            if port.guest.is_none() {
                port.guest = port.to;
            }
            if port.host.is_none() {
                port.host = port.send;
            }
            port.protocol.get_or_insert_with(|| DEFAULT_PROTOCOL.into());
        }
    }

    /// Merge the default forwarded-port table with the user's entries.
    ///
    /// Call after `normalize`. Defaults whose guest port the user has
    /// claimed are suppressed; surviving defaults come first in table
    /// order, then all user entries in file order.
    pub fn resolve_ports(&self) -> Vec<ResolvedPort> {
        let user = self.ports.as_deref().unwrap_or(&[]);
        let mut resolved = Vec::new();

        for (guest, host) in DEFAULT_PORTS {
            if user.iter().any(|p| p.guest == Some(guest)) {
                tracing::debug!(guest, "default port mapping overridden");
                continue;
            }
            resolved.push(ResolvedPort {
                guest,
                host,
                protocol: DEFAULT_PROTOCOL.into(),
            });
        }

        for p in user {
            // validate() guarantees guest/host after normalization
            let (Some(guest), Some(host)) = (p.guest, p.host) else {
                continue;
            };
            resolved.push(ResolvedPort {
                guest,
                host,
                protocol: p
                    .protocol
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PROTOCOL.into()),
            });
        }

        resolved
    }

    /// Web-server virtual hosts. `sites` is required; its absence is a
    /// hard error, not an empty plan.
    pub fn resolve_sites(&self) -> Result<Vec<ResolvedSite>, SteadError> {
        let sites = self
            .sites
            .as_ref()
            .ok_or(SteadError::MissingSection { key: "sites" })?;

        Ok(sites
            .iter()
            .filter_map(|s| {
                Some(ResolvedSite {
                    map: s.map.clone()?,
                    to: s.to.clone()?,
                    port: s.port.unwrap_or(80),
                    ssl: s.ssl.unwrap_or(443),
                    hhvm: s.hhvm,
                })
            })
            .collect())
    }

    /// Database names. Required, same policy as `sites`.
    pub fn databases(&self) -> Result<&[String], SteadError> {
        self.databases
            .as_deref()
            .ok_or(SteadError::MissingSection { key: "databases" })
    }

    /// Shared-folder mounts. Folders of type `nfs` get `actimeo=1`,
    /// everything else mounts with no options.
    pub fn resolve_folders(&self) -> Vec<ResolvedFolder> {
        self.folders
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .filter_map(|f| {
                let mount_options = if f.kind.as_deref() == Some("nfs") {
                    vec!["actimeo=1".to_string()]
                } else {
                    Vec::new()
                };
                Some(ResolvedFolder {
                    map: f.map.clone()?,
                    to: f.to.clone()?,
                    kind: f.kind.clone(),
                    mount_options,
                })
            })
            .collect()
    }

    /// Environment variables destined for the guest runtime configs.
    pub fn resolve_variables(&self) -> Vec<ResolvedVariable> {
        self.variables
            .as_deref()
            .unwrap_or(&[])
            .iter()
            .filter_map(|v| {
                Some(ResolvedVariable {
                    key: v.key.clone()?,
                    value: v.value.clone()?,
                })
            })
            .collect()
    }

    /// Credentials from the first `blackfire` entry, if any. An empty
    /// list behaves like an absent key.
    pub fn blackfire_credentials(&self) -> Option<BlackfireCredentials> {
        let first = self.blackfire.as_deref()?.first()?;
        Some(BlackfireCredentials {
            id: first.id.clone()?,
            token: first.token.clone()?,
            client_id: first.client_id.clone()?,
            client_token: first.client_token.clone()?,
        })
    }

    /// Call after `normalize`.
    pub fn machine(&self) -> Machine {
        Machine {
            box_name: GUEST_BOX.into(),
            hostname: GUEST_HOSTNAME.into(),
            provider: self
                .provider
                .clone()
                .unwrap_or_else(|| DEFAULT_PROVIDER.into()),
            ip: self.ip.clone().unwrap_or_else(|| DEFAULT_IP.into()),
            memory: self.memory.unwrap_or(DEFAULT_MEMORY),
            cpus: self.cpus.unwrap_or(DEFAULT_CPUS),
        }
    }
}

/// Export the provider choice for the external orchestrator.
///
/// Safety: called from the single-threaded CLI entry point, before any
/// other thread exists.
pub fn export_default_provider(settings: &Settings) {
    let provider = settings.provider.as_deref().unwrap_or(DEFAULT_PROVIDER);
    unsafe { std::env::set_var(DEFAULT_PROVIDER_ENV, provider) };
}

// ── validation ────────────────────────────────────────────

/// Reject malformed entries, naming the entry and the field.
/// Run after `normalize` so the legacy port aliases are resolved.
pub fn validate(settings: &Settings) -> Result<(), SteadError> {
    if let Some(ports) = &settings.ports {
        for (i, p) in ports.iter().enumerate() {
            if p.guest.or(p.to).is_none() {
                return Err(SteadError::Validation {
                    message: format!("ports[{i}]: 'guest' (or legacy 'to') is required"),
                });
            }
            if p.host.or(p.send).is_none() {
                return Err(SteadError::Validation {
                    message: format!("ports[{i}]: 'host' (or legacy 'send') is required"),
                });
            }
        }
    }

    if let Some(sites) = &settings.sites {
        for (i, s) in sites.iter().enumerate() {
            if s.map.is_none() {
                return Err(SteadError::Validation {
                    message: format!("sites[{i}]: 'map' is required"),
                });
            }
            if s.to.is_none() {
                return Err(SteadError::Validation {
                    message: format!("sites[{i}]: 'to' is required"),
                });
            }
        }
    }

    if let Some(folders) = &settings.folders {
        for (i, f) in folders.iter().enumerate() {
            if f.map.is_none() {
                return Err(SteadError::Validation {
                    message: format!("folders[{i}]: 'map' is required"),
                });
            }
            if f.to.is_none() {
                return Err(SteadError::Validation {
                    message: format!("folders[{i}]: 'to' is required"),
                });
            }
        }
    }

    if let Some(variables) = &settings.variables {
        for (i, v) in variables.iter().enumerate() {
            if v.key.is_none() {
                return Err(SteadError::Validation {
                    message: format!("variables[{i}]: 'key' is required"),
                });
            }
            if v.value.is_none() {
                return Err(SteadError::Validation {
                    message: format!("variables[{i}]: 'value' is required"),
                });
            }
        }
    }

    // Only the first blackfire entry is consumed; later entries are
    // ignored and not validated.
    if let Some(first) = settings.blackfire.as_deref().and_then(|b| b.first()) {
        for (field, value) in [
            ("id", &first.id),
            ("token", &first.token),
            ("client-id", &first.client_id),
            ("client-token", &first.client_token),
        ] {
            if value.is_none() {
                return Err(SteadError::Validation {
                    message: format!("blackfire[0]: '{field}' is required"),
                });
            }
        }
    }

    Ok(())
}

// ── public API ────────────────────────────────────────────

pub fn load_settings(path: &Path) -> Result<Settings, SteadError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SteadError::ConfigLoad {
        path: path.display().to_string(),
        source,
    })?;

    facet_yaml::from_str(&contents).map_err(|e| SteadError::ConfigParse {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
