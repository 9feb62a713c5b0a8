use crate::error::MachineIdError;
use crate::flake_id::MAX_MACHINE_ID;

const HOSTNAME_ENV: &str = "HOSTNAME";
const HOSTNAME_FILE: &str = "/etc/hostname";

/// Source of the machine id embedded in every generated identifier.
///
/// Assigning machine ids across a fleet is the caller's concern; a provider
/// may return a constant, derive the id from the host, or ask an external
/// coordinator.
pub trait MachineIdProvider: Send + Sync {
    fn machine_id(&self) -> Result<u16, MachineIdError>;
}

impl<F> MachineIdProvider for F
where
    F: Fn() -> Result<u16, MachineIdError> + Send + Sync,
{
    fn machine_id(&self) -> Result<u16, MachineIdError> {
        self()
    }
}

/// Always yields the same machine id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticMachineId(pub u16);

impl MachineIdProvider for StaticMachineId {
    fn machine_id(&self) -> Result<u16, MachineIdError> {
        Ok(self.0)
    }
}

/// Derives the machine id from a hash of the host name.
///
/// The host name is taken from an explicit override, then the `HOSTNAME`
/// environment variable, then `/etc/hostname`. Distinct hosts may collide;
/// fleets larger than a handful of machines should assign ids explicitly.
#[derive(Debug, Clone, Default)]
pub struct HostnameMachineId {
    hostname: Option<String>,
}

impl HostnameMachineId {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hashes the given name instead of looking up the local host name.
    pub fn with_hostname(hostname: impl Into<String>) -> Self {
        Self {
            hostname: Some(hostname.into()),
        }
    }

    fn resolve_hostname(&self) -> Result<String, MachineIdError> {
        first_hostname(
            self.hostname.clone(),
            std::env::var(HOSTNAME_ENV).ok(),
            || std::fs::read_to_string(HOSTNAME_FILE),
        )
    }
}

/// Picks the first non-blank host name from the override, the environment
/// and the host name file, in that order. The file is only read when needed.
fn first_hostname(
    explicit: Option<String>,
    env: Option<String>,
    read_file: impl FnOnce() -> std::io::Result<String>,
) -> Result<String, MachineIdError> {
    if let Some(hostname) = explicit {
        return non_blank(hostname)
            .ok_or_else(|| MachineIdError::Unavailable("empty host name".to_string()));
    }
    if let Some(hostname) = env.and_then(non_blank) {
        return Ok(hostname);
    }
    let contents = read_file()
        .map_err(|e| MachineIdError::Unavailable(format!("{HOSTNAME_FILE}: {e}")))?;
    non_blank(contents)
        .ok_or_else(|| MachineIdError::Unavailable(format!("{HOSTNAME_FILE} is empty")))
}

fn non_blank(hostname: String) -> Option<String> {
    let trimmed = hostname.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl MachineIdProvider for HostnameMachineId {
    fn machine_id(&self) -> Result<u16, MachineIdError> {
        let hostname = self.resolve_hostname()?;
        Ok(fold_to_machine_id(fnv1a(hostname.as_bytes())))
    }
}

// 64-bit FNV-1a; stable across builds, unlike `DefaultHasher`.
fn fnv1a(bytes: &[u8]) -> u64 {
    const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
    const PRIME: u64 = 0x0000_0100_0000_01b3;

    bytes.iter().fold(OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(PRIME)
    })
}

fn fold_to_machine_id(hash: u64) -> u16 {
    let folded = hash ^ (hash >> 10) ^ (hash >> 20) ^ (hash >> 30) ^ (hash >> 40);
    (folded & u64::from(MAX_MACHINE_ID)) as u16
}
