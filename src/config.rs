use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;

use crate::gate::code::{
    CodePolicy, DEFAULT_STEP_SECONDS, DEFAULT_TOLERANCE_STEPS, MAX_TOLERANCE_STEPS, SharedSecret,
};
use crate::gate::geofence::{DEFAULT_RADIUS_METERS, GeofenceResolver};
use crate::gate::registry::DevicePolicy;
use crate::model::Zone;
use crate::store::StaticKeySource;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub api_prefix: String,
    pub log_dir: PathBuf,

    pub code_secret: SharedSecret,
    pub code_policy: CodePolicy,
    pub radius_meters: f64,
    pub device_policy: DevicePolicy,

    pub zones_file: PathBuf,
    pub registration_keys_file: PathBuf,
    pub bindings_file: PathBuf,
    pub records_file: PathBuf,

    // Rate limiting
    pub rate_code_per_min: u32,
    pub rate_record_per_min: u32,
    pub rate_register_per_min: u32,
    pub rate_admin_per_min: u32,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("{key} has an invalid value '{raw}': {e}")),
        Err(_) => Ok(default),
    }
}

fn required_var(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn code_policy(step_seconds: u64, tolerance_steps: u32) -> Result<CodePolicy> {
    if step_seconds == 0 {
        return Err(anyhow!("CODE_STEP_SECONDS must be greater than zero"));
    }
    if tolerance_steps > MAX_TOLERANCE_STEPS {
        return Err(anyhow!(
            "CODE_TOLERANCE_STEPS must be at most {MAX_TOLERANCE_STEPS}, got {tolerance_steps}"
        ));
    }
    CodePolicy::new(step_seconds, tolerance_steps).context("invalid code policy")
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let secret = required_var("CODE_SECRET")?;
        if secret.is_empty() {
            return Err(anyhow!("CODE_SECRET must not be empty"));
        }

        let code_policy = code_policy(
            parse_var("CODE_STEP_SECONDS", DEFAULT_STEP_SECONDS)?,
            parse_var("CODE_TOLERANCE_STEPS", DEFAULT_TOLERANCE_STEPS)?,
        )?;

        let radius_meters: f64 = parse_var("GEOFENCE_RADIUS_METERS", DEFAULT_RADIUS_METERS)?;
        if !radius_meters.is_finite() || radius_meters < 0.0 {
            return Err(anyhow!("GEOFENCE_RADIUS_METERS must be a non-negative number"));
        }

        Ok(Self {
            server_addr: var_or("SERVER_ADDR", "127.0.0.1:4000"),
            api_prefix: var_or("API_PREFIX", "/api"),
            log_dir: var_or("LOG_DIR", "logs").into(),

            code_secret: SharedSecret::new(secret),
            code_policy,
            radius_meters,
            device_policy: parse_var("DEVICE_POLICY", DevicePolicy::Shared)?,

            zones_file: required_var("ZONES_FILE")?.into(),
            registration_keys_file: required_var("REGISTRATION_KEYS_FILE")?.into(),
            bindings_file: var_or("BINDINGS_FILE", "data/devices.json").into(),
            records_file: var_or("RECORDS_FILE", "data/records.jsonl").into(),

            rate_code_per_min: parse_var("RATE_CODE_PER_MIN", 60)?,
            rate_record_per_min: parse_var("RATE_RECORD_PER_MIN", 30)?,
            rate_register_per_min: parse_var("RATE_REGISTER_PER_MIN", 10)?,
            rate_admin_per_min: parse_var("RATE_ADMIN_PER_MIN", 120)?,
        })
    }

    /// Geofence built from the zones file.
    pub fn load_geofence(&self) -> Result<GeofenceResolver> {
        let zones = load_zones(&self.zones_file)?;
        GeofenceResolver::new(zones, self.radius_meters)
            .with_context(|| format!("invalid zone in {}", self.zones_file.display()))
    }

    pub fn load_registration_keys(&self) -> Result<StaticKeySource> {
        load_registration_keys(&self.registration_keys_file)
    }
}

/// JSON array of `{name, latitude, longitude}`.
pub fn load_zones(path: &Path) -> Result<Vec<Zone>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read zones file {}", path.display()))?;
    let zones: Vec<Zone> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse zones file {}", path.display()))?;
    if zones.is_empty() {
        return Err(anyhow!("zones file {} defines no zones", path.display()));
    }
    Ok(zones)
}

/// JSON object mapping employee id to registration key (plaintext or
/// argon2 PHC string).
pub fn load_registration_keys(path: &Path) -> Result<StaticKeySource> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read registration keys file {}", path.display()))?;
    let keys: HashMap<String, String> = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse registration keys file {}", path.display()))?;
    Ok(StaticKeySource::new(keys))
}
