use chrono::Utc;
use color_eyre::eyre::{Result, WrapErr, eyre};
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    io::Write,
    path::{Path, PathBuf},
};

pub const DEPLOYMENTS_ROOT: &str = ".deployments";
const DEPLOYMENTS_FILE: &str = "deployments.json";

/// Address of the contract on the Chiliz Spicy testnet. Used to seed a
/// record when an environment has none on file yet.
pub const DEFAULT_CONTRACT_ADDRESS: &str = "0x239EDd859C51b8b7ac88F55Eed96F380F0bD816d";

fn default_token_decimals() -> u32 {
    18
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DeploymentEnv {
    Main,
    Test,
    Local,
}

impl DeploymentEnv {
    pub fn dir_name(self) -> &'static str {
        match self {
            DeploymentEnv::Main => "main",
            DeploymentEnv::Test => "test",
            DeploymentEnv::Local => "local",
        }
    }

    pub fn default_chain_id(self) -> u64 {
        match self {
            DeploymentEnv::Main => 88888,
            DeploymentEnv::Test => 88882,
            DeploymentEnv::Local => 31337,
        }
    }

    pub fn default_network_url(self) -> &'static str {
        match self {
            DeploymentEnv::Main => "https://rpc.ankr.com/chiliz",
            DeploymentEnv::Test => "https://spicy-rpc.chiliz.com",
            DeploymentEnv::Local => "http://127.0.0.1:8545",
        }
    }
}

impl fmt::Display for DeploymentEnv {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeploymentEnv::Main => "Mainnet",
            DeploymentEnv::Test => "Testnet",
            DeploymentEnv::Local => "Local",
        };
        write!(f, "{name}")
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub deployed_at: String,
    pub contract_address: String,
    pub chain_id: u64,
    pub network_url: String,
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u32,
}

impl DeploymentRecord {
    pub fn defaults_for(env: DeploymentEnv) -> Self {
        Self {
            deployed_at: Utc::now().to_rfc3339(),
            contract_address: DEFAULT_CONTRACT_ADDRESS.to_string(),
            chain_id: env.default_chain_id(),
            network_url: env.default_network_url().to_string(),
            token_decimals: default_token_decimals(),
        }
    }
}

#[derive(Debug)]
pub struct DeploymentStore {
    path: PathBuf,
}

impl DeploymentStore {
    pub fn new(env: DeploymentEnv) -> Result<Self> {
        let path = ensure_store(env)?;
        Ok(Self { path })
    }

    pub fn load(&self) -> Result<Vec<DeploymentRecord>> {
        read_records(&self.path)
    }

    /// The newest record wins; earlier entries are history.
    pub fn latest(&self) -> Result<DeploymentRecord> {
        self.load()?
            .into_iter()
            .last()
            .ok_or_else(|| eyre!("No deployment recorded in {}", self.path.display()))
    }
}

/// Resolve the record the client should run against. Missing file or empty
/// history falls back to the environment's published defaults so a fresh
/// checkout can still connect.
pub fn resolve_record(env: DeploymentEnv) -> Result<DeploymentRecord> {
    let store = DeploymentStore::new(env)?;
    match store.latest() {
        Ok(record) => Ok(record),
        Err(_) => Ok(DeploymentRecord::defaults_for(env)),
    }
}

pub fn ensure_structure() -> Result<()> {
    for env in [
        DeploymentEnv::Main,
        DeploymentEnv::Test,
        DeploymentEnv::Local,
    ] {
        let _ = ensure_store(env)?;
    }
    Ok(())
}

fn ensure_store(env: DeploymentEnv) -> Result<PathBuf> {
    let root = Path::new(DEPLOYMENTS_ROOT);
    if !root.exists() {
        fs::create_dir_all(root).wrap_err("Failed to create .deployments directory")?;
    }

    let env_dir = root.join(env.dir_name());
    if !env_dir.exists() {
        fs::create_dir_all(&env_dir).wrap_err_with(|| {
            format!("Failed to create .deployments/{} directory", env.dir_name())
        })?;
    }

    let file_path = env_dir.join(DEPLOYMENTS_FILE);
    if !file_path.exists() {
        let mut file = fs::File::create(&file_path).wrap_err_with(|| {
            format!(
                "Failed to create deployment record file for {} at {:?}",
                env, file_path
            )
        })?;
        file.write_all(b"[]").wrap_err_with(|| {
            format!("Failed to initialize deployment record file for {}", env)
        })?;
    }

    Ok(file_path)
}

fn read_records(path: impl AsRef<Path>) -> Result<Vec<DeploymentRecord>> {
    let data = fs::read(path.as_ref()).wrap_err("Failed to read deployment records")?;
    if data.is_empty() {
        return Ok(Vec::new());
    }
    let records = serde_json::from_slice::<Vec<DeploymentRecord>>(&data)
        .wrap_err("Failed to parse deployment records JSON")?;
    Ok(records)
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;

    #[test]
    fn record__token_decimals_default_when_absent_from_json() {
        // given
        let json = r#"{
            "deployed_at": "2026-01-10T09:00:00Z",
            "contract_address": "0x239EDd859C51b8b7ac88F55Eed96F380F0bD816d",
            "chain_id": 88882,
            "network_url": "https://spicy-rpc.chiliz.com"
        }"#;

        // when
        let record: DeploymentRecord = serde_json::from_str(json).unwrap();

        // then
        assert_eq!(record.token_decimals, 18);
    }

    #[test]
    fn defaults__match_environment_chain_ids() {
        assert_eq!(DeploymentRecord::defaults_for(DeploymentEnv::Local).chain_id, 31337);
        assert_eq!(DeploymentRecord::defaults_for(DeploymentEnv::Test).chain_id, 88882);
        assert_eq!(DeploymentRecord::defaults_for(DeploymentEnv::Main).chain_id, 88888);
    }
}
