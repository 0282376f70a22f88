use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use eth_keystore::decrypt_key;
use ethers::signers::LocalWallet;
use rpassword::prompt_password;
use std::{
    fs,
    path::{
        Path,
        PathBuf,
    },
};

#[derive(Clone, Debug)]
pub struct WalletDescriptor {
    pub name: String,
    pub path: PathBuf,
}

impl WalletDescriptor {
    pub fn new(name: impl Into<String>, path: PathBuf) -> Self {
        Self {
            name: name.into(),
            path,
        }
    }
}

pub fn default_wallet_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").wrap_err("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".fanpredix").join("wallets"))
}

pub fn resolve_wallet_dir(dir: Option<&str>) -> Result<PathBuf> {
    match dir {
        Some(raw) => {
            let expanded = shellexpand::tilde(raw);
            Ok(PathBuf::from(expanded.into_owned()))
        }
        None => default_wallet_dir(),
    }
}

pub fn list_wallets(dir: &Path) -> Result<Vec<WalletDescriptor>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut wallets = Vec::new();
    for entry in fs::read_dir(dir).wrap_err("Failed to read wallet directory")? {
        let entry = entry.wrap_err("Failed to read wallet entry")?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
            continue;
        }
        let name = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .ok_or_else(|| eyre!("Invalid wallet filename {:?}", path))?
            .to_owned();
        wallets.push(WalletDescriptor::new(name, path));
    }
    wallets.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(wallets)
}

pub fn find_wallet(dir: &Path, name: &str) -> Result<WalletDescriptor> {
    let wallets = list_wallets(dir)?;
    wallets
        .into_iter()
        .find(|w| w.name == name)
        .ok_or_else(|| eyre!("Wallet '{name}' not found in {}", dir.to_string_lossy()))
}

pub fn unlock_wallet(descriptor: &WalletDescriptor) -> Result<LocalWallet> {
    let prompt = format!("Enter password for wallet '{}': ", descriptor.name);
    let password = prompt_password(prompt).wrap_err("Failed to read wallet password")?;

    let secret = decrypt_key(&descriptor.path, password.as_bytes())
        .map_err(|_| eyre!("Invalid password for wallet '{}'", descriptor.name))?;

    LocalWallet::from_bytes(&secret).map_err(|_| {
        eyre!(
            "Wallet '{}' contained unsupported key material",
            descriptor.name
        )
    })
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]
    use super::*;
    use std::fs::File;

    #[test]
    fn list_wallets__empty_for_missing_directory() {
        // given
        let dir = Path::new("/definitely/not/a/real/wallet/dir");

        // when
        let wallets = list_wallets(dir).unwrap();

        // then
        assert!(wallets.is_empty());
    }

    #[test]
    fn list_wallets__sorted_and_filtered_to_keystore_files() {
        // given
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("zeta.json")).unwrap();
        File::create(dir.path().join("alpha.json")).unwrap();
        File::create(dir.path().join("notes.txt")).unwrap();

        // when
        let wallets = list_wallets(dir.path()).unwrap();

        // then
        let names: Vec<_> = wallets.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn find_wallet__errors_for_unknown_name() {
        // given
        let dir = tempfile::tempdir().unwrap();
        File::create(dir.path().join("alpha.json")).unwrap();

        // when
        let result = find_wallet(dir.path(), "beta");

        // then
        assert!(result.is_err());
    }
}
