use color_eyre::eyre::{
    Result,
    eyre,
};
use fanpredix::{
    client,
    deployment,
    gateway,
    wallets,
};

const LOG_DIR: &str = ".logs";

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: fanpredix [--mainnet | --testnet | --local] [--rpc-url <url>]\n\
         [--wallet <name>] [--wallet-dir <path>]\n\
         \n\
         Flags:\n\
           --mainnet           Connect to Chiliz mainnet (default RPC {})\n\
           --testnet           Connect to the Spicy testnet (default RPC {})\n\
           --local             Connect to a local node (default RPC {})\n\
           --rpc-url <url>     Override the RPC URL for the selected network\n\
           --wallet <name>     Keystore wallet to sign with\n\
           --wallet-dir <path> Override the keystore directory (defaults to ~/.fanpredix/wallets)",
        deployment::DeploymentEnv::Main.default_network_url(),
        deployment::DeploymentEnv::Test.default_network_url(),
        deployment::DeploymentEnv::Local.default_network_url(),
    );
    std::process::exit(0);
}

fn parse_cli_args() -> Result<client::AppConfig> {
    let mut args = std::env::args().skip(1);
    let mut env: Option<deployment::DeploymentEnv> = None;
    let mut custom_url: Option<String> = None;
    let mut wallet_dir: Option<String> = None;
    let mut wallet_name: Option<String> = None;

    let set_env = |current: &mut Option<deployment::DeploymentEnv>,
                       chosen: deployment::DeploymentEnv|
     -> Result<()> {
        if current.is_some() {
            return Err(eyre!(
                "Multiple network flags provided; choose one of --mainnet/--testnet/--local"
            ));
        }
        *current = Some(chosen);
        Ok(())
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--mainnet" => set_env(&mut env, deployment::DeploymentEnv::Main)?,
            "--testnet" => set_env(&mut env, deployment::DeploymentEnv::Test)?,
            "--local" => set_env(&mut env, deployment::DeploymentEnv::Local)?,
            "--rpc-url" => {
                let url = args
                    .next()
                    .ok_or_else(|| eyre!("--rpc-url requires a URL argument"))?;
                if custom_url.is_some() {
                    return Err(eyre!("--rpc-url may only be specified once"));
                }
                if env.is_none() {
                    return Err(eyre!(
                        "--rpc-url must follow a network flag (--mainnet/--testnet/--local)"
                    ));
                }
                custom_url = Some(url);
            }
            "--wallet-dir" => {
                let dir = args
                    .next()
                    .ok_or_else(|| eyre!("--wallet-dir requires a path argument"))?;
                if wallet_dir.is_some() {
                    return Err(eyre!("--wallet-dir may only be specified once"));
                }
                wallet_dir = Some(dir);
            }
            "--wallet" => {
                let name = args
                    .next()
                    .ok_or_else(|| eyre!("--wallet requires a wallet name"))?;
                if wallet_name.is_some() {
                    return Err(eyre!("--wallet may only be specified once"));
                }
                wallet_name = Some(name);
            }
            "--help" | "-h" => print_usage_and_exit(),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    let env = env.ok_or_else(|| {
        eyre!("Select a network with --mainnet, --testnet, or --local")
    })?;
    let name = wallet_name
        .ok_or_else(|| eyre!("Specify --wallet <name> to select a keystore wallet"))?;
    let dir = wallets::resolve_wallet_dir(wallet_dir.as_deref())?;

    Ok(client::AppConfig {
        env,
        rpc_url: custom_url,
        wallet: gateway::WalletConfig { name, dir },
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    // The TUI owns stdout, so logs go to a rolling file.
    let file_appender = tracing_appender::rolling::daily(LOG_DIR, "fanpredix.log");
    let (writer, _log_guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(writer)
        .with_ansi(false)
        .init();
    tracing::info!("starting fanpredix client");

    let app_config = parse_cli_args()?;
    client::run_app(app_config).await
}
