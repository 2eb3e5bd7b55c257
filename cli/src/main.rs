//! `crowd`: command line front end for the CrowdHelping toolkit.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use ethers::types::{Address, Bytes, U256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use crowd_account::create_smart_account;
use crowd_bundler::{classify, UserOperationSubmitter};
use crowd_config::AppConfig;
use crowd_dao::{ActivityQueries, DaoContract, DaoError, DaoReader, DaoWriter};
use crowd_delegation::CaveatBuilder;
use crowd_deployer::{
    format_summary, format_table, AddressMap, ArtifactDir, DeployError, EthersDeployer, FrameworkDeployer,
};
use crowd_session::{DaoSession, RedeemPath, TracingNotifier};
use crowd_signatory::SignatoryName;
use crowd_types::{Call, FeeQuote, Network, Notifier, UserOperationReceipt};
use crowd_utils::{init_tracing, LogFormat};
use crowd_verification::ProofPayload;

#[derive(Parser)]
#[command(name = "crowd", about = "CrowdHelping DAO client: identity, smart accounts, delegations")]
struct Cli {
    /// TOML configuration file. Without it, configuration comes from
    /// `CROWD_*` environment variables (and `.env`).
    #[arg(long, env = "CROWD_CONFIG")]
    config: Option<PathBuf>,

    /// Default log level when `RUST_LOG` is unset.
    #[arg(long, default_value = "info", env = "CROWD_LOG_LEVEL")]
    log_level: String,

    /// Log output: "human" or "json".
    #[arg(long, default_value = "human", env = "CROWD_LOG_FORMAT")]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the resolved configuration as TOML.
    Config,

    /// Check a proof-of-personhood proof with the verification service.
    Verify {
        /// JSON file with merkle_root, nullifier_hash, proof, verification_level.
        #[arg(long)]
        proof: PathBuf,
    },

    /// Smart account helpers.
    Account {
        #[command(subcommand)]
        action: AccountAction,
    },

    /// Create, sign and redeem a delegation in one go.
    Delegation(DelegationArgs),

    /// Read and write DAO activities.
    Dao {
        /// Signatory owning the account that sends writes.
        #[arg(long, default_value = "burner", value_parser = parse_signatory)]
        signatory: SignatoryName,

        /// Proof to verify before a write, when identity verification is configured.
        #[arg(long)]
        proof: Option<PathBuf>,

        #[command(subcommand)]
        action: DaoAction,
    },

    /// Deploy the delegation framework contracts.
    DeployFramework(DeployArgs),
}

#[derive(Subcommand)]
enum AccountAction {
    /// Derive a throwaway counterfactual account with a fresh key.
    Create,
    /// Log in with a signatory and derive its delegator account.
    Delegator {
        #[arg(long, default_value = "burner", value_parser = parse_signatory)]
        signatory: SignatoryName,
        /// Also deploy the account if it is still counterfactual.
        #[arg(long)]
        deploy: bool,
    },
}

#[derive(Args)]
struct DelegationArgs {
    #[arg(long, default_value = "burner", value_parser = parse_signatory)]
    signatory: SignatoryName,

    /// Contract the delegated execution calls. Always the only allowed target.
    #[arg(long, value_parser = parse_address)]
    target: Address,

    /// Hex calldata of the execution.
    #[arg(long, default_value = "0x", value_parser = parse_bytes)]
    calldata: Bytes,

    /// Wei sent with the execution.
    #[arg(long, default_value = "0", value_parser = parse_u256)]
    value: U256,

    /// Restrict to these methods (signatures or 0x selectors).
    #[arg(long, value_delimiter = ',')]
    methods: Vec<String>,

    /// Largest value a redemption may send, in wei.
    #[arg(long, value_parser = parse_u256)]
    max_value: Option<U256>,

    /// How many times the delegation may be redeemed.
    #[arg(long)]
    max_calls: Option<u64>,

    /// Seconds from now the delegation stays valid.
    #[arg(long)]
    valid_for: Option<u64>,
}

#[derive(Subcommand)]
enum DaoAction {
    /// Number of activities.
    Count,
    /// One activity.
    Get { id: u64 },
    /// Several activities, fetched concurrently. Defaults to every id.
    List {
        #[arg(long, value_delimiter = ',')]
        ids: Vec<u64>,
    },
    /// Whether `voter` voted on activity `id`.
    HasVoted {
        id: u64,
        #[arg(value_parser = parse_address)]
        voter: Address,
    },
    /// Propose an activity.
    Create {
        #[arg(long)]
        description: String,
        #[arg(long, value_parser = parse_u256)]
        amount: U256,
    },
    /// Vote on an activity.
    Vote {
        id: u64,
        /// Vote against instead of for.
        #[arg(long)]
        against: bool,
    },
    /// DAO token transfer.
    Transfer {
        #[arg(long, value_parser = parse_address)]
        to: Address,
        #[arg(long, value_parser = parse_u256)]
        amount: U256,
    },
    /// Plain value transfer from the account.
    TransferNative {
        #[arg(long, value_parser = parse_address)]
        to: Address,
        #[arg(long, value_parser = parse_u256)]
        value: U256,
    },
}

#[derive(Args)]
struct DeployArgs {
    #[arg(long, env = "CROWD_RPC_URL")]
    rpc_url: String,

    /// Chain id or network name.
    #[arg(long, env = "CROWD_CHAIN_ID", value_parser = parse_chain_id)]
    chain_id: u64,

    #[arg(long, env = "DEPLOYER_PRIVATE_KEY", hide_env_values = true)]
    private_key: String,

    /// Compiled artifact directory.
    #[arg(long, default_value = "out")]
    artifacts: PathBuf,

    /// JSON map of contracts that are already deployed.
    #[arg(long)]
    existing: Option<PathBuf>,

    /// Write the resulting account environment here as JSON.
    #[arg(long)]
    output: Option<PathBuf>,

    #[arg(long, requires = "priority_fee_gwei")]
    max_fee_gwei: Option<String>,

    #[arg(long, requires = "max_fee_gwei")]
    priority_fee_gwei: Option<String>,
}

fn parse_address(s: &str) -> Result<Address, String> {
    s.parse::<Address>().map_err(|e| format!("invalid address {s}: {e}"))
}

fn parse_u256(s: &str) -> Result<U256, String> {
    U256::from_dec_str(s).map_err(|e| format!("invalid amount {s}: {e}"))
}

fn parse_bytes(s: &str) -> Result<Bytes, String> {
    s.parse::<Bytes>().map_err(|e| format!("invalid hex {s}: {e}"))
}

fn parse_signatory(s: &str) -> Result<SignatoryName, String> {
    s.parse::<SignatoryName>().map_err(|e| e.to_string())
}

fn parse_chain_id(s: &str) -> Result<u64, String> {
    s.parse::<u64>()
        .or_else(|_| s.parse::<Network>().map(|n| n.chain_id()))
        .map_err(|e| e.to_string())
}

fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_toml_file(path)?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

fn print_receipt(receipt: &UserOperationReceipt, network: Option<Network>) {
    let tx = receipt.transaction_hash();
    println!("user operation: {:?}", receipt.user_op_hash);
    match network.and_then(|n| n.explorer_url()) {
        Some(base) => println!("transaction:    {base}/tx/{tx:?}"),
        None => println!("transaction:    {tx:?}"),
    }
}

fn unix_now() -> anyhow::Result<u64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(LogFormat::parse(&cli.log_format), &cli.log_level);

    let config = || load_config(cli.config.as_deref());
    match cli.command {
        Command::Config => {
            print!("{}", config()?.to_toml_string()?);
            Ok(())
        }
        Command::Verify { proof } => verify(&config()?, &proof).await,
        Command::Account { action } => account(&config()?, action).await,
        Command::Delegation(args) => delegation(&config()?, args).await,
        Command::Dao { signatory, proof, action } => dao(&config()?, signatory, proof.as_deref(), action).await,
        Command::DeployFramework(args) => deploy_framework(args).await,
    }
}

fn read_proof(path: &Path) -> anyhow::Result<ProofPayload> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).context("parsing proof")
}

async fn verify(config: &AppConfig, proof: &Path) -> anyhow::Result<()> {
    let payload = read_proof(proof)?;
    let session = DaoSession::from_config(config)?;
    let identity = session.verify_identity(&payload).await?;
    println!("verified {} ({})", identity.nullifier_hash, identity.level);
    Ok(())
}

async fn account(config: &AppConfig, action: AccountAction) -> anyhow::Result<()> {
    match action {
        AccountAction::Create => {
            let account = create_smart_account(config.environment.clone())?;
            println!("address: {:?}", account.address);
            println!("owner:   {:?}", account.owner());
            if let Some(link) = config.network().and_then(|n| account.explorer_link(n)) {
                println!("explorer: {link}");
            }
        }
        AccountAction::Delegator { signatory, deploy } => {
            let session = DaoSession::from_config(config)?;
            session.select_signatory(signatory);
            let address = session.create_delegator().await?;
            println!("delegator: {address:?}");
            if deploy {
                match session.deploy_delegator().await? {
                    Some(receipt) => print_receipt(&receipt, config.network()),
                    None => println!("already deployed"),
                }
            }
            println!("status:    {}", session.snapshot().delegator_status);
        }
    }
    Ok(())
}

async fn delegation(config: &AppConfig, args: DelegationArgs) -> anyhow::Result<()> {
    let session = DaoSession::from_config(config)?;
    let delegate = session.initialize()?;
    session.select_signatory(args.signatory);
    let delegator = session.create_delegator().await?;
    println!("delegate:  {delegate:?}");
    println!("delegator: {delegator:?}");
    session.deploy_delegator().await?;

    let mut caveats = CaveatBuilder::new(&config.environment).allowed_targets(&[args.target])?;
    if !args.methods.is_empty() {
        let methods: Vec<&str> = args.methods.iter().map(String::as_str).collect();
        caveats = caveats.allowed_methods(&methods)?;
    }
    if let Some(max) = args.max_value {
        caveats = caveats.value_lte(max)?;
    }
    if let Some(limit) = args.max_calls {
        caveats = caveats.limited_calls(limit)?;
    }
    if let Some(secs) = args.valid_for {
        let now = unix_now()?;
        caveats = caveats.timestamp(u128::from(now.saturating_sub(1)), u128::from(now + secs))?;
    }

    session.create_delegation(caveats.build())?;
    session.sign_delegation().await?;
    println!("delegation signed ({} redeem)", match session.redeem_path() {
        RedeemPath::DelegationChain => "delegation manager",
        RedeemPath::DirectCall => "direct",
    });

    let execution = Call::new(args.target).with_value(args.value).with_data(args.calldata);
    match session.redeem_delegation(execution).await? {
        Some(receipt) => {
            print_receipt(&receipt, config.network());
            Ok(())
        }
        None => bail!("delegation could not be redeemed: delegator is not deployed"),
    }
}

async fn dao(
    config: &AppConfig,
    signatory: SignatoryName,
    proof: Option<&Path>,
    action: DaoAction,
) -> anyhow::Result<()> {
    let contract = DaoContract::new(config.dao_contract);
    let chain = Arc::new(crowd_bundler::EthersChain::connect(&config.rpc_url)?);
    let reader = DaoReader::new(contract, chain);

    let write = match action {
        DaoAction::Count => {
            println!("{}", reader.activity_count().await?);
            return Ok(());
        }
        DaoAction::Get { id } => {
            let activity = reader.fetch_activity(id).await?;
            println!("{}", serde_json::to_string_pretty(&activity)?);
            return Ok(());
        }
        DaoAction::List { ids } => {
            let ids = if ids.is_empty() {
                (1..=reader.activity_count().await?).collect()
            } else {
                ids
            };
            let batch = ActivityQueries::new(reader).fetch_batch(&ids).await;
            for (id, result) in &batch.results {
                match result {
                    Ok(a) => println!("#{id:<4} {:<40} amount {} votes {}", a.description, a.amount, a.votes),
                    Err(e) => println!("#{id:<4} error: {e}"),
                }
            }
            if batch.status.error {
                bail!("some activities failed to load");
            }
            return Ok(());
        }
        DaoAction::HasVoted { id, voter } => {
            println!("{}", reader.has_voted(id, voter).await?);
            return Ok(());
        }
        write => write,
    };

    let session = DaoSession::from_config(config)?;
    if let Some(path) = proof {
        session.verify_identity(&read_proof(path)?).await?;
    }
    session.require_verified()?;
    session.select_signatory(signatory);
    session.create_delegator().await?;
    let account = session
        .delegator()
        .context("no delegator account after login")?;

    let notifier = Arc::new(TracingNotifier);
    let writer = DaoWriter::new(
        contract,
        Arc::new(UserOperationSubmitter::from_config(config)?),
        notifier.clone(),
    );
    let result = match write {
        DaoAction::Create { description, amount } => writer.create_activity(&account, &description, amount).await,
        DaoAction::Vote { id, against } => writer.vote(&account, id, !against).await,
        DaoAction::Transfer { to, amount } => writer.transfer(&account, to, amount).await,
        DaoAction::TransferNative { to, value } => writer.transfer_native(&account, to, value).await,
        _ => unreachable!("reads return early"),
    };
    match result {
        Ok(receipt) => {
            print_receipt(&receipt, config.network());
            Ok(())
        }
        Err(e) => {
            if let DaoError::Bundler(inner) = &e {
                notifier.notify(classify(inner).notice());
            }
            Err(e.into())
        }
    }
}

async fn deploy_framework(args: DeployArgs) -> anyhow::Result<()> {
    let fees = match (&args.max_fee_gwei, &args.priority_fee_gwei) {
        (Some(max), Some(priority)) => Some(FeeQuote::new(
            ethers::utils::parse_units(max, "gwei")?.into(),
            ethers::utils::parse_units(priority, "gwei")?.into(),
        )),
        _ => None,
    };
    let existing: AddressMap = match &args.existing {
        Some(path) => {
            let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_json::from_str(&raw).context("parsing existing address map")?
        }
        None => AddressMap::new(),
    };

    let deployer = EthersDeployer::connect(&args.rpc_url, &args.private_key, args.chain_id)?.with_fees(fees);
    let framework = FrameworkDeployer::new(Arc::new(deployer), Arc::new(ArtifactDir::new(&args.artifacts)));
    tracing::info!(
        chain_id = args.chain_id,
        contracts = framework.plan().len(),
        existing = existing.len(),
        "deploying delegation framework"
    );

    let report = match framework.deploy_all(existing).await {
        Ok(report) => report,
        Err(e) => {
            if let DeployError::Aborted { partial, .. } = &e {
                eprintln!("Deployed before the failure:\n{}", format_table(partial));
            }
            return Err(e.into());
        }
    };
    println!("{}", format_summary(&report));

    if let Some(path) = &args.output {
        let environment = serde_json::to_string_pretty(&report.environment())?;
        std::fs::write(path, environment).with_context(|| format!("writing {}", path.display()))?;
        println!("environment written to {}", path.display());
    }
    Ok(())
}
