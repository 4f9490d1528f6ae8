//! `duprule` - deactivate a Duplicate Rule in a Salesforce org.
//!
//! ```sh
//! duprule --name Account.CRM_Account_Rule_1 --target-org my-sandbox
//! ```
//!
//! Without `--target-org` the session comes from `SF_AUTH_URL`, then
//! `SF_INSTANCE_URL`/`SF_ACCESS_TOKEN`, then the sf CLI's default org.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use duprule::auth::SalesforceCredentials;
use duprule::metadata::MetadataClient;
use duprule::{ConsoleProgress, DeactivateConfig, Deactivator, RuleName};

#[derive(Parser, Debug)]
#[command(name = "duprule")]
#[command(author, version, about = "Deactivate a Salesforce Duplicate Rule", long_about = None)]
struct Cli {
    /// Duplicate Rule API name, e.g. Account.CRM_Account_Rule_1
    #[arg(short, long)]
    name: String,

    /// sf CLI alias or username of the org
    #[arg(short = 'u', long)]
    target_org: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging (when RUST_LOG is unset)
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    match run(&cli).await {
        Ok(payload) => {
            if cli.json {
                println!("{}", payload);
            }
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: &Cli) -> Result<String, Box<dyn std::error::Error>> {
    let name = RuleName::new(&cli.name)?;

    let creds = SalesforceCredentials::resolve(cli.target_org.as_deref()).await?;
    let client = MetadataClient::new(&creds)?;

    let progress = if cli.json {
        ConsoleProgress::quiet()
    } else {
        ConsoleProgress::stdout()
    };
    let deactivator = Deactivator::new(client, progress, DeactivateConfig::default());

    let outcome = deactivator.deactivate(&name).await?;
    Ok(serde_json::to_string(&outcome.status())?)
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
