use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roastmycv_client::{ClientError, CvFile, LocalHistory, PromptWallet, ReviewClient};

#[derive(Parser)]
#[command(name = "roastmycv", version)]
#[command(about = "Get a brutally honest CV review, paid in STX")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Review service base URL
    #[arg(long, env = "ROASTMYCV_URL", default_value = "http://localhost:3000")]
    url: String,

    /// Where finished reviews are kept
    #[arg(long, env = "ROASTMYCV_HISTORY_DIR", default_value = "./.roastmycv")]
    history_dir: PathBuf,
}

#[derive(Subcommand)]
enum Command {
    /// Upload a PDF CV, pay for the review and save the result
    Review {
        file: PathBuf,
        /// STX address to pay from
        #[arg(long, env = "STX_ADDRESS")]
        address: Option<String>,
    },
    /// List saved reviews, newest first
    History,
    /// Print a saved review
    Show { id: String },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn,roastmycv_client=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        match e {
            ClientError::PaymentRequired {
                ref requirement,
                ref message,
            } => {
                eprintln!("Payment required: {message}");
                eprintln!(
                    "  {} microSTX to {} on {}",
                    requirement.amount, requirement.pay_to, requirement.network
                );
            }
            ref other => eprintln!("Error: {other}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), ClientError> {
    let history = LocalHistory::new(cli.history_dir);

    match cli.command {
        Command::Review { file, address } => {
            let client = ReviewClient::new(cli.url)?;
            let wallet = PromptWallet::stdin(address);
            let cv = CvFile::from_path(&file).await?;

            let stored = client.review(&wallet, &cv, &history).await?;
            println!("{}", serde_json::to_string_pretty(&stored.review)?);
            println!();
            println!("Saved as {}", history.path_for(&stored.id).display());
        }
        Command::History => {
            let reviews = history.list()?;
            if reviews.is_empty() {
                println!("No saved reviews in {}", history.dir().display());
            }
            for review in reviews {
                let score = review
                    .average_score()
                    .map(|s| format!("{s:.1}/10"))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{}  {}  {:>7}  {}",
                    review.id, review.created_at, score, review.filename
                );
            }
        }
        Command::Show { id } => match history.get(&id)? {
            Some(review) => println!("{}", serde_json::to_string_pretty(&review)?),
            None => {
                eprintln!("No saved review with id {id}");
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
