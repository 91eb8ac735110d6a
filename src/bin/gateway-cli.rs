use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Inspection CLI for the catalog gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness and uptime
    Status,
    /// Cache, circuit breaker and last fetch state
    Health,
    /// Fetch one page of validated products
    Products {
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 10)]
        limit: usize,
        #[arg(long)]
        category: Option<String>,
        /// Skip the primary cache and go to the upstream
        #[arg(long)]
        bypass_cache: bool,
    },
    /// Aggregate statistics over the catalog
    Summary {
        #[arg(long)]
        bypass_cache: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Status => client.get(format!("{base}/status")),
        Commands::Health => client.get(format!("{base}/health")),
        Commands::Products {
            page,
            limit,
            category,
            bypass_cache,
        } => {
            let mut query = vec![
                ("page", page.to_string()),
                ("limit", limit.to_string()),
                ("bypass_cache", bypass_cache.to_string()),
            ];
            if let Some(category) = category {
                query.push(("category", category));
            }
            client.get(format!("{base}/data/products")).query(&query)
        }
        Commands::Summary { bypass_cache } => client
            .get(format!("{base}/data/summary"))
            .query(&[("bypass_cache", bypass_cache.to_string())]),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
