use clap::{Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "task-cli")]
#[command(about = "Command-line client for the task service", long_about = None)]
struct Cli {
    #[arg(short, long, env = "TASK_SERVICE_URL", default_value = "http://localhost:8000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check service and database health
    Health,
    /// List all tasks, newest first
    List,
    /// Create a task
    Add {
        /// Task title (1-200 characters)
        title: String,
    },
    /// Mark a task as done
    Done {
        /// Task id
        id: i64,
    },
    /// Dump Prometheus metrics
    Metrics,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Health => client.get(format!("{base}/health")).send().await?,
        Commands::List => client.get(format!("{base}/tasks")).send().await?,
        Commands::Add { title } => {
            client
                .post(format!("{base}/tasks"))
                .json(&json!({ "title": title }))
                .send()
                .await?
        }
        Commands::Done { id } => client.patch(format!("{base}/tasks/{id}/done")).send().await?,
        Commands::Metrics => {
            let res = client.get(format!("{base}/metrics")).send().await?;
            let status = res.status();
            let text = res.text().await?;
            if !status.is_success() {
                return Err(format!("service returned status {status}: {text}").into());
            }
            print!("{text}");
            return Ok(());
        }
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        return Err(format!("service returned status {status}: {text}").into());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
