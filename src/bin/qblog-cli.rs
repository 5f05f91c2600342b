use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use qblog::api::{ApiClient, BlogQuery, BlogUpdate, NewBlog};
use qblog::config::load_or_default;
use qblog::observability::logging;
use qblog::session::{FileTokenStore, Session};

#[derive(Parser)]
#[command(name = "qblog-cli")]
#[command(about = "Command-line client for the qblog API", long_about = None)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `api.base_url`.
    #[arg(short, long)]
    url: Option<String>,

    /// Override `session.token_path`.
    #[arg(long)]
    token_file: Option<PathBuf>,

    /// Log API attempts to stderr.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and persist the token
    Login { username: String, password: String },
    /// Forget the persisted token
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Create an account (does not log in)
    Register {
        username: String,
        email: String,
        password: String,
    },
    /// List blog posts
    List {
        #[arg(long)]
        skip: Option<u32>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        author_id: Option<String>,
        #[arg(long)]
        tag: Option<String>,
    },
    /// Show one blog post
    Get { id: String },
    /// Publish a blog post
    Create {
        title: String,
        content: String,
        #[arg(long, value_delimiter = ',')]
        tags: Vec<String>,
    },
    /// Edit a blog post
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long, value_delimiter = ',')]
        tags: Option<Vec<String>>,
    },
    /// Delete a blog post
    Delete { id: String },
    /// List the posts of a user
    UserBlogs { username: String },
    /// List users
    Users {
        #[arg(long)]
        username: Option<String>,
    },
    /// Check connectivity to the API and print a JSON report
    Doctor,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(url) = cli.url {
        config.api.base_url = url;
    }
    if cli.verbose {
        logging::init_logging(&config.observability.log_level);
    }

    let token_path = cli
        .token_file
        .unwrap_or_else(|| PathBuf::from(&config.session.token_path));
    let api = ApiClient::from_config(&config.api)?;
    let session = Session::new(api, Arc::new(FileTokenStore::new(token_path)));

    // Doctor reports on the stored token as-is; restoring could clear it.
    if !matches!(cli.command, Commands::Doctor) {
        session.restore().await;
    }

    let api = session.api();
    let token = session.token();
    let token = token.as_deref();

    match cli.command {
        Commands::Login { username, password } => {
            let user = session.login(&username, &password).await.into_result()?;
            print_json(&user)?;
        }
        Commands::Logout => {
            session.logout();
            println!("Logged out");
        }
        Commands::Whoami => match session.user() {
            Some(user) => print_json(&user)?,
            None => return Err("Not logged in".into()),
        },
        Commands::Register {
            username,
            email,
            password,
        } => {
            let user = session.register(&username, &email, &password).await.into_result()?;
            print_json(&user)?;
        }
        Commands::List {
            skip,
            limit,
            author_id,
            tag,
        } => {
            let query = BlogQuery {
                skip,
                limit,
                author_id,
                tag,
            };
            print_json(&api.list_blogs(&query).await?)?;
        }
        Commands::Get { id } => print_json(&api.get_blog(&id).await?)?,
        Commands::Create { title, content, tags } => {
            let blog = NewBlog { title, content, tags };
            print_json(&api.create_blog(token, &blog).await?)?;
        }
        Commands::Update {
            id,
            title,
            content,
            tags,
        } => {
            let update = BlogUpdate { title, content, tags };
            print_json(&api.update_blog(token, &id, &update).await?)?;
        }
        Commands::Delete { id } => {
            api.delete_blog(token, &id).await?;
            println!("Deleted {id}");
        }
        Commands::UserBlogs { username } => print_json(&api.user_blogs(&username).await?)?,
        Commands::Users { username } => print_json(&api.list_users(username.as_deref()).await?)?,
        Commands::Doctor => doctor(api, token).await?,
    }

    Ok(())
}

async fn doctor(api: &ApiClient, token: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let report = api.connectivity_report(token).await;
    let diagnostics = match api.diagnostics().await {
        Ok(diagnostics) => serde_json::to_value(diagnostics)?,
        Err(e) => serde_json::json!({ "error": e.to_string() }),
    };
    print_json(&serde_json::json!({
        "timestamp": report.timestamp,
        "tests": report.checks,
        "diagnostics": diagnostics,
    }))?;

    if report.all_passed() {
        Ok(())
    } else {
        Err("one or more connectivity checks failed".into())
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
