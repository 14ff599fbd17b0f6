use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use lanxpert_auth::AuthError;
use lanxpert_backend_api::{build_router, AppState, SUPER_ADMIN_ROLE};
use lanxpert_backend_runtime::{telemetry, BackendServices};
use lanxpert_config::{load as load_config, AppConfig};
use lanxpert_database::{
    seed_reference_data, ArticleRepository, ChatRepository, ChatType, QuestionRepository, UserRepository,
    WordRepository,
};
use tokio::net::TcpListener;
use tracing::info;

#[derive(Parser)]
#[command(name = "lanxpert-backend")]
#[command(about = "LanXpert backend (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Insert or refresh languages, plans and roles
    Seed,
    /// Create an account holding the admin role, or grant the role to an existing one
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Remove empty matchmaking queues and repair overfull ones
    CleanupChats,
    /// Print row counts for the main tables
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;
    let config = load_config().context("failed to load configuration")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await,
        Commands::Seed => seed(config).await,
        Commands::CreateAdmin {
            username,
            email,
            password,
        } => create_admin(config, &username, &email, &password).await,
        Commands::CleanupChats => cleanup_chats(config).await,
        Commands::Stats => print_stats(config).await,
    }
}

async fn services(config: &AppConfig) -> anyhow::Result<BackendServices> {
    BackendServices::initialise(config)
        .await
        .context("failed to initialise backend services")
}

async fn run_server(config: AppConfig) -> anyhow::Result<()> {
    info!("starting LanXpert backend");

    let services = services(&config).await?;
    let address = format!("{}:{}", config.http.address, config.http.port);

    let state = AppState::new(services.db_pool.clone(), services.authenticator.clone(), Arc::new(config));
    let app = build_router(state);

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(lanxpert_backend_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("backend shut down");
    Ok(())
}

async fn seed(config: AppConfig) -> anyhow::Result<()> {
    let services = services(&config).await?;
    let summary = seed_reference_data(&services.db_pool)
        .await
        .context("failed to seed reference data")?;

    println!(
        "Seeded {} languages, {} plans and {} roles",
        summary.languages, summary.plans, summary.roles
    );
    Ok(())
}

async fn create_admin(config: AppConfig, username: &str, email: &str, password: &str) -> anyhow::Result<()> {
    let services = services(&config).await?;
    let users = UserRepository::new(services.db_pool.clone());

    let user = match services.authenticator.register(username, email, password).await {
        Ok(user) => user,
        Err(AuthError::UserExists(reason)) => {
            info!(%reason, "account exists, granting role only");
            users
                .find_by_login(username)
                .await?
                .context("an account with that email exists under another username")?
        }
        Err(AuthError::Validation(errors)) => {
            anyhow::bail!("invalid account details: {}", errors.join("; "))
        }
        Err(other) => return Err(other).context("failed to create account"),
    };

    users
        .assign_role(&user.id, SUPER_ADMIN_ROLE)
        .await
        .context("failed to grant admin role")?;

    println!("{} ({}) is now an admin", user.username, user.id);
    Ok(())
}

async fn cleanup_chats(config: AppConfig) -> anyhow::Result<()> {
    let services = services(&config).await?;
    let (deleted, promoted) = ChatRepository::new(services.db_pool.clone())
        .cleanup_queues()
        .await
        .context("failed to clean up chat queues")?;

    info!(deleted, promoted, "chat queues cleaned");
    println!("Deleted {deleted} empty queues, promoted {promoted} queues to random chats");
    Ok(())
}

async fn print_stats(config: AppConfig) -> anyhow::Result<()> {
    let services = services(&config).await?;
    let pool = services.db_pool.clone();
    let chats = ChatRepository::new(pool.clone());

    let rows = [
        ("users", UserRepository::new(pool.clone()).count().await?),
        ("words", WordRepository::new(pool.clone()).count().await?),
        ("questions", QuestionRepository::new(pool.clone()).count().await?),
        ("articles", ArticleRepository::new(pool).count().await?),
        ("waiting queues", chats.count_by_type(ChatType::RandomQueue).await?),
        ("random chats", chats.count_by_type(ChatType::Random).await?),
        ("direct chats", chats.count_by_type(ChatType::Direct).await?),
        ("ended chats", chats.count_by_type(ChatType::Terminated).await?),
    ];

    println!("{:<16} {:>8}", "Table", "Rows");
    println!("{}", "-".repeat(25));
    for (name, count) in rows {
        println!("{name:<16} {count:>8}");
    }
    Ok(())
}
