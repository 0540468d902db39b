use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use repokit::models::{schema::CREATE_TABLES, User, UserController, UserRepository};
use repokit::{session_scope, Settings, SessionKeeper, SynchronizeSession};
use repokit_core::{Attributes, OrderSpec, QueryOptions, Record, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// repokit - Generic repository and session machinery over SQLite
#[derive(Parser, Debug)]
#[command(name = "repokit")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Writer database URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Log every executed statement
    #[arg(long, env = "DATABASE_ECHO")]
    echo: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the demo tables
    Init,
    /// Insert a user, or update the one with the same name
    Add {
        name: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// List users
    List {
        #[arg(long)]
        skip: Option<u64>,
        #[arg(long)]
        limit: Option<u64>,
        /// Order spec as JSON, e.g. '{"desc": ["name"]}'
        #[arg(long)]
        order: Option<String>,
    },
    /// Show one user
    Show { id: i64 },
    /// Rename a user
    Rename { id: i64, name: String },
    /// Delete users by id
    Remove {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    if let Some(url) = cli.database_url.clone() {
        settings.reader_url = url.clone();
        settings.database_url = url;
    }
    settings.echo |= cli.echo;

    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let keeper = Arc::new(SessionKeeper::new(&settings)?);
    let outcome = run(cli.command, &keeper).await;
    keeper.shutdown().await;
    outcome
}

async fn run(command: Command, keeper: &Arc<SessionKeeper>) -> Result<()> {
    match command {
        Command::Init => {
            session_scope(keeper, |session| async move {
                session.execute_script(CREATE_TABLES).await?;
                session.commit().await?;
                Ok::<_, anyhow::Error>(())
            })
            .await?;
            tracing::info!("Schema created");
        }
        Command::Add { name, email } => {
            let attributes = Attributes::from([
                ("name".to_string(), Value::from(name)),
                ("email".to_string(), Value::from(email)),
            ]);
            let user = with_users(keeper, |users| async move {
                users
                    .upsert(&["name"], attributes, &BTreeSet::new())
                    .await
                    .map_err(anyhow::Error::from)
            })
            .await?;
            print_json(&user)?;
        }
        Command::List { skip, limit, order } => {
            let mut options = QueryOptions {
                skip,
                limit,
                ..QueryOptions::default()
            };
            if let Some(order) = order {
                let json: serde_json::Value =
                    serde_json::from_str(&order).context("--order is not valid JSON")?;
                options.order = Some(OrderSpec::from_json(&json)?);
            }
            let users = with_users(keeper, |users| async move {
                users.get_many(&options).await.map_err(anyhow::Error::from)
            })
            .await?;
            print_json(&users)?;
        }
        Command::Show { id } => {
            let user = with_users(keeper, |users| async move {
                users
                    .get_by_id(id, BTreeSet::new())
                    .await
                    .map_err(anyhow::Error::from)
            })
            .await?;
            print_json(&user)?;
        }
        Command::Rename { id, name } => {
            let user = with_users(keeper, |users| async move {
                let updated = users
                    .repository()
                    .update(
                        vec![User::column("id").eq(id)],
                        Attributes::from([("name".to_string(), Value::from(name))]),
                        true,
                    )
                    .await?;
                updated.ok_or_else(|| {
                    anyhow::Error::from(repokit_core::Error::not_found(User::NAME, id))
                })
            })
            .await?;
            print_json(&user)?;
        }
        Command::Remove { ids } => {
            let removed = with_users(keeper, |users| async move {
                users
                    .delete_many(
                        vec![User::column("id").is_in(ids)],
                        SynchronizeSession::Fetch,
                    )
                    .await
                    .map_err(anyhow::Error::from)
            })
            .await?;
            print_json(&removed)?;
        }
    }
    Ok(())
}

/// Runs `f` with a user controller bound to a fresh session scope.
async fn with_users<F, Fut, T>(keeper: &Arc<SessionKeeper>, f: F) -> Result<T>
where
    F: FnOnce(UserController) -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let keeper_handle = Arc::clone(keeper);
    session_scope(keeper, |session| {
        f(UserController::new(UserRepository::new(session), keeper_handle))
    })
    .await
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
