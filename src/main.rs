/// fedi3-follow - command line front end for the follow client
use clap::{Parser, Subcommand};
use fedi3_follow::{
    actor::{HttpActorRepository, HttpActorRepositoryConfig},
    config::ClientConfig,
    control::{CoreClient, CoreClientConfig},
    follow::{OutboxState, ProfileView, ToggleResult, ViewSnapshot},
    migration::MigrationService,
    policy::Outcome,
    relay::RelayDiscovery,
    ControlApi,
};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fedi3-follow", version, about = "Inspect and follow remote actors through the Fedi3 core")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve an actor and print its profile
    Profile { actor: String },
    /// Print the follow status of an actor
    Status { actor: String },
    /// Follow (or unfollow, when already following) an actor
    Follow { actor: String },
    /// Keep the profile open and report follow status changes
    Watch {
        actor: String,
        #[arg(long, default_value_t = 60)]
        secs: u64,
    },
    /// Preview relays and peers known by a relay
    Relays { relay: Option<String> },
    /// Show migration status
    Migration,
    /// Replace legacy aliases (comma or newline separated)
    Aliases { list: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ClientConfig::from_env()?;
    init_logging(&config);
    config.validate()?;

    let cli = Cli::parse();

    let control: Arc<dyn ControlApi> = Arc::new(CoreClient::new(CoreClientConfig {
        base_url: config.core.base_url.clone(),
        internal_token: config.core.internal_token.clone(),
        timeout: Duration::from_secs(config.core.timeout_secs),
    })?);
    let repo = Arc::new(HttpActorRepository::new(HttpActorRepositoryConfig {
        user_agent: config.actor.user_agent.clone(),
        timeout: Duration::from_secs(config.actor.timeout_secs),
        cache_ttl: Duration::from_secs(config.actor.cache_ttl_secs),
    })?);
    let new_view = || ProfileView::new(repo.clone(), Some(control.clone()), config.follow.clone());

    match cli.command {
        Command::Profile { actor } => {
            let view = new_view();
            view.resolve_profile(&actor).await;
            print_profile(&view.snapshot())?;
        }
        Command::Status { actor } => {
            let status = control.fetch_following_status(actor.trim()).await?;
            println!("{}", status.as_str());
        }
        Command::Follow { actor } => {
            let view = new_view();
            view.resolve_profile(&actor).await;
            ensure_resolved(&view.snapshot())?;
            match view.toggle_follow().await {
                ToggleResult::Issued(status) => println!("status: {}", status.as_str()),
                ToggleResult::Failed(message) => anyhow::bail!(message),
                ToggleResult::Skipped => anyhow::bail!("nothing to do"),
            }
            // Give the remote server a chance to accept before exiting
            tokio::time::sleep(config.follow.recheck_delay() + Duration::from_millis(250)).await;
            println!("status: {}", view.snapshot().follow_status().as_str());
        }
        Command::Watch { actor, secs } => {
            let view = new_view();
            view.resolve_profile(&actor).await;
            ensure_resolved(&view.snapshot())?;
            let mut last = view.snapshot().follow_status();
            println!("status: {}", last.as_str());

            let deadline = tokio::time::Instant::now() + Duration::from_secs(secs);
            while tokio::time::Instant::now() < deadline {
                tokio::time::sleep(Duration::from_secs(1)).await;
                let current = view.snapshot().follow_status();
                if current != last {
                    println!("status: {}", current.as_str());
                    last = current;
                }
            }
            view.teardown();
        }
        Command::Relays { relay } => {
            let Some(relay) = relay.or_else(|| config.relay.base_url.clone()) else {
                anyhow::bail!("no relay given and FEDI3_RELAY_URL is not set");
            };
            let discovery = RelayDiscovery::new(Duration::from_secs(config.core.timeout_secs))?;
            let preview = discovery.preview(&relay).await;
            println!("{}", serde_json::to_string_pretty(&preview)?);
        }
        Command::Migration => match MigrationService::new(control.clone()).load().await {
            Outcome::Done(status) => println!("{}", serde_json::to_string_pretty(&status)?),
            Outcome::Failed(message) => anyhow::bail!(message),
            Outcome::Absorbed => {}
        },
        Command::Aliases { list } => match MigrationService::new(control.clone()).save_aliases(&list).await {
            Outcome::Done(saved) => {
                for alias in &saved.aliases {
                    println!("{}", alias);
                }
                if saved.restart_required {
                    println!("restart the core to publish the new aliases");
                }
            }
            Outcome::Failed(message) => anyhow::bail!(message),
            Outcome::Absorbed => {}
        },
    }

    Ok(())
}

fn init_logging(config: &ClientConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("fedi3_follow={}", config.logging.level).into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

fn ensure_resolved(snapshot: &ViewSnapshot) -> anyhow::Result<()> {
    match (&snapshot.state.profile, &snapshot.state.error) {
        (Some(_), _) => Ok(()),
        (None, Some(message)) => anyhow::bail!(message.clone()),
        (None, None) => anyhow::bail!("actor could not be resolved"),
    }
}

fn print_profile(snapshot: &ViewSnapshot) -> anyhow::Result<()> {
    ensure_resolved(snapshot)?;
    let state = &snapshot.state;
    let Some(profile) = &state.profile else {
        return Ok(());
    };

    let count = |c: Option<u64>| c.map(|n| n.to_string()).unwrap_or_else(|| "-".to_string());

    println!("{}", profile.title());
    println!("  id:        {}", profile.id);
    if !profile.preferred_username.is_empty() {
        println!("  username:  @{}", profile.preferred_username);
    }
    println!("  url:       {}", profile.url);
    println!("  fedi3:     {}", profile.is_fedi3);
    if let Some(key) = &profile.status_key {
        println!("  presence:  {}", key);
    }
    println!("  followers: {}", count(state.followers_count));
    println!("  following: {}", count(state.following_count));
    println!("  follow:    {}", snapshot.follow_status().as_str());
    for field in &profile.fields {
        println!("  {}: {}", field.name, field.value);
    }

    match &state.outbox {
        OutboxState::Loaded(items) => {
            println!("  recent activity ({}):", items.len());
            for item in items {
                println!(
                    "    {} {} {}",
                    item.published.as_deref().unwrap_or("-"),
                    item.kind,
                    item.object_id.as_deref().unwrap_or(&item.id)
                );
            }
        }
        OutboxState::Failed(message) => println!("  outbox unavailable: {}", message),
        _ => {}
    }

    Ok(())
}
