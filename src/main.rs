use anyhow::Result;
use clap::Parser;
use dotenv::dotenv;
use poise::serenity_prelude as serenity;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use tierbot::commands::{create_queue, help, ping, results, settier, setup, waitlist};
use tierbot::config::{BotConfig, DataPaths};
use tierbot::events::handle_interaction;
use tierbot::logging::{self, LogCaptureLayer};
use tierbot::managers::create_shared_queue_manager;
use tierbot::queue::DiscordTransport;
use tierbot::{web, Data, Error};

/// Discord bot coordinating tier tests between players and testers
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Register slash commands per guild instead of globally (faster to propagate)
    #[arg(long, short = 's')]
    sync_commands: bool,

    /// Only register commands to this guild
    #[arg(long)]
    guild_id: Option<u64>,

    /// Directory holding the JSON documents (overrides DATA_PATH)
    #[arg(long)]
    data_path: Option<String>,

    /// Do not start the local settings panel
    #[arg(long)]
    no_panel: bool,
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::InteractionCreate { interaction } = event {
        if let Err(e) = handle_interaction(ctx, interaction, data).await {
            error!("Failed to handle interaction: {}", e);
        }
    }
    Ok(())
}

/// Log the application id encoded in the first token segment
fn log_bot_id(token: &str) {
    use base64::Engine;

    let Some(segment) = token.split('.').next() else {
        return;
    };
    let decoded = base64::engine::general_purpose::STANDARD_NO_PAD
        .decode(segment)
        .or_else(|_| base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(segment));
    if let Some(id) = decoded.ok().and_then(|bytes| String::from_utf8(bytes).ok()) {
        info!(
            "Bot ID: {} (invite and intents at https://discord.com/developers/applications/{}/bot)",
            id, id
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let log_buffer = logging::create_log_buffer(logging::DEFAULT_CAPACITY);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true),
        )
        .with(LogCaptureLayer::new(log_buffer.clone()))
        .init();

    let mut config = BotConfig::from_env()?;
    if let Some(data_path) = args.data_path {
        config.data_path = data_path;
    }
    log_bot_id(&config.token);

    let paths = DataPaths::new(&config.data_path);
    tokio::fs::create_dir_all(paths.root()).await?;
    info!("Using data directory {}", paths.root().display());

    if args.no_panel {
        info!("--no-panel: settings panel disabled");
    } else {
        let addr = config.panel_addr()?;
        let state = web::PanelState {
            settings: tierbot::state::SettingsRepository::new(paths.settings()),
            log_buffer: log_buffer.clone(),
        };
        tokio::spawn(async move {
            if let Err(e) = web::start_panel(addr, state).await {
                error!("Settings panel error: {}", e);
            }
        });
    }

    let sync_commands = args.sync_commands;
    let target_guild_id = args.guild_id;
    if sync_commands {
        info!("--sync-commands: registering commands per guild");
    }
    if let Some(gid) = target_guild_id {
        info!("--guild-id: registering commands to guild {}", gid);
    }

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![
                ping(),
                help(),
                waitlist(),
                create_queue(),
                results(),
                setup(),
                settier(),
            ],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            pre_command: |ctx| {
                Box::pin(async move {
                    info!(
                        "Command '{}' invoked by {} (ID: {}) in {}",
                        ctx.command().qualified_name,
                        ctx.author().name,
                        ctx.author().id,
                        ctx.guild_id()
                            .map(|g| g.to_string())
                            .unwrap_or_else(|| "DM".to_string())
                    );
                })
            },
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            error!(
                                "Error in command '{}': {}",
                                ctx.command().qualified_name,
                                error
                            );
                            let _ = ctx
                                .send(
                                    poise::CreateReply::default()
                                        .content("Something went wrong. Please try again later.")
                                        .ephemeral(true),
                                )
                                .await;
                        }
                        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
                            warn!(
                                "User {} lacks permissions for '{}'",
                                ctx.author().name,
                                ctx.command().qualified_name
                            );
                            let _ = ctx
                                .send(
                                    poise::CreateReply::default()
                                        .content("You must be an administrator to use this command.")
                                        .ephemeral(true),
                                )
                                .await;
                        }
                        poise::FrameworkError::GuildOnly { ctx, .. } => {
                            warn!(
                                "Command '{}' is guild-only, used in DM by {}",
                                ctx.command().qualified_name,
                                ctx.author().name
                            );
                        }
                        other => {
                            if let Err(e) = poise::builtins::on_error(other).await {
                                error!("Error while handling framework error: {}", e);
                            }
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            let paths = paths.clone();

            Box::pin(async move {
                info!("Bot logged in as: {}", ready.user.name);

                let guilds_to_register: Vec<serenity::GuildId> = match target_guild_id {
                    Some(gid) => vec![serenity::GuildId::new(gid)],
                    None => ready.guilds.iter().map(|g| g.id).collect(),
                };

                if sync_commands || target_guild_id.is_some() {
                    for guild_id in &guilds_to_register {
                        if let Err(e) = poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            *guild_id,
                        )
                        .await
                        {
                            error!("Failed to register commands for guild {}: {}", guild_id, e);
                        } else {
                            info!(
                                "Registered {} commands for guild {}",
                                framework.options().commands.len(),
                                guild_id
                            );
                        }
                    }
                } else if let Err(e) =
                    poise::builtins::register_globally(ctx, &framework.options().commands).await
                {
                    error!("Failed to register commands globally: {}", e);
                } else {
                    info!(
                        "Registered {} commands globally (may take up to 1 hour to propagate)",
                        framework.options().commands.len()
                    );
                }

                let transport = Arc::new(DiscordTransport::new(ctx.http.clone()));
                let queue_manager = create_shared_queue_manager(&paths, transport);
                Ok(Data::new(paths, queue_manager))
            })
        })
        .build();

    let intents = serenity::GatewayIntents::non_privileged();
    let mut client = serenity::ClientBuilder::new(&config.token, intents)
        .framework(framework)
        .await?;

    info!("Starting bot...");
    client.start().await?;
    warn!("Bot ended.");
    Ok(())
}
