use std::path::Path;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};

use botbase::application::errors::HandlerError;
use botbase::domain::entities::{ClientEvent, Interaction, Message, User};
use botbase::domain::traits::Bot;
use botbase::infrastructure::adapters::ConsoleAdapter;
use botbase::{CommandHandler, Config, EventHandler, HandlerTable};

#[derive(Parser)]
#[command(name = "botbase")]
#[command(about = "Command and event dispatch core for chat bots", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Command prefix (overrides config)
    #[arg(short, long)]
    prefix: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the bot on the console
    Run,
    /// Load every unit and print what was registered
    Check,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            if let Some(config) = load_config(&cli.config, cli.prefix) {
                block_on(run_bot(config));
            }
        }
        Commands::Check => {
            if let Some(config) = load_config(&cli.config, cli.prefix) {
                block_on(check_units(config));
            }
        }
        Commands::Version => {
            println!("botbase v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
    }
}

fn block_on<F: std::future::Future<Output = ()>>(fut: F) {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(fut),
        Err(e) => tracing::error!("Failed to start runtime: {}", e),
    }
}

fn load_config(config_path: &str, prefix_override: Option<String>) -> Option<Config> {
    let loaded = if Path::new(config_path).exists() {
        Config::load(config_path).or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    };

    let mut config = match loaded {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            return None;
        }
    };
    if let Some(prefix) = prefix_override {
        config.handler.prefix = prefix;
    }
    Some(config)
}

/// Handlers that manifests can name in their `handler:` key
fn builtin_handlers() -> HandlerTable {
    HandlerTable::new()
        .command("ping", |ctx| async move {
            ctx.reply("Pong!").await?;
            Ok(())
        })
        .command("echo", |ctx| async move {
            if ctx.args.is_empty() {
                return Err(HandlerError::InvalidArgs("nothing to echo".to_string()));
            }
            ctx.reply(&ctx.args.join(" ")).await?;
            Ok(())
        })
        .command("whoami", |ctx| async move {
            let text = format!("You are {}", ctx.message.author);
            ctx.reply(&text).await?;
            Ok(())
        })
        .slash_command("ping", |ctx| async move {
            ctx.reply("Pong!").await?;
            Ok(())
        })
        .event("log-ready", |ctx| async move {
            if let ClientEvent::Ready(info) = &ctx.event {
                tracing::info!("Logged in as {} ({})", info.username, info.id);
            }
            Ok(())
        })
        .event("log-message", |ctx| async move {
            if let ClientEvent::MessageCreate(message) = &ctx.event {
                tracing::debug!("Message from {}: {}", message.author, message.content);
            }
            Ok(())
        })
}

struct Handlers {
    commands: Arc<CommandHandler>,
    events: EventHandler,
}

async fn load_units(config: &Config, bot: Arc<dyn Bot>) -> Option<Handlers> {
    let table = Arc::new(builtin_handlers());

    let commands = match CommandHandler::new(config.handler.clone(), Arc::clone(&bot), Arc::clone(&table)) {
        Ok(handler) => Arc::new(handler),
        Err(e) => {
            tracing::error!("Failed to create command handler: {}", e);
            return None;
        }
    };
    let events = match EventHandler::new(config.handler.clone(), bot.clone(), table) {
        Ok(handler) => handler.with_registry(Arc::clone(commands.registry())),
        Err(e) => {
            tracing::error!("Failed to create event handler: {}", e);
            return None;
        }
    };

    commands.set_commands().await;
    commands.set_slash_commands().await;
    events.set_events(bot.as_ref()).await;

    Some(Handlers { commands, events })
}

async fn check_units(config: Config) {
    let bot: Arc<dyn Bot> = Arc::new(ConsoleAdapter::new());
    let Some(handlers) = load_units(&config, Arc::clone(&bot)).await else {
        return;
    };

    println!("Commands:");
    for command in handlers.commands.get_commands() {
        if command.aliases().is_empty() {
            println!("  {}{}", config.handler.prefix, command.name());
        } else {
            println!(
                "  {}{} (aliases: {})",
                config.handler.prefix,
                command.name(),
                command.aliases().join(", ")
            );
        }
    }

    println!("Slash commands:");
    for slash in handlers.commands.get_slash_commands() {
        let definition = slash.definition();
        println!("  /{} - {}", definition.name, definition.description);
    }

    println!("Events:");
    for listener in handlers.events.get_events() {
        match listener.run_order() {
            Some(order) => println!("  {} (run order {})", listener.category(), order),
            None => println!("  {}", listener.category()),
        }
    }
}

async fn run_bot(config: Config) {
    tracing::info!("Starting botbase: {}", config.bot.name);

    let adapter = Arc::new(ConsoleAdapter::new());
    let bot: Arc<dyn Bot> = adapter.clone();
    let Some(handlers) = load_units(&config, Arc::clone(&bot)).await else {
        return;
    };

    if let Err(e) = handlers.commands.register_slash_commands(bot.as_ref(), None).await {
        tracing::error!("Failed to register slash commands: {}", e);
    }
    handlers.commands.set_default_handler(bot.as_ref());
    handlers.commands.set_default_slash_handler(bot.as_ref());
    let sweeper = handlers.commands.spawn_cooldown_sweeper();

    adapter.emit(ClientEvent::Ready(bot.bot_info())).await;

    println!("Console mode. Type a message, '/name' for a slash command, or 'quit' to exit.");
    let user = User::new("console-user").with_username("you");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                break;
            }
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        let event = match line.strip_prefix('/') {
            Some(name) => ClientEvent::InteractionCreate(Interaction::chat_input("console", user.clone(), name)),
            None => ClientEvent::MessageCreate(Message::new("console", user.clone(), line)),
        };
        adapter.emit(event).await;
    }

    handlers.commands.remove_default_handler(bot.as_ref());
    handlers.commands.remove_default_slash_handler(bot.as_ref());
    handlers.events.clear_events(bot.as_ref());
    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    tracing::info!("Bye!");
}

fn init_config() {
    match serde_yaml::to_string(&Config::default()) {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
        }
        Err(e) => tracing::error!("Failed to render config: {}", e),
    }
}
