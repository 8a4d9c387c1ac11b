use anyhow::Result;
use clap::{Parser, Subcommand};
use ziahr_core::settings::Theme;
use ziahr_infrastructure::ZiahrPaths;

mod bootstrap;
mod commands;
mod console;
mod logging;

use bootstrap::App;

#[derive(Parser)]
#[command(name = "ziahr")]
#[command(about = "ZiaHR - chat with the HR assistant from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat
    Chat {
        /// Resume a chat by id (like opening `?chat=<id>`)
        #[arg(long)]
        chat: Option<String>,
    },
    /// List chats grouped by recency
    List {
        /// Also list archived chats
        #[arg(long)]
        archived: bool,
    },
    /// Rename a chat
    Rename { id: String, title: String },
    /// Move a chat into the archive
    Archive { id: String },
    /// Restore an archived chat
    Unarchive { id: String },
    /// Delete a chat
    Delete { id: String },
    /// Log in and remember the session token
    Login {
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account
    Register {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        employee_id: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored login
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Show or change preferences
    Settings {
        #[arg(long)]
        theme: Option<Theme>,
        #[arg(long)]
        language: Option<String>,
        #[arg(long)]
        voice: Option<bool>,
        #[arg(long)]
        always_show_code: Option<bool>,
        #[arg(long)]
        suggestions: Option<bool>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let chat_param = match &cli.command {
        Commands::Chat { chat } => chat.clone(),
        _ => None,
    };
    let paths = ZiahrPaths::resolve()?;
    let _log_guard = logging::init(&paths.log_dir())?;
    tracing::debug!("[Main] Data directory: {}", paths.data_dir().display());
    let app = App::build(paths, chat_param)?;

    match cli.command {
        Commands::Chat { .. } => commands::chat::run(&app).await?,
        Commands::List { archived } => commands::sessions::list(&app, archived).await?,
        Commands::Rename { id, title } => commands::sessions::rename(&app, &id, &title).await?,
        Commands::Archive { id } => commands::sessions::archive(&app, &id).await?,
        Commands::Unarchive { id } => commands::sessions::unarchive(&app, &id).await?,
        Commands::Delete { id } => commands::sessions::delete(&app, &id).await?,
        Commands::Login { email, password } => {
            commands::account::login(&app, &email, password).await?
        }
        Commands::Register {
            full_name,
            email,
            employee_id,
            password,
        } => {
            commands::account::register(&app, full_name, email, employee_id, password).await?
        }
        Commands::Logout => commands::account::logout(&app).await?,
        Commands::Whoami => commands::account::whoami(&app).await?,
        Commands::Settings {
            theme,
            language,
            voice,
            always_show_code,
            suggestions,
        } => commands::settings::run(
            &app,
            commands::settings::Changes {
                theme,
                language,
                voice,
                always_show_code,
                suggestions,
            },
        )?,
    }

    Ok(())
}
