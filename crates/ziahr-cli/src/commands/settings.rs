use anyhow::Result;
use colored::Colorize;
use ziahr_core::settings::Theme;

use crate::bootstrap::App;

/// Preferences given on the command line; `None` leaves a value unchanged.
#[derive(Debug, Default)]
pub struct Changes {
    pub theme: Option<Theme>,
    pub language: Option<String>,
    pub voice: Option<bool>,
    pub always_show_code: Option<bool>,
    pub suggestions: Option<bool>,
}

pub fn run(app: &App, changes: Changes) -> Result<()> {
    let service = &app.settings;
    let mut settings = service.settings()?;

    if let Some(theme) = changes.theme {
        settings = service.set_theme(theme)?;
    }
    if let Some(language) = &changes.language {
        settings = service.set_language(language)?;
    }
    if let Some(enabled) = changes.voice {
        settings = service.set_voice_enabled(enabled)?;
    }
    if let Some(enabled) = changes.always_show_code {
        settings = service.set_always_show_code(enabled)?;
    }
    if let Some(enabled) = changes.suggestions {
        settings = service.set_show_suggestions(enabled)?;
    }

    println!("{}", "Settings".bold());
    println!("  theme             {}", settings.theme);
    println!("  language          {}", settings.language);
    println!("  voice             {}", settings.voice_enabled);
    println!("  always show code  {}", settings.always_show_code);
    println!("  suggestions       {}", settings.show_suggestions);
    println!("  archived chats    {}", settings.archived_chats.len());
    println!(
        "{}",
        format!("Config: {}", app.paths.config_file().display()).bright_black()
    );
    Ok(())
}
