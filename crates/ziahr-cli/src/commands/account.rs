//! Login state commands.

use anyhow::{Context, Result};
use colored::Colorize;
use rustyline::DefaultEditor;
use ziahr_application::Registration;

use crate::bootstrap::App;

fn prompt_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    let mut rl = DefaultEditor::new()?;
    rl.readline("Password: ").context("No password given")
}

pub async fn login(app: &App, email: &str, password: Option<String>) -> Result<()> {
    let password = prompt_password(password)?;
    let user = app.auth.login(email, &password).await?;
    println!("{}", format!("Welcome, {}!", user.full_name).green());
    Ok(())
}

pub async fn register(
    app: &App,
    full_name: String,
    email: String,
    employee_id: String,
    password: Option<String>,
) -> Result<()> {
    let registration = Registration {
        full_name,
        email,
        password: prompt_password(password)?,
        employee_id,
    };
    let message = app.auth.register(&registration).await?;
    println!("{}", message.green());
    Ok(())
}

pub async fn logout(app: &App) -> Result<()> {
    app.auth.logout().await?;
    println!("{}", "Logged out".green());
    Ok(())
}

pub async fn whoami(app: &App) -> Result<()> {
    match app.auth.current_user().await? {
        Some(user) => {
            println!("{} <{}>", user.full_name.bold(), user.email);
            if let Some(company) = &user.company_name {
                println!("  {}", company.bright_black());
            }
            if let Some(employee_id) = &user.employee_id {
                println!("  {}", format!("Employee ID {}", employee_id).bright_black());
            }
        }
        None => println!("{}", "Not logged in".bright_black()),
    }
    Ok(())
}
