use std::io::{self, IsTerminal};

use crate::auth::AuthService;
use crate::cli::AuthCommand;
use crate::config::{self, Settings};
use crate::context::AppContext;
use crate::error::{AppError, AppResult};

use super::prompt::{input_closed, prompt_required, read_line};

pub async fn run(ctx: &AppContext, command: AuthCommand) -> AppResult<()> {
    match command {
        AuthCommand::Login => {
            let settings = ensure_login_settings(ctx)?;
            let result = AuthService::login(&ctx.profile, &settings, &ctx.token_store).await?;

            let text = match result.email.as_ref() {
                Some(email) => format!("{}: logged in as {}", result.profile, email),
                None => format!("{}: {}", result.profile, result.note),
            };
            ctx.output.emit(&text, &result)
        }
        AuthCommand::Status => {
            let status = AuthService::status(&ctx.profile, &ctx.token_store).await?;
            let text = if status.logged_in {
                let expiry = match status.expired {
                    Some(true) if status.has_refresh_token == Some(true) => " (expired, refresh available)",
                    Some(true) => " (expired)",
                    _ => "",
                };
                format!(
                    "{}: logged in{}{}",
                    status.profile,
                    status
                        .email
                        .as_ref()
                        .map(|email| format!(" as {email}"))
                        .unwrap_or_default(),
                    expiry,
                )
            } else {
                format!("{}: logged out", status.profile)
            };

            ctx.output.emit(&text, &status)
        }
        AuthCommand::Logout => {
            let status =
                AuthService::logout(&ctx.profile, &ctx.settings, &ctx.token_store).await?;
            let text = format!("{}: logged out", status.profile);
            ctx.output.emit(&text, &status)
        }
    }
}

fn ensure_login_settings(ctx: &AppContext) -> AppResult<Settings> {
    let mut settings = ctx.settings.clone();
    let missing = missing_login_fields(&settings);
    if missing.is_empty() {
        return Ok(settings);
    }

    let settings_path = ctx.paths.settings_file(&ctx.profile);
    if !io::stdin().is_terminal() {
        return Err(AppError::Config(format!(
            "missing {} in {}. run `mailsched auth login` in an interactive terminal to be prompted, or add the values manually",
            missing.join(" and "),
            settings_path.display(),
        )));
    }

    println!("Login settings are missing for profile `{}`.", ctx.profile);
    println!("Settings will be saved to {}.", settings_path.display());

    if settings.auth_domain().is_err() {
        settings.auth_domain = Some(prompt_required("Auth domain: ")?.ok_or_else(input_closed)?);
    }

    if settings.client_id().is_err() {
        settings.client_id = Some(prompt_required("OAuth client_id: ")?.ok_or_else(input_closed)?);
    }

    let audience = read_line("API audience (blank for none): ")?.unwrap_or_default();
    if !audience.is_empty() {
        settings.audience = Some(audience);
    }

    config::save_settings(&ctx.paths, &ctx.profile, &settings)?;
    println!("Saved profile settings to {}.", settings_path.display());

    Ok(settings)
}

fn missing_login_fields(settings: &Settings) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if settings.auth_domain().is_err() {
        missing.push("auth_domain");
    }
    if settings.client_id().is_err() {
        missing.push("client_id");
    }
    missing
}
