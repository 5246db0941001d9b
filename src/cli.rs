use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "mailsched", version, about = "Scheduled mail command line client")]
pub struct Cli {
    #[arg(
        long,
        global = true,
        default_value = "default",
        help = "Profile name to use"
    )]
    pub profile: String,
    #[arg(long, global = true, help = "Emit JSON output")]
    pub json: bool,
    #[arg(short = 'v', long, global = true, action = ArgAction::Count, help = "Verbose logging")]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Auth(AuthArgs),
    /// List every scheduled mail
    List,
    /// Ask the server for mails matching a key
    Search(SearchArgs),
    /// Schedule a new mail
    Create(CreateArgs),
    /// Delete a scheduled mail
    Delete(DeleteArgs),
    /// Interactive session over one mail list
    Shell,
}

#[derive(Debug, Args)]
pub struct AuthArgs {
    #[command(subcommand)]
    pub command: AuthCommand,
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    Login,
    Status,
    Logout,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    #[arg(help = "Search key, matched by the server")]
    pub key: String,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[arg(long, help = "Mail title")]
    pub title: String,
    #[arg(long, help = "Destination address")]
    pub to: String,
    #[arg(long, help = "Inline message text")]
    pub content: Option<String>,
    #[arg(long, help = "Read message text from file")]
    pub content_file: Option<PathBuf>,
    #[arg(long, help = "Local send time, yyyy-MM-dd HH:mm:ss (default: one hour from now)")]
    pub send_date: Option<String>,
    #[arg(long, help = "File to attach")]
    pub attach: Option<PathBuf>,
    #[arg(
        long,
        requires = "attach",
        help = "Fail when the attachment could not be stored"
    )]
    pub require_attachment: bool,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    #[arg(help = "Mail item id")]
    pub id: String,
}
