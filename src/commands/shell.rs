use std::path::Path;

use tracing::debug;

use crate::api::MailApi;
use crate::api::models::Attachment;
use crate::auth::TokenSource;
use crate::context::AppContext;
use crate::error::AppResult;
use crate::mail::{DraftEdit, MailStore};
use crate::output::mails;

use super::prompt::{prompt_required, read_line};

const HELP: &str = "\
commands:
  ls             show the current list
  reload         fetch every mail again
  key <text>     set the search key
  search         fetch mails matching the search key
  new            compose and schedule a mail
  retry          resubmit the draft after a failed create
  cancel         discard the draft
  rm <id>        delete a mail
  help           show this help
  quit           leave the shell";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    List,
    Reload,
    Key(String),
    Search,
    New,
    Retry,
    Cancel,
    Remove(String),
    Help,
    Quit,
    Empty,
    Unknown(String),
}

fn parse_command(line: &str) -> ShellCommand {
    let line = line.trim();
    let (verb, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    match verb {
        "" => ShellCommand::Empty,
        "ls" | "list" => ShellCommand::List,
        "reload" => ShellCommand::Reload,
        "key" => ShellCommand::Key(rest.to_string()),
        "search" | "find" => ShellCommand::Search,
        "new" | "create" => ShellCommand::New,
        "retry" => ShellCommand::Retry,
        "cancel" => ShellCommand::Cancel,
        "rm" | "delete" if !rest.is_empty() => ShellCommand::Remove(rest.to_string()),
        "help" | "?" => ShellCommand::Help,
        "quit" | "exit" | "q" => ShellCommand::Quit,
        other => ShellCommand::Unknown(other.to_string()),
    }
}

pub async fn run(ctx: &AppContext) -> AppResult<()> {
    let store = ctx.mail_store()?;
    println!(
        "mailsched shell, profile `{}`. type `help` for commands.",
        ctx.profile
    );

    if store.load_all().await.is_ok() {
        render(&store);
    } else {
        report_notice(&store);
    }

    while let Some(line) = read_line("mailsched> ")? {
        match parse_command(&line) {
            ShellCommand::List => render(&store),
            ShellCommand::Reload => {
                settle(&store, store.load_all().await);
            }
            ShellCommand::Key(key) => {
                store.set_search_key(key);
                println!("search key: `{}`", store.snapshot().search_key());
            }
            ShellCommand::Search => {
                settle(&store, store.run_search().await);
            }
            ShellCommand::New => compose(&store).await?,
            ShellCommand::Retry => {
                if store.snapshot().show_modal() {
                    submit(&store).await;
                } else {
                    println!("nothing to retry; use `new`");
                }
            }
            ShellCommand::Cancel => {
                store.cancel_create();
                println!("draft discarded");
            }
            ShellCommand::Remove(id) => {
                settle(&store, store.delete(&id).await);
            }
            ShellCommand::Help => println!("{HELP}"),
            ShellCommand::Quit => break,
            ShellCommand::Empty => {}
            ShellCommand::Unknown(verb) => println!("unknown command `{verb}`; type `help`"),
        }
    }

    Ok(())
}

async fn compose<A: MailApi, T: TokenSource>(store: &MailStore<A, T>) -> AppResult<()> {
    store.open_create_modal();
    let default_date = store.snapshot().draft().send_date.clone();

    let fields = [
        ("title: ", DraftEdit::Title as fn(String) -> DraftEdit),
        ("to: ", DraftEdit::MailReceive),
        ("message: ", DraftEdit::Content),
    ];
    for (prompt, edit) in fields {
        let Some(value) = prompt_required(prompt)? else {
            store.close_create_modal();
            return Ok(());
        };
        store.edit_draft(edit(value));
    }

    let send_date = read_line(&format!("send at [{default_date}]: "))?.unwrap_or_default();
    if !send_date.is_empty() {
        store.edit_draft(DraftEdit::SendDate(send_date));
    }

    let path = read_line("attach file (blank for none): ")?.unwrap_or_default();
    if !path.is_empty() {
        match Attachment::from_path(Path::new(&path)) {
            Ok(file) => store.edit_draft(DraftEdit::File(Some(file))),
            Err(err) => println!("! attachment skipped: {err}"),
        }
    }

    submit(store).await;
    Ok(())
}

async fn submit<A: MailApi, T: TokenSource>(store: &MailStore<A, T>) {
    match store.submit_draft().await {
        Ok(outcome) => println!("{}", mails::describe_created(&outcome)),
        Err(err) => {
            debug!(error = %err, "create failed");
            report_notice(store);
            println!("draft kept; `retry` to resubmit or `cancel` to discard");
        }
    }
}

fn settle<A: MailApi, T: TokenSource>(store: &MailStore<A, T>, result: AppResult<()>) {
    match result {
        Ok(()) => render(store),
        Err(err) => {
            debug!(error = %err, "shell operation failed");
            report_notice(store);
        }
    }
}

fn render<A: MailApi, T: TokenSource>(store: &MailStore<A, T>) {
    for line in mails::render_list(&store.snapshot()) {
        println!("{line}");
    }
}

fn report_notice<A: MailApi, T: TokenSource>(store: &MailStore<A, T>) {
    if let Some(notice) = store.snapshot().notice() {
        println!("! {}", notice.message);
    }
    store.dismiss_notice();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_verbs_and_arguments() {
        assert_eq!(parse_command("  ls "), ShellCommand::List);
        assert_eq!(
            parse_command("key  spring  sale "),
            ShellCommand::Key("spring  sale".to_string())
        );
        assert_eq!(parse_command("key"), ShellCommand::Key(String::new()));
        assert_eq!(
            parse_command("rm item-42"),
            ShellCommand::Remove("item-42".to_string())
        );
        assert_eq!(parse_command(""), ShellCommand::Empty);
    }

    #[test]
    fn delete_without_id_is_unknown() {
        assert_eq!(parse_command("rm"), ShellCommand::Unknown("rm".to_string()));
    }

    #[test]
    fn quits_on_any_alias() {
        for alias in ["quit", "exit", "q"] {
            assert_eq!(parse_command(alias), ShellCommand::Quit);
        }
    }
}
