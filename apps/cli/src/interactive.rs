//! Interactive `session` command.
//!
//! Commands are read from stdin on a plain thread and handed to the session
//! loop over a channel. Uploads and submissions run as background tasks so
//! `cancel`, `remove` and `list` stay responsive while they are in flight.

use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use docdrop_uploader::{SubmitForm, UploadSession};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::config::Config;
use crate::render::{self, StatusLabels};
use crate::{app, files};

const HELP: &str = "\
commands:
  <Enter>                          start uploading idle files
  start                            same as <Enter>
  cancel <file>                    cancel an active upload
  retry <file>                     reset a failed or canceled file
  remove <file>                    remove a file (cancels it first)
  add <path>...                    add files
  submit <title> | <description>   submit once every file is done
  list                             show the file table
  quit                             leave the session
<file> is a row number, a file name or an id prefix.";

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start { shortcut: bool },
    Cancel(String),
    Retry(String),
    Remove(String),
    Add(Vec<PathBuf>),
    Submit(SubmitForm),
    List,
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_command(line: &str) -> Command {
    let line = line.trim();
    if line.is_empty() {
        return Command::Start { shortcut: true };
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let needs_arg = |make: fn(String) -> Command| {
        if rest.is_empty() {
            Command::Invalid(format!("usage: {verb} <file>"))
        } else {
            make(rest.to_string())
        }
    };

    match verb {
        "start" => Command::Start { shortcut: false },
        "cancel" => needs_arg(Command::Cancel),
        "retry" => needs_arg(Command::Retry),
        "remove" | "rm" => needs_arg(Command::Remove),
        "add" if !rest.is_empty() => {
            Command::Add(rest.split_whitespace().map(PathBuf::from).collect())
        }
        "add" => Command::Invalid("usage: add <path>...".into()),
        "submit" => match rest.split_once('|') {
            Some((title, description)) => {
                Command::Submit(SubmitForm::new(title.trim(), description.trim()))
            }
            None => Command::Invalid("usage: submit <title> | <description>".into()),
        },
        "list" | "ls" => Command::List,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => Command::Invalid(format!("unknown command: {other}")),
    }
}

/// Runs the interactive session until `quit` or end of input.
pub async fn run(config: &Config, paths: Vec<PathBuf>, embedded: bool) -> anyhow::Result<()> {
    let (session, _local) = app::connect(config, embedded).await?;
    if !paths.is_empty() {
        session.add_files(files::read_files(&paths)?);
    }

    println!("{HELP}\n");
    println!("{}", render::file_table(&session.store().snapshot()));
    render::print_notices(&session.notifier().drain());

    let (tx, rx) = mpsc::channel(16);
    std::thread::Builder::new()
        .name("docdrop-stdin".into())
        .spawn(move || forward_lines(BufReader::new(io::stdin()), tx))?;

    drive(&session, rx).await;
    Ok(())
}

/// Sends every line of `reader` into `tx` until input ends or the receiver
/// is dropped. Returns how many lines were delivered.
///
/// Runs on its own thread: a blocking read cannot be cancelled, so the
/// runtime must never wait on it.
fn forward_lines<R: BufRead>(reader: R, tx: mpsc::Sender<String>) -> usize {
    let mut sent = 0;
    for line in reader.lines() {
        let Ok(line) = line else { break };
        if tx.blocking_send(line).is_err() {
            break;
        }
        sent += 1;
    }
    sent
}

/// The session loop. Ends on `quit` or when `input` closes, then cancels
/// every active upload and waits for background tasks.
async fn drive(session: &UploadSession, mut input: mpsc::Receiver<String>) {
    let mut updates = session.subscribe();
    let mut labels = StatusLabels::default();
    labels.transitions(&session.store().snapshot());
    let mut tasks = JoinSet::new();

    loop {
        tokio::select! {
            line = input.recv() => {
                let Some(line) = line else { break };
                if !handle(session, parse_command(&line), &mut tasks) {
                    break;
                }
            }
            Ok(()) = updates.changed() => {
                let snapshot = updates.borrow_and_update().clone();
                for line in labels.transitions(&snapshot) {
                    println!("{line}");
                }
            }
            Some(_) = tasks.join_next() => {}
        }
        render::print_notices(&session.notifier().drain());
    }

    input.close();
    for file in session.store().snapshot().iter() {
        session.cancel(&file.id);
    }
    while tasks.join_next().await.is_some() {}
}

/// Applies one command. Returns `false` when the session should end.
fn handle(session: &UploadSession, command: Command, tasks: &mut JoinSet<()>) -> bool {
    let snapshot = session.store().snapshot();
    let resolve = |reference: &str| {
        let id = render::resolve_file(&snapshot, reference);
        if id.is_none() {
            println!("no such file: {reference}");
        }
        id
    };

    match command {
        Command::Start { shortcut } => {
            if session.orchestrator().can_start() {
                let s = session.clone();
                tasks.spawn(async move {
                    s.start_upload().await;
                });
            } else if !shortcut {
                if session.orchestrator().is_uploading() {
                    println!("an upload run is already in progress");
                } else {
                    println!("no idle files to upload");
                }
            }
        }
        Command::Cancel(reference) => {
            if let Some(id) = resolve(&reference) {
                if !session.cancel(&id) {
                    println!("{reference} is not uploading");
                }
            }
        }
        Command::Retry(reference) => {
            if let Some(id) = resolve(&reference) {
                if !session.retry(&id) {
                    println!("only failed or canceled files can be retried");
                }
            }
        }
        Command::Remove(reference) => {
            if let Some(id) = resolve(&reference) {
                session.remove(&id);
            }
        }
        Command::Add(paths) => match files::read_files(&paths) {
            Ok(raw) => {
                session.add_files(raw);
            }
            Err(e) => println!("{e:#}"),
        },
        Command::Submit(form) => {
            if session.coordinator().is_busy() {
                println!("a submission is already in progress");
            } else {
                let s = session.clone();
                tasks.spawn(async move {
                    match s.submit(&form).await {
                        Ok(resp) => println!("submitted: {}", resp.submission_id),
                        Err(e) if e.is_precondition() => {
                            tracing::debug!("submit not started: {e}");
                        }
                        Err(e) => tracing::warn!(error = %e, "submission failed"),
                    }
                });
            }
        }
        Command::List => println!("{}", render::file_table(&snapshot)),
        Command::Help => println!("{HELP}"),
        Command::Quit => return false,
        Command::Invalid(message) => println!("{message} (type `help`)"),
    }
    true
}
