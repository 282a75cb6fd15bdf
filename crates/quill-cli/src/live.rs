//! `quill live`: a line-oriented editing session.
//!
//! Each line typed is appended to the text, exactly as if it had been typed
//! into the editor: the debounce timer is re-armed and the check goes out
//! once input pauses. Lines starting with `:` are commands.

use std::time::Instant;

use miette::{IntoDiagnostic, Result};
use quill_common::{CheckClient, CheckError};
use quill_editor_core::{
    ApplyOutcome, CheckResult, EditKind, EditorController, PendingCheck, RequestId,
    Resolved, SpanId,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use crate::display::{Style, highlight, span_list, status_line};

const HELP: &str = "\
commands:
  <text>              append a line
  :paste <text>       append a line as a paste
  :show               print the text with misspellings marked
  :menu <id>          open the suggestion menu on span <id>
  :choose <n>         pick option <n> from the open menu
  :fix <id> <word>    replace span <id> with <word>
  :ignore <id>        stop flagging span <id>
  :fixall             apply the first suggestion everywhere
  :check              check now
  :clear              start over
  :stats              print counters and language
  :quit               leave
start a text line with '::' to append a line beginning with ':'";

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Append(String, EditKind),
    Show,
    Menu(SpanId),
    Choose(usize),
    Fix(SpanId, String),
    Ignore(SpanId),
    FixAll,
    Check,
    Clear,
    Stats,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<Command, String> {
    if let Some(text) = line.strip_prefix("::") {
        return Ok(Command::Append(format!(":{}", text), EditKind::Typing));
    }
    let Some(command) = line.strip_prefix(':') else {
        return Ok(Command::Append(line.to_owned(), EditKind::Typing));
    };

    let (name, rest) = command.split_once(' ').unwrap_or((command, ""));
    let rest = rest.trim();
    let span = |arg: &str| -> Result<SpanId, String> {
        arg.trim_start_matches('#')
            .parse()
            .map_err(|_| format!("expected a span id, got '{}'", arg))
    };
    match name {
        "paste" => Ok(Command::Append(rest.to_owned(), EditKind::Paste)),
        "show" => Ok(Command::Show),
        "menu" => span(rest).map(Command::Menu),
        "choose" => rest
            .parse()
            .map(Command::Choose)
            .map_err(|_| format!("expected an option number, got '{}'", rest)),
        "fix" => {
            let (id, word) = rest
                .split_once(' ')
                .ok_or_else(|| "usage: :fix <id> <word>".to_owned())?;
            Ok(Command::Fix(span(id)?, word.trim().to_owned()))
        }
        "ignore" => span(rest).map(Command::Ignore),
        "fixall" => Ok(Command::FixAll),
        "check" => Ok(Command::Check),
        "clear" => Ok(Command::Clear),
        "stats" => Ok(Command::Stats),
        "help" | "h" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command ':{}' (try :help)", other)),
    }
}

type Response = (RequestId, Result<CheckResult, CheckError>);

struct Session {
    controller: EditorController<()>,
    client: CheckClient,
    responses: mpsc::UnboundedSender<Response>,
    style: Style,
}

impl Session {
    fn send(&self, pending: Option<PendingCheck>) {
        let Some(PendingCheck { id, request }) = pending else {
            return;
        };
        let client = self.client.clone();
        let responses = self.responses.clone();
        tokio::spawn(async move {
            let result = client.check(&request).await;
            // The session may have ended while the check was in flight.
            let _ = responses.send((id, result));
        });
    }

    fn show(&self) {
        println!("{}", highlight(self.controller.document(), self.style));
    }

    fn append(&mut self, line: &str, kind: EditKind) {
        let mut text = self.controller.text().to_owned();
        if !text.is_empty() {
            text.push('\n');
        }
        text.push_str(line);
        self.controller.on_input(&text, kind, Instant::now());
    }

    fn resolved(&mut self, resolved: Option<Resolved>, what: &str) {
        match resolved {
            Some(resolved) => {
                self.show();
                self.send(resolved.check);
            }
            None => println!("nothing to {}", what),
        }
    }

    /// Returns `false` once the session should end.
    fn run_command(&mut self, command: Command) -> bool {
        match command {
            Command::Append(line, kind) => self.append(&line, kind),
            Command::Show => {
                self.show();
                for line in span_list(self.controller.document()) {
                    println!("  {}", line);
                }
            }
            Command::Menu(span) => match self.controller.open_menu(span, |_, _| ()) {
                Some(menu) => {
                    println!("{}:", menu.word());
                    for (index, option) in menu.options().iter().enumerate() {
                        println!("  {}. {}", index, option.label());
                    }
                }
                None => println!("no misspelled span #{}", span),
            },
            Command::Choose(index) => {
                let resolved = self.controller.choose(index);
                self.resolved(resolved, "choose, open a menu first with :menu <id>");
            }
            Command::Fix(span, word) => {
                let resolved = self.controller.select_candidate(span, &word);
                self.resolved(resolved, "fix");
            }
            Command::Ignore(span) => {
                let resolved = self.controller.ignore(span);
                self.resolved(resolved, "ignore");
            }
            Command::FixAll => {
                let fixed = self.controller.fix_all();
                println!("fixed {}", fixed.fixed);
                if fixed.fixed > 0 {
                    self.show();
                }
                self.send(fixed.check);
            }
            Command::Check => {
                let pending = self.controller.request_check();
                if pending.is_none() {
                    println!("nothing to check");
                }
                self.send(pending);
            }
            Command::Clear => self.controller.clear(),
            Command::Stats => println!("{}", status_line(self.controller.stats(), self.controller.badge())),
            Command::Help => println!("{}", HELP),
            Command::Quit => return false,
        }
        true
    }

    fn on_response(&mut self, id: RequestId, result: Result<CheckResult, CheckError>) {
        let result = match result {
            Ok(result) => result,
            Err(err) => {
                self.controller.check_failed(id, &err);
                return;
            }
        };
        let suggestions = result.suggestions.len();
        match self.controller.apply_response(id, result, None) {
            Ok(ApplyOutcome::Applied { misspelled, .. }) => {
                self.show();
                if misspelled > 0 {
                    for line in span_list(self.controller.document()) {
                        println!("  {}", line);
                    }
                }
                tracing::debug!(%id, misspelled, suggestions, "applied");
            }
            Ok(ApplyOutcome::Discarded(reason)) => {
                tracing::debug!(%id, ?reason, "response discarded");
            }
            Err(err) => tracing::warn!(%id, %err, "response rejected"),
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await,
        None => std::future::pending().await,
    }
}

pub async fn run(controller: EditorController<()>, client: CheckClient) -> Result<()> {
    let (responses, mut incoming) = mpsc::unbounded_channel();
    let mut session = Session {
        controller,
        client,
        responses,
        style: Style::for_stdout(true),
    };

    println!("quill live session against {} (:help for commands)", session.client.endpoint());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let deadline = session.controller.deadline();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.into_diagnostic()? else {
                    break;
                };
                match parse_command(&line) {
                    Ok(command) => {
                        if !session.run_command(command) {
                            break;
                        }
                    }
                    Err(message) => println!("{}", message),
                }
            }
            _ = sleep_until(deadline) => {
                let pending = session.controller.poll(Instant::now());
                session.send(pending);
            }
            Some((id, result)) = incoming.recv() => session.on_response(id, result),
        }
    }

    println!("{}", status_line(session.controller.stats(), session.controller.badge()));
    Ok(())
}
