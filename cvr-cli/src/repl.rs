//! Interactive chat loop.

use std::path::PathBuf;

use anyhow::{Result, bail};
use cvr_model::Role;
use cvr_session::{Answer, Persona, Session};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::{print_answer, print_sources, upload_file};

pub const HELP: &str = "\
Commands:
  /persona formal|savage  switch reviewer persona
  /upload <pdf>           load a different CV
  /sources                show the passages behind the last answer
  /history                show the conversation so far
  /help                   show this help
  /quit                   leave
Anything else is sent as a question.";

/// One line of REPL input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Ask(String),
    Persona(Persona),
    Upload(PathBuf),
    Sources,
    History,
    Help,
    Quit,
    Empty,
}

/// Parse one input line.
pub fn parse_line(line: &str) -> Result<ReplCommand> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ReplCommand::Empty);
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Ok(ReplCommand::Ask(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };

    Ok(match name {
        "persona" | "mode" => {
            if arg.is_empty() {
                bail!("usage: /persona formal|savage");
            }
            ReplCommand::Persona(arg.parse()?)
        }
        "upload" | "load" => {
            if arg.is_empty() {
                bail!("usage: /upload <pdf>");
            }
            ReplCommand::Upload(PathBuf::from(arg))
        }
        "sources" => ReplCommand::Sources,
        "history" => ReplCommand::History,
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        other => bail!("unknown command '/{other}', try /help"),
    })
}

/// Run the chat loop until `/quit` or end of input.
pub async fn run(session: &mut Session, pdf: Option<PathBuf>) -> Result<()> {
    println!("{} {} reviewer ready. /help for commands.", session.persona().icon(), session.persona().label());

    if let Some(pdf) = pdf {
        if let Err(e) = upload_file(session, &pdf).await {
            eprintln!("error: {e:#}");
        }
    } else {
        println!("Upload a CV with /upload <pdf> to get started.");
    }

    let mut editor = DefaultEditor::new()?;
    let mut last_answer: Option<Answer> = None;

    loop {
        let prompt = format!("{} > ", session.persona().icon());
        let line = match editor.readline(&prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let _ = editor.add_history_entry(line.as_str());

        let command = match parse_line(&line) {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };

        match command {
            ReplCommand::Empty => {}
            ReplCommand::Quit => break,
            ReplCommand::Help => println!("{HELP}"),
            ReplCommand::Persona(persona) => {
                session.set_persona(persona);
                println!("{} Now answering as: {}", persona.icon(), persona.label());
            }
            ReplCommand::Upload(path) => {
                last_answer = None;
                if let Err(e) = upload_file(session, &path).await {
                    eprintln!("error: {e:#}");
                }
            }
            ReplCommand::Sources => match &last_answer {
                Some(answer) => print_sources(&answer.sources),
                None => println!("No answer yet."),
            },
            ReplCommand::History => print_history(session),
            ReplCommand::Ask(question) => match session.ask(&question).await {
                Ok(answer) => {
                    print_answer(&answer);
                    last_answer = Some(answer);
                }
                Err(e) => eprintln!("error: {e}"),
            },
        }
    }

    Ok(())
}

fn print_history(session: &Session) {
    let turns = session.conversation().visible_turns();
    if turns.is_empty() {
        println!("No messages yet.");
        return;
    }
    let reviewer = session.persona().icon();
    for turn in turns {
        let who = match turn.role {
            Role::User => "👤",
            _ => reviewer,
        };
        println!("{who} {}\n", turn.content);
    }
}
