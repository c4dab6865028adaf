//! Purpose: Hold top-level CLI command dispatch for `flashcards`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Session flags apply to the interactive session only.
//! Invariants: Subcommands never prompt; they print once and exit.

use super::*;

use flashcards::core::codec;
use flashcards::session::{Session, SessionConfig};

pub(super) fn dispatch_command(cli: Cli) -> Result<RunOutcome, Error> {
    let Cli {
        import,
        export,
        log,
        command,
        ..
    } = cli;

    match command {
        None => {
            let config = SessionConfig {
                import,
                export,
                log,
            };
            tracing::debug!(?config, "starting session");
            let mut session = Session::new(config, io::stdin().lock(), io::stdout().lock());
            session.run()?;
            Ok(RunOutcome::ok())
        }
        Some(_) if import.is_some() || export.is_some() || log.is_some() => {
            Err(Error::new(ErrorKind::Usage)
                .with_message("--import, --export and --log apply to the interactive session only")
                .with_hint("Drop the subcommand to start a session, or drop the session flags."))
        }
        Some(Command::Completion { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "flashcards", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Some(Command::Inspect { path, json }) => {
            let store = codec::import_file(&path)?;
            let info = deck_info::deck_info(&path, &store);
            if json {
                emit_json(deck_info::deck_info_json(&info));
            } else {
                print!("{}", deck_info::deck_info_text(&info));
            }
            Ok(RunOutcome::ok())
        }
    }
}
