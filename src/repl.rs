//! Line-oriented command loop.

use std::io::{self, BufRead, Write};

use tracing::{error, warn};

use crate::session::{Flow, Session};

/// Feed every line of `input` to `session` until EOF or `quit`.
///
/// Output errors after startup are logged and the loop carries on; the
/// sinks are flushed on the way out whatever happened.
pub fn run<R: BufRead>(session: &mut Session, input: R, prompt: Option<&str>) -> io::Result<()> {
    let mut lines = input.lines();
    loop {
        if let Some(prompt) = prompt {
            let mut stdout = io::stdout();
            if let Err(err) = stdout
                .write_all(prompt.as_bytes())
                .and_then(|_| stdout.flush())
            {
                warn!(error = %err, "failed to write prompt");
            }
        }

        let Some(line) = lines.next() else {
            break;
        };
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                error!(error = %err, "failed to read input");
                break;
            }
        };

        match session.handle_line(&line) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Quit) => break,
            Err(err) => {
                warn!(error = %err, "output failed while handling input");
                eprintln!("output error: {err}");
            }
        }
    }
    session.shutdown()
}

/// Run a fixed list of commands, as given with `--execute`.
pub fn run_commands<S: AsRef<str>>(session: &mut Session, commands: &[S]) -> io::Result<Flow> {
    for command in commands {
        if session.handle_line(command.as_ref())? == Flow::Quit {
            return Ok(Flow::Quit);
        }
    }
    Ok(Flow::Continue)
}
