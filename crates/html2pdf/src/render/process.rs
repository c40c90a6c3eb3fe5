//! Supervision of an external rendering process.
//!
//! The child runs with stdout discarded and stderr captured on a reader
//! thread, so a chatty engine can never block on a full pipe. The parent
//! polls the child and the [`CancelFlag`] until one of them finishes.

use std::io::Read;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::config::CancelFlag;
use crate::error::ConvertError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// A process that ran to completion.
#[derive(Debug)]
pub(crate) struct Finished {
    pub status: ExitStatus,
    pub stderr: String,
}

/// Run `command` to completion, killing it if `cancel` is set first.
pub(crate) fn run(mut command: Command, cancel: &CancelFlag) -> Result<Finished, ConvertError> {
    let program = command.get_program().to_string_lossy().into_owned();
    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ConvertError::conversion_caused_by(format!("failed to start {program}"), e))?;

    let stderr_reader = child.stderr.take().map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = Vec::new();
            // A read error only truncates diagnostics.
            let _ = pipe.read_to_end(&mut buf);
            String::from_utf8_lossy(&buf).into_owned()
        })
    });

    let status = loop {
        if cancel.is_cancelled() {
            debug!(%program, "cancellation requested, killing rendering process");
            terminate(&mut child);
            return Err(ConvertError::Interrupted);
        }
        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                terminate(&mut child);
                return Err(ConvertError::conversion_caused_by(
                    format!("failed to wait for {program}"),
                    e,
                ));
            }
        }
    };

    let stderr = stderr_reader
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default();

    // A terminal interrupt reaches the whole process group, so the child
    // may have died from it before the flag was observed above.
    if cancel.is_cancelled() || killed_by_interrupt(&status) {
        return Err(ConvertError::Interrupted);
    }

    debug!(%program, %status, "rendering process finished");
    Ok(Finished { status, stderr })
}

#[cfg(unix)]
fn killed_by_interrupt(status: &ExitStatus) -> bool {
    use std::os::unix::process::ExitStatusExt;

    const SIGINT: i32 = 2;
    status.signal() == Some(SIGINT)
}

#[cfg(not(unix))]
fn killed_by_interrupt(_status: &ExitStatus) -> bool {
    false
}

fn terminate(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
