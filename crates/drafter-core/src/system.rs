//! Clipboard and mail client access through the platform's helper programs.

use std::io::Write;
use std::process::{Child, Command, ExitStatus, Stdio};

use tracing::debug;

use crate::error::HostError;
use crate::host::{Clipboard, MailLauncher};

const CLIPBOARD_HELPERS: &[(&str, &[&str])] = &[
    ("pbcopy", &[]),
    ("wl-copy", &[]),
    ("xclip", &["-selection", "clipboard"]),
    ("xsel", &["--clipboard", "--input"]),
];

#[cfg(target_os = "macos")]
const OPENERS: &[&str] = &["open"];
#[cfg(target_os = "windows")]
const OPENERS: &[&str] = &["explorer"];
#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const OPENERS: &[&str] = &["xdg-open", "gio"];

/// Feed `input` to the child's stdin, if any, then reap it.
///
/// The child is waited on even when the write fails, so no helper is left
/// behind as a zombie. A failed write is reported after the wait.
fn finish(child: &mut Child, input: Option<&str>) -> Result<ExitStatus, HostError> {
    let written = match (child.stdin.take(), input) {
        (Some(mut stdin), Some(input)) => stdin.write_all(input.as_bytes()),
        _ => Ok(()),
    };
    let status = child.wait()?;
    written?;
    Ok(status)
}

/// Pipes text into the first clipboard helper that can be started.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClipboard;

impl Clipboard for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), HostError> {
        for (program, args) in CLIPBOARD_HELPERS {
            let mut child = match Command::new(program)
                .args(*args)
                .stdin(Stdio::piped())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            {
                Ok(child) => child,
                Err(_) => continue,
            };

            let status = finish(&mut child, Some(text))?;
            if !status.success() {
                return Err(HostError::Failed {
                    helper: program.to_string(),
                    status,
                });
            }
            debug!(helper = program, "copied to clipboard");
            return Ok(());
        }
        Err(HostError::Unavailable("clipboard"))
    }
}

/// Opens URIs with the desktop's default handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMailLauncher;

impl MailLauncher for SystemMailLauncher {
    fn open(&self, uri: &str) -> Result<(), HostError> {
        for program in OPENERS {
            let mut command = Command::new(program);
            if *program == "gio" {
                command.arg("open");
            }
            let mut child = match command
                .arg(uri)
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
            {
                Ok(child) => child,
                Err(_) => continue,
            };

            // Openers hand off to the desktop and exit quickly. explorer
            // reports failure even when it opened the target.
            let status = finish(&mut child, None)?;
            if !status.success() && *program != "explorer" {
                return Err(HostError::Failed {
                    helper: program.to_string(),
                    status,
                });
            }
            debug!(opener = program, "handed uri to opener");
            return Ok(());
        }
        Err(HostError::Unavailable("URI opener"))
    }
}
