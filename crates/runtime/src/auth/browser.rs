//! Opening the authorize URL in the user's browser.

use std::io;
use std::process::{Command, Stdio};

pub trait BrowserOpener: Send + Sync {
	fn open(&self, url: &str) -> io::Result<()>;
}

/// Hands the URL to the platform's default URL handler.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl BrowserOpener for SystemBrowser {
	fn open(&self, url: &str) -> io::Result<()> {
		let mut cmd = opener_command(url);
		cmd.stdin(Stdio::null()).stdout(Stdio::null()).stderr(Stdio::null());

		#[cfg(unix)]
		std::os::unix::process::CommandExt::process_group(&mut cmd, 0);

		cmd.spawn().map(|_| ())
	}
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> Command {
	let mut cmd = Command::new("open");
	cmd.arg(url);
	cmd
}

#[cfg(windows)]
fn opener_command(url: &str) -> Command {
	let mut cmd = Command::new("cmd");
	cmd.args(["/C", "start", "", url]);
	cmd
}

#[cfg(not(any(target_os = "macos", windows)))]
fn opener_command(url: &str) -> Command {
	let mut cmd = Command::new("xdg-open");
	cmd.arg(url);
	cmd
}

/// Opener that never launches anything; the URL is only announced.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBrowser;

impl BrowserOpener for NoBrowser {
	fn open(&self, _url: &str) -> io::Result<()> {
		Err(io::Error::new(io::ErrorKind::Unsupported, "browser launch disabled"))
	}
}
