//! sessionfs command-line driver.
//!
//! Builds a session filesystem from a RON config and drives it in-process
//! through the same call table a native filesystem driver would use.
//!
//! Usage:
//!   # Interactive shell (commands on stdin)
//!   sessionfs
//!   sessionfs --config sessionfs.ron shell
//!
//!   # One request/response round trip
//!   sessionfs ask chat "hello there"

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, fmt};

use sessionfs_kernel::{DriverDispatch, FileAttr, SessionFsConfig, SessionRouter};

/// Drive a sessionfs mount from the command line.
#[derive(Parser, Debug)]
#[command(name = "sessionfs")]
#[command(about = "Session request/response filesystem, driven in-process")]
struct Args {
    /// RON configuration file (defaults to an echo backend)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read filesystem commands from stdin
    Shell,
    /// Create a session, send one prompt, print the reply
    Ask {
        /// Session name
        session: String,
        /// Prompt words, joined with spaces
        #[arg(required = true)]
        prompt: Vec<String>,
    },
}

type Driver = DriverDispatch<SessionRouter>;

fn main() -> Result<()> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries file contents.
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();

    let config = match &args.config {
        Some(path) => SessionFsConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => SessionFsConfig::default(),
    };
    tracing::info!(backend = ?config.backend, "starting sessionfs");

    let router = SessionRouter::from_config(&config).context("starting backend")?;
    let driver = DriverDispatch::new(Arc::new(router));

    match args.command.unwrap_or(Command::Shell) {
        Command::Shell => run_shell(&driver),
        Command::Ask { session, prompt } => ask(&driver, &session, &prompt.join(" ")),
    }
}

/// Turn a negative driver result into an error.
fn check(op: &str, path: &str, rc: i32) -> Result<i32> {
    if rc < 0 {
        let err = io::Error::from_raw_os_error(-rc);
        anyhow::bail!("{op} {path}: {err}");
    }
    Ok(rc)
}

fn ask(driver: &Driver, session: &str, prompt: &str) -> Result<()> {
    let dir = format!("/{session}");
    check("mkdir", &dir, driver.mkdir(&dir, 0o755))?;
    send(driver, &format!("{dir}/input"), prompt.as_bytes())?;

    let output = read_file(driver, &format!("{dir}/output"))?;
    let error = read_file(driver, &format!("{dir}/error"))?;
    let mut stdout = io::stdout().lock();
    stdout.write_all(&output)?;
    if !output.ends_with(b"\n") && !output.is_empty() {
        stdout.write_all(b"\n")?;
    }
    if !error.is_empty() {
        anyhow::bail!("{}", String::from_utf8_lossy(&error));
    }
    Ok(())
}

/// open → write from offset 0 → release, as `echo text > path` would.
fn send(driver: &Driver, path: &str, data: &[u8]) -> Result<()> {
    check("open", path, driver.open(path))?;
    let written = check("write", path, driver.write(path, data, 0));
    let released = check("release", path, driver.release(path));
    written?;
    released?;
    Ok(())
}

/// Read a whole file in fixed-size chunks, the way `cat` does.
fn read_file(driver: &Driver, path: &str) -> Result<Vec<u8>> {
    check("open", path, driver.open(path))?;
    let mut contents = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = check("read", path, driver.read(path, &mut chunk, contents.len() as i64))?;
        if n == 0 {
            break;
        }
        contents.extend_from_slice(&chunk[..n as usize]);
    }
    check("release", path, driver.release(path))?;
    Ok(contents)
}

const SHELL_HELP: &str = "\
commands:
  mkdir /<session>           create (or reset) a session
  ls [path]                  list a directory (default /)
  stat <path>                show attributes
  cat <path>                 print a file
  send <path> <text...>      write text from offset 0 and close (triggers on input)
  write <path> <off> <text>  write text at an offset without closing
  close <path>               release a handle (triggers on input)
  help                       this text
  quit                       leave";

fn run_shell(driver: &Driver) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if matches!(line, "quit" | "exit") {
            break;
        }
        if let Err(e) = shell_command(driver, line, &mut stdout) {
            eprintln!("{e:#}");
        }
        stdout.flush()?;
    }
    Ok(())
}

fn shell_command(driver: &Driver, line: &str, out: &mut impl Write) -> Result<()> {
    let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    match cmd {
        "help" => writeln!(out, "{SHELL_HELP}")?,
        "mkdir" => {
            check("mkdir", rest, driver.mkdir(rest, 0o755))?;
        }
        "ls" => {
            let path = if rest.is_empty() { "/" } else { rest };
            let mut names = Vec::new();
            check(
                "ls",
                path,
                driver.readdir(path, |name, _| {
                    names.push(name.to_string());
                    false
                }),
            )?;
            for name in names.iter().filter(|n| *n != "." && *n != "..") {
                writeln!(out, "{name}")?;
            }
        }
        "stat" => {
            let mut attr = FileAttr::file(0, 0);
            check("stat", rest, driver.getattr(rest, &mut attr))?;
            writeln!(
                out,
                "{:?} mode={:o} nlink={} size={}",
                attr.kind,
                attr.mode(),
                attr.nlink,
                attr.size
            )?;
        }
        "cat" => {
            let data = read_file(driver, rest)?;
            out.write_all(&data)?;
            if !data.ends_with(b"\n") && !data.is_empty() {
                writeln!(out)?;
            }
        }
        "send" => {
            let (path, text) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
            send(driver, path, text.trim_start().as_bytes())?;
        }
        "write" => {
            let mut parts = rest.splitn(3, char::is_whitespace);
            let (Some(path), Some(offset)) = (parts.next(), parts.next()) else {
                anyhow::bail!("usage: write <path> <offset> <text>");
            };
            let offset: i64 = offset.parse().context("offset must be a number")?;
            let text = parts.next().unwrap_or("");
            let n = check("write", path, driver.write(path, text.as_bytes(), offset))?;
            writeln!(out, "{n} bytes")?;
        }
        "close" => {
            check("close", rest, driver.release(rest))?;
        }
        other => anyhow::bail!("unknown command: {other} (try `help`)"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> Driver {
        let router = SessionRouter::from_config(&SessionFsConfig::default()).unwrap();
        DriverDispatch::new(Arc::new(router))
    }

    fn run(driver: &Driver, line: &str) -> String {
        let mut out = Vec::new();
        shell_command(driver, line, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_shell_round_trip() {
        let d = driver();
        run(&d, "mkdir /chat");
        run(&d, "send /chat/input hello world");
        assert_eq!(run(&d, "cat /chat/output"), "You said: hello world\n");
        assert_eq!(run(&d, "ls /"), "chat\n");
        assert_eq!(run(&d, "ls /chat"), "input\noutput\nerror\n");
    }

    #[test]
    fn test_shell_errors() {
        let d = driver();
        let mut sink = Vec::new();
        let err = shell_command(&d, "cat /ghost/output", &mut sink).unwrap_err();
        assert!(err.to_string().contains("/ghost/output"));

        run(&d, "mkdir /s");
        assert!(shell_command(&d, "send /s/output nope", &mut sink).is_err());
        assert!(shell_command(&d, "frobnicate", &mut sink).is_err());
    }

    #[test]
    fn test_shell_partial_write_then_close() {
        let d = driver();
        run(&d, "mkdir /s");
        assert_eq!(run(&d, "write /s/input 0 abc"), "3 bytes\n");
        assert_eq!(run(&d, "write /s/input 3 def"), "3 bytes\n");
        run(&d, "close /s/input");
        assert_eq!(run(&d, "cat /s/output"), "You said: abcdef\n");
    }

    #[test]
    fn test_ask() {
        let d = driver();
        ask(&d, "one", "hi").unwrap();
        let output = read_file(&d, "/one/output").unwrap();
        assert_eq!(output, b"You said: hi");
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["sessionfs", "ask", "chat", "hello", "there"]);
        match args.command {
            Some(Command::Ask { session, prompt }) => {
                assert_eq!(session, "chat");
                assert_eq!(prompt, ["hello", "there"]);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
