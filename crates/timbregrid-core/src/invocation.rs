//! Typed description of an external tool call.
//!
//! Arguments are passed to the process verbatim (no shell), so paths with
//! spaces or quotes are safe and tests can inspect exactly what would run.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalToolInvocation {
    program: PathBuf,
    args: Vec<OsString>,
}

impl ExternalToolInvocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    /// `--<name>=<value>`
    pub fn flag(mut self, name: &str, value: impl AsRef<OsStr>) -> Self {
        let mut arg = OsString::from(format!("--{}=", name));
        arg.push(value.as_ref());
        self.args.push(arg);
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    /// Value of a `--<name>=` flag, if present.
    pub fn flag_value(&self, name: &str) -> Option<&OsStr> {
        let prefix = format!("--{}=", name);
        self.args.iter().find_map(|arg| {
            let text = arg.to_str()?;
            text.strip_prefix(&prefix).map(OsStr::new)
        })
    }

    pub fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

impl fmt::Display for ExternalToolInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}
