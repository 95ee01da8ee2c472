//! Collapsible log groups for CI platforms that understand the
//! `::group::` / `::endgroup::` workflow commands.
//!
//! Groups never nest: while one is open, further `group` calls are inert.

use std::cell::{Cell, RefCell};
use std::env;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};
use tracing::debug;

pub const CI_INDICATOR_VAR: &str = "GITHUB_ACTIONS";
pub const SKIP_GROUP_OUTPUT_VAR: &str = "SKIP_GROUP_OUTPUT";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    #[default]
    Info,
    Warning,
    Error,
    Success,
    Special,
}

impl MessageType {
    fn ansi_code(&self) -> u8 {
        match self {
            Self::Info => 94,
            Self::Warning => 93,
            Self::Error => 31,
            Self::Success => 32,
            Self::Special => 35,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CiEnvironment {
    pub in_ci: bool,
    pub skip_group_output: bool,
}

impl CiEnvironment {
    pub fn from_env() -> Self {
        Self::from_vars(CI_INDICATOR_VAR, SKIP_GROUP_OUTPUT_VAR)
    }

    pub fn from_vars(indicator_var: &str, skip_var: &str) -> Self {
        Self::from_lookup(indicator_var, skip_var, |key| env::var(key).ok())
    }

    /// The indicator must be exactly `"true"`; the skip variable only has to
    /// be present.
    pub fn from_lookup(
        indicator_var: &str,
        skip_var: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Self {
        Self {
            in_ci: lookup(indicator_var).as_deref() == Some("true"),
            skip_group_output: lookup(skip_var).is_some(),
        }
    }

    pub fn groups_enabled(&self) -> bool {
        self.in_ci && !self.skip_group_output
    }
}

/// Console writer that owns the "group open" flag for its output stream.
pub struct CiConsole<W: Write> {
    out: RefCell<W>,
    env: CiEnvironment,
    color: bool,
    active: Cell<bool>,
}

impl CiConsole<io::Stdout> {
    /// Plain output; call `with_color` to style group titles.
    pub fn stdout(env: CiEnvironment) -> Self {
        Self::new(io::stdout(), env)
    }
}

impl<W: Write> CiConsole<W> {
    pub fn new(out: W, env: CiEnvironment) -> Self {
        Self {
            out: RefCell::new(out),
            env,
            color: false,
            active: Cell::new(false),
        }
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    /// Opens a group unless one is already open or the environment disables
    /// grouping. The returned guard closes the group when dropped.
    pub fn group(&self, title: &str, message_type: MessageType) -> CiGroup<'_, W> {
        if self.active.get() || !self.env.groups_enabled() {
            return CiGroup { console: None };
        }

        let styled = if self.color {
            format!("\x1b[{}m{title}\x1b[0m", message_type.ansi_code())
        } else {
            title.to_string()
        };
        if let Err(err) = self.write_line(&format!("::group::{styled}")) {
            debug!(%err, title, "failed writing group start marker");
            return CiGroup { console: None };
        }

        self.active.set(true);
        CiGroup {
            console: Some(self),
        }
    }

    pub fn with_group<T>(&self, title: &str, message_type: MessageType, f: impl FnOnce() -> T) -> T {
        let _group = self.group(title, message_type);
        f()
    }

    pub fn println(&self, line: &str) -> io::Result<()> {
        self.write_line(line)
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut out = self.out.try_borrow_mut().map_err(io::Error::other)?;
        writeln!(out, "{line}")?;
        out.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

#[must_use = "the group closes as soon as the guard is dropped"]
pub struct CiGroup<'a, W: Write> {
    console: Option<&'a CiConsole<W>>,
}

impl<W: Write> CiGroup<'_, W> {
    pub fn is_open(&self) -> bool {
        self.console.is_some()
    }
}

impl<W: Write> Drop for CiGroup<'_, W> {
    fn drop(&mut self) {
        let Some(console) = self.console.take() else {
            return;
        };
        if let Err(err) = console.write_line("::endgroup::") {
            debug!(%err, "failed writing group end marker");
        }
        console.active.set(false);
    }
}
