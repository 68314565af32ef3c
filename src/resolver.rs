use std::borrow::Cow;
use std::ffi::OsStr;
use std::io::Write;

use log::debug;

use crate::engines::{self, EngineTable};
use crate::error::{Result, WebSearchError};
use crate::opener::{OpenTarget, Opener};
use crate::percent::{self, EncodingOptions};

/// How a single invocation ended. Rejection is the `Err` side of the
/// operations below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Searched(String),
    WentHome(String),
    Opened(String),
    ListedEngines,
    ShowedHelp,
}

impl Outcome {
    pub fn url(&self) -> Option<&str> {
        match self {
            Outcome::Searched(url) | Outcome::WentHome(url) | Outcome::Opened(url) => {
                Some(url.as_str())
            }
            Outcome::ListedEngines | Outcome::ShowedHelp => None,
        }
    }
}

/// Turns an engine name and query words into a URL and opens it.
pub struct Resolver {
    table: EngineTable,
    opener: Opener,
    charset: Option<String>,
}

impl Resolver {
    pub fn new(table: EngineTable, opener: Opener) -> Self {
        Self {
            table,
            opener,
            charset: None,
        }
    }

    /// Charset the query words arrive in. `None` means UTF-8.
    pub fn with_charset(mut self, charset: Option<String>) -> Self {
        self.charset = charset;
        self
    }

    /// Builds the URL for `engine` without opening it: a search URL when
    /// `query` has words, the engine's homepage otherwise.
    pub fn plan<S: AsRef<OsStr>>(&self, engine: &str, query: &[S]) -> Result<Outcome> {
        let template = self
            .table
            .get(engine)
            .ok_or_else(|| WebSearchError::UnsupportedEngine {
                engine: engine.to_string(),
            })?;

        if query.is_empty() {
            let home = engines::homepage(template);
            debug!("No query for {engine}, going to {home}");
            return Ok(Outcome::WentHome(home));
        }

        let mut joined = Vec::new();
        for (i, word) in query.iter().enumerate() {
            if i > 0 {
                joined.push(b' ');
            }
            joined.extend_from_slice(&os_bytes(word.as_ref())?);
        }

        let encoded = percent::encode_bytes(&joined, self.charset.as_deref(), &EncodingOptions::query())?;
        Ok(Outcome::Searched(format!("{template}{encoded}")))
    }

    pub fn resolve<S: AsRef<OsStr>>(&self, engine: &str, query: &[S]) -> Result<Outcome> {
        let outcome = self.plan(engine, query)?;
        if let Some(url) = outcome.url() {
            self.opener.open(&OpenTarget::Url(url.to_string()))?;
        }
        Ok(outcome)
    }

    /// Opens an arbitrary URL or local file, bypassing the engine table.
    pub fn open_target(&self, target: &str) -> Result<Outcome> {
        self.opener.open(&OpenTarget::parse(target))?;
        Ok(Outcome::Opened(target.to_string()))
    }

    /// Writes every engine name, sorted, one per line.
    pub fn list_engines<W: Write>(&self, out: &mut W) -> Result<Outcome> {
        for name in self.table.names() {
            writeln!(out, "{name}")?;
        }
        Ok(Outcome::ListedEngines)
    }

    /// Writes the usage text. Needs no engine table.
    pub fn help<W: Write>(out: &mut W) -> Result<Outcome> {
        writeln!(out, "{}", crate::cli::usage())?;
        Ok(Outcome::ShowedHelp)
    }
}

#[cfg(unix)]
fn os_bytes(word: &OsStr) -> Result<Cow<'_, [u8]>> {
    use std::os::unix::ffi::OsStrExt;
    Ok(Cow::Borrowed(word.as_bytes()))
}

#[cfg(not(unix))]
fn os_bytes(word: &OsStr) -> Result<Cow<'_, [u8]>> {
    word.to_str()
        .map(|s| Cow::Borrowed(s.as_bytes()))
        .ok_or_else(|| WebSearchError::EncodingConversion {
            charset: "UTF-16".to_string(),
            reason: "argument is not valid Unicode".to_string(),
        })
}
