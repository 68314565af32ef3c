use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

const AFTER_HELP: &str = "\
Without arguments, or with --list, prints the available engines.
With only an engine, opens its homepage.
--open hands any URL or file path to the default application.

Engines can be added or replaced in $XDG_CONFIG_HOME/websearch/config.toml
(or ~/.websearch.toml, ./.websearch.toml, $WEB_SEARCH_CONFIG):

    browser = \"firefox\"
    [engines]
    myengine = \"https://example.com/s?q=\"

or with WEB_SEARCH_ENGINES=\"name template [name template ...]\".
$BROWSER, when set, opens http(s) URLs instead of the system opener.";

#[derive(Parser, Debug)]
#[command(
    name = "web",
    version,
    about = "Search the web from your terminal",
    disable_help_flag = true,
    after_help = AFTER_HELP
)]
pub struct Cli {
    /// Print help.
    #[arg(short = 'h', long = "help")]
    pub help: bool,

    /// List the available engines.
    #[arg(short = 'l', long = "list")]
    pub list: bool,

    /// Open TARGET (a URL or a file path) with the default application.
    #[arg(short = 'o', long = "open", value_name = "TARGET", conflicts_with_all = ["list", "engine"])]
    pub open: Option<String>,

    /// Print the command that would be run instead of running it.
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long)]
    pub verbose: bool,

    /// Write log output to FILE instead of stderr.
    #[arg(long, value_name = "FILE")]
    pub log: Option<PathBuf>,

    /// Read engines from FILE instead of the default locations.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Engine to dispatch to, e.g. google or duckduckgo.
    pub engine: Option<String>,

    /// Words to search for. Without them the engine's homepage is opened.
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_parser = clap::value_parser!(OsString)
    )]
    pub query: Vec<OsString>,
}

/// What the command line asks for, in order of precedence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Help,
    List,
    Search { engine: String, query: Vec<OsString> },
    OpenTarget(String),
}

impl Cli {
    pub fn action(&self) -> Action {
        if self.help {
            return Action::Help;
        }
        if let Some(target) = &self.open {
            return Action::OpenTarget(target.clone());
        }
        match &self.engine {
            Some(engine) if !self.list => Action::Search {
                engine: engine.clone(),
                query: self.query.clone(),
            },
            _ => Action::List,
        }
    }
}

/// Usage text shown by `-h`/`--help`.
pub fn usage() -> String {
    let mut cmd = Cli::command();
    cmd.render_help().to_string()
}
