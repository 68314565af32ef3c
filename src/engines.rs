use std::collections::BTreeMap;

use log::debug;

use crate::error::{Result, WebSearchError};

/// Built-in engines. Each template ends exactly where the encoded query is
/// appended.
pub const BUILTIN_ENGINES: &[(&str, &str)] = &[
    ("google", "https://www.google.com/search?q="),
    ("bing", "https://www.bing.com/search?q="),
    ("brave", "https://search.brave.com/search?q="),
    ("yahoo", "https://search.yahoo.com/search?p="),
    ("duckduckgo", "https://www.duckduckgo.com/?q="),
    ("startpage", "https://www.startpage.com/do/search?q="),
    ("yandex", "https://yandex.ru/yandsearch?text="),
    ("github", "https://github.com/search?q="),
    ("baidu", "https://www.baidu.com/s?wd="),
    ("ecosia", "https://www.ecosia.org/search?q="),
    ("goodreads", "https://www.goodreads.com/search?q="),
    ("qwant", "https://www.qwant.com/?q="),
    ("givero", "https://www.givero.com/search?q="),
    ("stackoverflow", "https://stackoverflow.com/search?q="),
    ("wolframalpha", "https://www.wolframalpha.com/input/?i="),
    ("archive", "https://web.archive.org/web/*/"),
    ("scholar", "https://scholar.google.com/scholar?q="),
    ("ask", "https://www.ask.com/web?q="),
    ("youtube", "https://www.youtube.com/results?search_query="),
    ("deepl", "https://www.deepl.com/translator#auto/auto/"),
    ("dockerhub", "https://hub.docker.com/search?q="),
    ("npmpkg", "https://www.npmjs.com/search?q="),
    ("packagist", "https://packagist.org/?query="),
    ("gopkg", "https://pkg.go.dev/search?m=package&q="),
    ("rscrate", "https://crates.io/search?q="),
    ("rsdoc", "https://docs.rs/releases/search?query="),
    ("reddit", "https://www.reddit.com/search/?q="),
    ("twitter", "https://twitter.com/search?q="),
    ("chatgpt", "https://chatgpt.com/?q="),
    ("claudeai", "https://claude.ai/new?q="),
    ("grok", "https://grok.com/?q="),
    ("google-ai", "https://www.google.com/search?udm=50&q="),
    ("mistral", "https://chat.mistral.ai/chat?q="),
    ("ppai", "https://www.perplexity.ai/search/new?q="),
];

/// Engine name to URL template, fixed for the lifetime of one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineTable {
    engines: BTreeMap<String, String>,
}

impl EngineTable {
    pub fn builtin() -> Self {
        let engines = BUILTIN_ENGINES
            .iter()
            .map(|(name, template)| (name.to_string(), template.to_string()))
            .collect();
        Self { engines }
    }

    /// Overlays `overrides` in order. A repeated name replaces the earlier
    /// template; unknown names are added.
    pub fn with_overrides<I>(mut self, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (name, template) in overrides {
            validate_entry(&name, &template)?;
            match self.engines.insert(name.clone(), template) {
                Some(previous) => debug!("Engine '{name}' overrides {previous}"),
                None => debug!("Engine '{name}' added"),
            }
        }
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.engines.get(name).map(String::as_str)
    }

    /// Engine names in lexicographic order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.engines.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}

impl Default for EngineTable {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Reduces a template to `scheme://host` by keeping the first two non-empty
/// `/`-separated segments.
pub fn homepage(template: &str) -> String {
    template
        .split('/')
        .filter(|segment| !segment.is_empty())
        .take(2)
        .collect::<Vec<_>>()
        .join("//")
}

fn validate_entry(name: &str, template: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(WebSearchError::Config(format!(
            "engine name for template '{template}' is empty"
        )));
    }

    let has_host = template
        .split_once("://")
        .map(|(scheme, rest)| !scheme.is_empty() && !rest.split('/').next().unwrap_or("").is_empty())
        .unwrap_or(false);
    if !has_host {
        return Err(WebSearchError::Config(format!(
            "template for engine '{name}' must start with scheme://host, got '{template}'"
        )));
    }

    Ok(())
}
