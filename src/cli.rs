// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// The flags map one-to-one onto CheckerOptions. A JSON config file can
// provide the starting point; any flag given on the command line wins.
// =============================================================================

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use link_auditor::{CheckerOptions, FilterLevel, RequestMethod};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "link-auditor",
    version,
    about = "Find broken links in HTML pages",
    long_about = "link-auditor fetches HTML pages, extracts every link (anchors, images, scripts, \
                  citations, ...) and checks each one over HTTP. It exits with code 1 when a \
                  broken link is found, which makes it easy to use in CI."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub options: OptionArgs,

    /// Output one JSON object per link instead of a table
    #[arg(long, global = true)]
    pub json: bool,

    /// Log debug output to stderr
    #[arg(long, short, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch pages and check every link on them
    ///
    /// Example: link-auditor page https://example.com/ https://example.com/about
    Page {
        /// Page URLs to scan
        #[arg(required = true)]
        urls: Vec<String>,
    },

    /// Check URLs directly, without scraping anything
    ///
    /// Example: link-auditor url https://example.com/logo.png
    Url {
        /// URLs to check
        #[arg(required = true)]
        urls: Vec<String>,
    },
}

#[derive(Args, Debug)]
pub struct OptionArgs {
    /// JSON file with checker options
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Pages fetched at the same time
    #[arg(long, global = true)]
    pub max_pages: Option<usize>,

    /// Links checked at the same time
    #[arg(long, global = true)]
    pub max_links: Option<usize>,

    /// Request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Which kinds of links to check
    #[arg(long, value_enum, global = true)]
    pub filter_level: Option<FilterLevel>,

    /// Skip URLs containing this keyword (repeatable)
    #[arg(long = "exclude", global = true)]
    pub excluded_keywords: Vec<String>,

    /// Skip links to other sites
    #[arg(long, global = true)]
    pub exclude_external: bool,

    /// Skip links within the same site
    #[arg(long, global = true)]
    pub exclude_internal: bool,

    /// Use GET instead of HEAD for every check
    #[arg(long, global = true)]
    pub get: bool,
}

impl OptionArgs {
    pub fn into_options(self) -> Result<CheckerOptions> {
        let mut options = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path)
                    .with_context(|| format!("could not read config file {}", path.display()))?;
                CheckerOptions::from_json(&json)
                    .with_context(|| format!("invalid config file {}", path.display()))?
            }
            None => CheckerOptions::default(),
        };

        if let Some(max_pages) = self.max_pages {
            options.max_pages = max_pages;
        }
        if let Some(max_links) = self.max_links {
            options.max_links = max_links;
        }
        if let Some(timeout) = self.timeout {
            options.timeout_secs = timeout;
        }
        if let Some(level) = self.filter_level {
            options.filter_level = level;
        }
        options.excluded_keywords.extend(self.excluded_keywords);
        options.exclude_external_links |= self.exclude_external;
        options.exclude_internal_links |= self.exclude_internal;
        if self.get {
            options.request_method = RequestMethod::Get;
        }

        Ok(options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page_command() {
        let cli = Cli::parse_from([
            "link-auditor",
            "page",
            "https://example.com/",
            "--max-links",
            "4",
            "--filter-level",
            "metadata",
            "--exclude",
            "ads",
        ]);
        assert!(matches!(cli.command, Commands::Page { ref urls } if urls.len() == 1));

        let options = cli.options.into_options().unwrap();
        assert_eq!(options.max_links, 4);
        assert_eq!(options.filter_level, FilterLevel::Metadata);
        assert_eq!(options.excluded_keywords, vec!["ads".to_string()]);
        assert_eq!(options.request_method, RequestMethod::Head);
    }

    #[test]
    fn test_url_command_requires_urls() {
        assert!(Cli::try_parse_from(["link-auditor", "url"]).is_err());
    }
}
