// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Set up logging (RUST_LOG, or --verbose for debug output)
// 3. Feed the URLs to an HtmlUrlChecker or a UrlChecker
// 4. Print every link as its event arrives, then a summary
// 5. Exit with proper code (0 = success, 1 = broken links, 2 = error)
// =============================================================================

mod cli;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use link_auditor::{CheckerOptions, HtmlEvent, HtmlUrlChecker, Link, LinkStatus, UrlChecker, UrlEvent};
use log::LevelFilter;

#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let options = cli.options.into_options()?;
    let mut report = Report::new(cli.json);

    match cli.command {
        Commands::Page { urls } => check_pages(urls, options, &mut report).await?,
        Commands::Url { urls } => check_urls(urls, options, &mut report).await?,
    }

    report.print_summary();
    Ok(if report.broken > 0 { 1 } else { 0 })
}

// Reads RUST_LOG first; --verbose turns on debug output for this crate only
fn init_logger(verbose: bool) {
    let mut builder = env_logger::Builder::from_default_env();
    if verbose {
        builder.filter_module("link_auditor", LevelFilter::Debug);
    }
    builder.filter_module("html5ever", LevelFilter::Error);
    builder.filter_module("selectors", LevelFilter::Warn);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    let _ = builder.try_init();
}

// Handles the 'page' subcommand
async fn check_pages(urls: Vec<String>, options: CheckerOptions, report: &mut Report) -> Result<()> {
    let (checker, mut events) = HtmlUrlChecker::new(options)?;

    // End fires whenever the queue drains, so nothing may start before the
    // whole batch is in
    checker.pause();
    for url in &urls {
        checker.enqueue(url, url.clone())?;
    }
    checker.resume();

    while let Some(event) = events.recv().await {
        match event {
            HtmlEvent::Html { page_url, .. } => {
                if !report.json {
                    println!("🔍 Scanning page: {}", page_url);
                }
            }
            HtmlEvent::Link { link, data, .. } => report.add(&link, Some(&data))?,
            HtmlEvent::Page { page_url, error, .. } => match error {
                Some(e) => {
                    report.failed_pages += 1;
                    eprintln!("⚠️  Could not scan {}: {}", page_url, e);
                }
                None => {
                    if !report.json {
                        println!();
                    }
                }
            },
            HtmlEvent::End => break,
        }
    }

    Ok(())
}

// Handles the 'url' subcommand
async fn check_urls(urls: Vec<String>, options: CheckerOptions, report: &mut Report) -> Result<()> {
    let (checker, mut events) = UrlChecker::new(options)?;

    checker.pause();
    for url in &urls {
        checker.enqueue_url(url, None, ())?;
    }
    checker.resume();

    while let Some(event) = events.recv().await {
        match event {
            UrlEvent::Link { link, .. } => report.add(&link, None)?,
            UrlEvent::End => break,
        }
    }

    Ok(())
}

struct Report {
    json: bool,
    alive: usize,
    broken: usize,
    excluded: usize,
    failed_pages: usize,
    header_printed: bool,
}

impl Report {
    fn new(json: bool) -> Self {
        Report {
            json,
            alive: 0,
            broken: 0,
            excluded: 0,
            failed_pages: 0,
            header_printed: false,
        }
    }

    fn add(&mut self, link: &Link, page: Option<&String>) -> Result<()> {
        match link.status {
            LinkStatus::Broken(_) => self.broken += 1,
            LinkStatus::Excluded(_) => self.excluded += 1,
            LinkStatus::Alive | LinkStatus::Unchecked => self.alive += 1,
        }

        if self.json {
            let mut value = serde_json::to_value(link)?;
            if let (Some(page), Some(object)) = (page, value.as_object_mut()) {
                object.insert("page".to_string(), serde_json::Value::String(page.clone()));
            }
            println!("{}", serde_json::to_string(&value)?);
            return Ok(());
        }

        if !self.header_printed {
            print_header();
            self.header_printed = true;
        }

        let url = link
            .url
            .resolved
            .as_ref()
            .map(|url| url.to_string())
            .unwrap_or_else(|| link.url.original.clone());
        let url_display = if url.chars().count() > 57 {
            format!("{}...", url.chars().take(57).collect::<String>())
        } else {
            url
        };

        let location = link.html.as_ref().map(|html| html.selector.as_str()).unwrap_or("");
        println!("{:<60} {:<22} {}", url_display, format_status(&link.status), location);
        Ok(())
    }

    fn print_summary(&self) {
        if self.json {
            return;
        }
        println!();
        println!("📊 Summary:");
        println!("   ✅ OK: {}", self.alive);
        println!("   ❌ Broken: {}", self.broken);
        println!("   ⏭️  Excluded: {}", self.excluded);
        if self.failed_pages > 0 {
            println!("   ⚠️  Pages not scanned: {}", self.failed_pages);
        }
    }
}

fn print_header() {
    println!("{:<60} {:<22} {}", "URL", "STATUS", "SELECTOR");
    println!("{}", "=".repeat(110));
}

fn format_status(status: &LinkStatus) -> String {
    match status {
        LinkStatus::Unchecked => "… UNCHECKED".to_string(),
        LinkStatus::Alive => "✅ OK".to_string(),
        LinkStatus::Broken(reason) => format!("❌ {}", reason),
        LinkStatus::Excluded(reason) => format!("⏭️  EXCLUDED ({})", reason),
    }
}
