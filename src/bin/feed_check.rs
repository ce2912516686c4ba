use anyhow::Result;
use colored::Colorize;
use std::env;
use std::process;

use feedpage::logging;
use feedpage::normalize;
use feedpage::rss::{FeedSource, FetchErrorKind, HttpFeedSource};

#[tokio::main]
async fn main() -> Result<()> {
    logging::configure_logging();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage(&args[0]);
        return Ok(());
    }

    let url = &args[1];
    let phrase = args.get(2);

    println!("Checking feed: {}", url);

    let source = HttpFeedSource::with_defaults()?;
    let document = match source.fetch_and_parse(url).await {
        Ok(document) => document,
        Err(err) => {
            let kind = format!("{:?}", err.kind);
            let colored_kind = match err.kind {
                FetchErrorKind::NetworkFailure => kind.bright_red(),
                FetchErrorKind::InvalidUrl | FetchErrorKind::ParseFailure => kind.bright_yellow(),
            };
            println!("{}: {}", "Status".bright_blue(), colored_kind);
            eprintln!("{}", err.message.bright_red());
            process::exit(1);
        }
    };

    println!("\n{}", "═".repeat(100).bright_blue());
    println!(
        "{}  {}",
        "FEED DIAGNOSTICS".bright_blue(),
        url.bright_yellow()
    );
    println!("{}", "═".repeat(100).bright_blue());
    println!("{}: {}", "Status".bright_blue(), "Success".bright_green());
    println!(
        "{}: {}",
        "Title".bright_blue(),
        document.title.as_deref().unwrap_or("[No Title]")
    );
    println!("{}: {}", "Entries Found".bright_blue(), document.items.len());

    let mut undated = 0;
    let mut matched = 0;

    println!("\n{}", "Feed Entries".bright_green());
    println!("{}", "─".repeat(80).dimmed());
    for (i, item) in document.items.into_iter().enumerate() {
        let raw_date = item.published_raw.clone();
        let article = normalize(item);

        let date = match article.published {
            Some(published) => published.to_rfc3339().normal(),
            None if raw_date.is_empty() => {
                undated += 1;
                "[No Date]".dimmed()
            }
            None => {
                undated += 1;
                format!("[Unparseable: {}]", raw_date).bright_red()
            }
        };

        let is_match = phrase.map_or(false, |p| article.title.contains(p.as_str()));
        if is_match {
            matched += 1;
        }
        let title = if article.title.is_empty() {
            "[No Title]".dimmed()
        } else if is_match {
            article.title.bright_green()
        } else {
            article.title.bright_white()
        };

        println!("{}. {} ({})\n   {}", i + 1, title, date, article.link.bright_cyan());
    }

    println!("\n{}", "═".repeat(100).bright_blue());
    if undated > 0 {
        println!("{} entries have no usable date and will sort last", undated);
    }
    if let Some(phrase) = phrase {
        println!("{} entries match {:?}", matched, phrase);
    }

    Ok(())
}

// Print usage instructions
fn print_usage(program_name: &str) {
    println!("Usage: {} <feed_url> [phrase]", program_name);
    println!("\nFetches and parses one feed the same way a full run does.");
    println!("With a phrase, highlights the titles the page would keep.");
    println!("\nExamples:");
    println!("  {} https://www.example.com/feed", program_name);
    println!("  {} https://www.example.com/feed Acquisition", program_name);
}
