//! Post a status to Mastodon from the command line.
//!
//! ```text
//! post "Your message here"
//! post --setup
//! ```

use std::io::{self, BufRead, Write};
use std::path::Path;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;

use mention_moderator::social::cli_config::{default_path, CliCredentials};
use mention_moderator::social::MastodonClient;

#[derive(Debug, Parser)]
#[command(name = "post", about = "Post to Mastodon from the command line")]
struct Cli {
    /// Message to post
    message: Option<String>,

    /// Store instance URL and access token
    #[arg(long)]
    setup: bool,
}

fn prompt(stdin: &mut impl BufRead, label: &str) -> Result<String> {
    print!("{label}");
    io::stdout().flush()?;
    let mut line = String::new();
    stdin.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn setup(path: &Path) -> Result<()> {
    println!("Setting up Mastodon CLI poster...");
    let mut stdin = io::stdin().lock();

    let instance_url = prompt(
        &mut stdin,
        "Enter your Mastodon instance URL (e.g., https://mastodon.social): ",
    )?;
    if !(instance_url.starts_with("https://") || instance_url.starts_with("http://")) {
        bail!("instance URL must start with https:// or http://");
    }

    println!("To get your access token:");
    println!("1. Go to {instance_url}/settings/applications");
    println!("2. Click 'New Application'");
    println!("3. Give it a name like 'CLI Poster'");
    println!("4. Leave the scopes as default");
    println!("5. Click 'Submit'");
    println!("6. Copy the 'Your access token' value");

    let access_token = prompt(&mut stdin, "Paste your access token here: ")?;
    if access_token.is_empty() {
        bail!("access token is empty");
    }

    CliCredentials {
        instance_url: instance_url.trim_end_matches('/').to_string(),
        access_token,
    }
    .save(path)?;

    println!("Setup complete! Config saved to {}", path.display());
    println!("Now you can post with: post 'Your message'");
    Ok(())
}

async fn post_message(path: &Path, message: &str) -> Result<()> {
    let creds = CliCredentials::load(path)?;
    let client = MastodonClient::new(&creds.to_social_config())?;
    let status = client
        .post_status(message, None, None)
        .await
        .context("posting status")?;
    println!("Posted successfully!");
    println!("URL: {}", status.url.unwrap_or(status.id));
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt().with_target(false).init();
    let cli = Cli::parse();

    let res = async {
        let path = default_path()?;
        match (cli.setup, cli.message.as_deref()) {
            (true, _) => setup(&path),
            (false, Some(msg)) if !msg.trim().is_empty() => post_message(&path, msg).await,
            _ => {
                println!("Usage: post 'Your message here'");
                println!("       post --setup");
                Ok(())
            }
        }
    }
    .await;

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
