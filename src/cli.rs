use crate::config::Config;
use crate::display::{render_generated_post, render_manual_view, render_publish_results};
use crate::linkedin::{self, PublishOutcome, PublishTarget};
use crate::pipeline::{self, Stage};
use crate::post::LinkedInPost;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};
use std::path::Path;

#[derive(Parser, Debug)]
#[command(author, version, about = "Turn the latest AI news into bilingual LinkedIn company posts")]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
#[clap(rename_all = "lower_case")]
pub enum Command {
    /// Fetch news, draft the English and Spanish post and save it
    Generate,
    /// Publish a saved post to the company page
    Post {
        /// Version to publish; asks interactively when omitted
        #[arg(short, long, value_parser = ["en", "es", "both"])]
        language: Option<String>,
        /// Saved post (defaults to POST_FILE)
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Show a saved post ready to paste into LinkedIn by hand
    Manual {
        /// Also write linkedin_post_<code>.txt for these versions
        #[arg(short, long, value_parser = ["en", "es", "both"])]
        save: Option<String>,
        #[arg(short, long)]
        file: Option<String>,
    },
    /// Generate a post, then publish it
    Run {
        /// Version to publish, or `skip`; asks interactively when omitted
        #[arg(short, long, value_parser = ["en", "es", "both", "skip"])]
        language: Option<String>,
    },
    /// Start the web UI
    Serve {
        /// Port number (defaults to PORT, then 5001)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

/// What the user picked from the publish menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Publish(PublishTarget),
    Skip,
    Invalid,
}

/// Print the publish menu and read one answer.
///
/// End of input counts as skipping.
pub fn prompt_publish_choice<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    allow_skip: bool,
    saved_to: &str,
) -> Result<MenuChoice> {
    writeln!(output, "\nWhich version would you like to post?")?;
    writeln!(output, "1. English only")?;
    writeln!(output, "2. Spanish only")?;
    writeln!(output, "3. Both versions")?;
    if allow_skip {
        writeln!(output, "4. Skip posting (post saved to {})", saved_to)?;
        write!(output, "\nEnter your choice (1-4): ")?;
    } else {
        write!(output, "\nEnter your choice (1-3): ")?;
    }
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(MenuChoice::Skip);
    }

    Ok(parse_menu_choice(&line, allow_skip))
}

fn parse_menu_choice(answer: &str, allow_skip: bool) -> MenuChoice {
    match answer.trim() {
        "1" => MenuChoice::Publish(PublishTarget::English),
        "2" => MenuChoice::Publish(PublishTarget::Spanish),
        "3" => MenuChoice::Publish(PublishTarget::Both),
        "4" if allow_skip => MenuChoice::Skip,
        _ => MenuChoice::Invalid,
    }
}

/// `--language` value for `run`
fn choice_from_flag(value: &str) -> Result<MenuChoice> {
    if value.eq_ignore_ascii_case("skip") {
        return Ok(MenuChoice::Skip);
    }
    Ok(MenuChoice::Publish(value.parse()?))
}

/// Run one subcommand to completion
pub async fn execute(command: Command, mut config: Config, client: reqwest::Client) -> Result<()> {
    match command {
        Command::Generate => handle_generate(&client, &config).await.map(|_| ()),
        Command::Post { language, file } => handle_post(&client, &config, language, file).await,
        Command::Manual { save, file } => handle_manual(&config, save, file),
        Command::Run { language } => handle_run(&client, &config, language).await,
        Command::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            crate::web::serve(config, client).await
        }
    }
}

async fn handle_generate(client: &reqwest::Client, config: &Config) -> Result<LinkedInPost> {
    // Fail before any network call when the key is missing
    config
        .openai_api_key()
        .context("OPENAI_API_KEY is required. Please set it in your .env file or environment.")?;

    println!("=== LinkedIn Posts - AI News Generator ===\n");
    let post = pipeline::generate(client, config, |stage| {
        if stage != Stage::Done {
            println!("🔄 {}", stage);
        }
    })
    .await?;

    println!("\n{}", render_generated_post(&post, &config.post_file));
    // The pipeline keeps a post it could not write; make that visible here
    if LinkedInPost::load(&config.post_file).ok().as_ref() != Some(&post) {
        println!(
            "\n⚠️  Could not save post to {}. Copy it from the output above.",
            config.post_file
        );
    }
    println!("\n✅ LinkedIn post generated successfully!");
    Ok(post)
}

async fn handle_post(
    client: &reqwest::Client,
    config: &Config,
    language: Option<String>,
    file: Option<String>,
) -> Result<()> {
    let path = file.unwrap_or_else(|| config.post_file.clone());
    let post = LinkedInPost::load(&path)?;

    // Check credentials before asking anything
    config.linkedin_access_token()?;
    config.linkedin_company_id()?;

    let target = match language {
        Some(value) => value.parse()?,
        None => {
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            match prompt_publish_choice(&mut input, &mut std::io::stdout(), false, &path)? {
                MenuChoice::Publish(target) => target,
                MenuChoice::Skip => {
                    println!("\nNothing published.");
                    return Ok(());
                }
                MenuChoice::Invalid => anyhow::bail!("Invalid choice, expected 1, 2 or 3"),
            }
        }
    };

    publish_and_report(client, config, &post, target).await
}

fn handle_manual(config: &Config, save: Option<String>, file: Option<String>) -> Result<()> {
    let path = file.unwrap_or_else(|| config.post_file.clone());
    let post = LinkedInPost::load(&path)?;

    println!("{}", render_manual_view(&post));

    if let Some(save) = save {
        let target: PublishTarget = save.parse()?;
        let dir = Path::new(&path)
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        println!();
        for language in target.languages() {
            let saved = post.save_manual_copy(dir, language)?;
            println!("💾 {} version saved to: {}", language.name(), saved.display());
        }
    }

    Ok(())
}

async fn handle_run(
    client: &reqwest::Client,
    config: &Config,
    language: Option<String>,
) -> Result<()> {
    println!("🔄 Step 1: Generating AI news post...\n");
    let post = handle_generate(client, config).await?;

    println!("\n🔄 Step 2: Posting to LinkedIn...");
    if let Err(e) = config
        .linkedin_access_token()
        .and_then(|_| config.linkedin_company_id())
    {
        println!("❌ {}", e);
        println!("Please set it in your .env file to enable LinkedIn posting.");
        println!("For now, the post has been saved to {}", config.post_file);
        return Ok(());
    }

    let choice = match language {
        Some(value) => choice_from_flag(&value)?,
        None => {
            let stdin = std::io::stdin();
            let mut input = stdin.lock();
            prompt_publish_choice(&mut input, &mut std::io::stdout(), true, &config.post_file)?
        }
    };

    match choice {
        MenuChoice::Publish(target) => publish_and_report(client, config, &post, target).await,
        MenuChoice::Skip => {
            println!(
                "\n✅ Post saved to {}. You can post it manually later.",
                config.post_file
            );
            Ok(())
        }
        MenuChoice::Invalid => {
            println!("❌ Invalid choice. Post saved to {}.", config.post_file);
            Ok(())
        }
    }
}

async fn publish_and_report(
    client: &reqwest::Client,
    config: &Config,
    post: &LinkedInPost,
    target: PublishTarget,
) -> Result<()> {
    println!("\n📤 Publishing {} version to LinkedIn...", target);
    let outcomes = linkedin::publish(client, config, post, target).await;
    println!("\n{}", render_publish_results(&outcomes));
    ensure_all_published(&outcomes)
}

fn ensure_all_published(outcomes: &[PublishOutcome]) -> Result<()> {
    let failed = outcomes.iter().filter(|o| !o.is_success()).count();
    if failed > 0 {
        anyhow::bail!("{} of {} posts failed to publish", failed, outcomes.len());
    }
    Ok(())
}
