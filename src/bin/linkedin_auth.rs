//! Interactive LinkedIn OAuth flow: prints the authorization URL, trades the
//! pasted code for an access token and stores it in the env file.
//!
//! Usage: cargo run --bin auth

use anyhow::{Context, Result};
use linkedin_news_poster::auth;
use linkedin_news_poster::config::Config;
use linkedin_news_poster::envfile::upsert_env_var;
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::warn;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("linkedin_news_poster=info".parse()?),
        )
        .init();

    println!("=== LinkedIn OAuth Authentication ===\n");

    let config = Config::from_env()?;
    config
        .linkedin_client_secret
        .as_deref()
        .context("LINKEDIN_CLIENT_SECRET not set. Please set it in your .env file.")?;

    let state = auth::new_state();
    let auth_url = auth::authorization_url(&config, &state)
        .context("Please set LINKEDIN_CLIENT_ID in your .env file.")?;

    println!("🔗 Step 1: Open this URL in your browser:\n");
    println!("{}\n", auth_url);

    println!("📋 Step 2: Authorize the application");
    println!("1. Log in to LinkedIn and approve the requested permissions");
    println!("2. You'll be redirected to {}", config.linkedin_redirect_uri);
    println!("3. Copy the full callback URL (or just its 'code' parameter)");

    print!("\n📝 Step 3: Paste the callback URL or code: ");
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let code = auth::extract_authorization_code(&line, Some(&state))?;

    println!("\n🔄 Step 4: Exchanging code for access token...");
    let client = linkedin_news_poster::build_http_client()?;
    let token = auth::exchange_code_for_token(&client, &config, &code).await?;
    println!("✅ Successfully obtained access token!");
    if let Some(expires_in) = token.expires_in {
        println!("Token expires in: {} days", expires_in / 86_400);
    }

    println!("\n🔍 Step 5: Verifying token and looking up company pages...");
    let (profile, organizations) = futures::future::join(
        auth::fetch_profile(&client, &config, &token.access_token),
        auth::fetch_admin_organizations(&client, &config, &token.access_token),
    )
    .await;

    match profile {
        Ok(profile) => println!("✅ Token verified! Logged in as: {}", profile.display_name()),
        Err(e) => {
            warn!("Profile lookup failed: {:#}", e);
            println!("⚠️  Could not verify token, but it was generated successfully");
        }
    }

    let organizations = match organizations {
        Ok(ids) if !ids.is_empty() => {
            println!("✅ Company pages you administer:");
            for id in &ids {
                println!("  - Company ID: {}", id);
            }
            ids
        }
        Ok(_) => {
            println!("⚠️  No company pages found where you are an administrator");
            Vec::new()
        }
        Err(e) => {
            warn!("Company page lookup failed: {:#}", e);
            println!("⚠️  Could not retrieve company pages");
            println!("You may need to find your company ID manually");
            Vec::new()
        }
    };

    println!("\n💾 Step 6: Saving credentials...");
    let env_file = Path::new(&config.env_file);
    upsert_env_var(env_file, "LINKEDIN_ACCESS_TOKEN", &token.access_token)?;
    println!("✅ Access token saved to {}", env_file.display());

    if config.linkedin_company_id.is_none() {
        if let [only] = organizations.as_slice() {
            upsert_env_var(env_file, "LINKEDIN_COMPANY_ID", only)?;
            println!("✅ Company ID {} saved to {}", only, env_file.display());
        } else {
            println!("\nNext: add LINKEDIN_COMPANY_ID to {}", env_file.display());
        }
    }

    println!("\n🎉 Authentication complete!");
    println!("Run `linkedin-news-poster run` to generate and publish a post.");
    Ok(())
}
