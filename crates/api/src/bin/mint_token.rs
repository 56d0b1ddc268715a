//! Mint a bearer token for an existing user id (local testing and tooling).
//!
//! Reads `JWT_SECRET` and `TOKEN_TTL_SECS` the same way the server does.

use std::io::Write;

use anyhow::Context;
use chrono::{Duration, Utc};
use clap::Parser;

use bookshelf_auth::Hs256TokenIssuer;
use bookshelf_core::UserId;

#[derive(Debug, Parser)]
#[command(name = "mint-token", about = "Mint an HS256 bearer token for a user id")]
struct Args {
    /// User id to place in the `sub` claim.
    #[arg(long)]
    user: String,

    /// Override the configured token lifetime, in seconds.
    #[arg(long)]
    ttl_secs: Option<i64>,
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = bookshelf_infra::Config::from_env().context("invalid configuration")?;

    let user: UserId = args.user.parse().context("--user must be a UUID")?;
    let ttl = Duration::seconds(args.ttl_secs.unwrap_or(config.token_ttl_secs));

    let token = Hs256TokenIssuer::new(&config.jwt_secret, ttl)
        .issue(user, Utc::now())
        .context("failed to sign token")?;

    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{token}")?;
    Ok(())
}
