use std::path::Path;

use anyhow::Context;
use reactrank_core::{RankService, RankingConfig, UserId};

pub fn run(data: &Path, user: &str) -> anyhow::Result<()> {
    let user = UserId::parse(user)?;
    let store = super::make_store(Some(data))?;
    let service = RankService::from_config(store, &RankingConfig::default());
    let report = service
        .rank(&user)
        .with_context(|| format!("rank user {user}"))?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
