use std::path::Path;

use reactrank_core::{UserId, statistics_report};

pub fn run(data: &Path, user: Option<&str>, exclude_percent: f64) -> anyhow::Result<()> {
    if !(0.0..50.0).contains(&exclude_percent) {
        anyhow::bail!("--exclude-percent must be in [0, 50), got {exclude_percent}");
    }
    let user = user.map(UserId::parse).transpose()?;
    let store = super::make_store(Some(data))?;
    let report = statistics_report(store.as_ref(), user.as_ref(), exclude_percent)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
