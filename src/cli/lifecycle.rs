//! Audit, finalize and reset

use crate::context::AppContext;
use anyhow::{Context, Result};

pub async fn audit(ctx: &AppContext, episode_id: &str) -> Result<()> {
    let report = ctx
        .api
        .audit(episode_id)
        .await
        .context("Failed to audit episode")?;

    println!("🔎 Audit for episode {episode_id}\n");
    for (name, section) in [("Script", &report.script), ("Audio", &report.audio)] {
        if section.complete {
            println!("  ✅ {name} complete");
        } else {
            println!("  ⚠️  {name} incomplete");
        }
        for missing in &section.missing {
            println!("       missing: {missing}");
        }
    }
    if !report.inconsistencies.is_empty() {
        println!("\n  Inconsistencies:");
        for issue in &report.inconsistencies {
            println!("    - {issue}");
        }
    }
    println!();
    if report.can_finalize {
        println!("Ready to finalize.");
    } else {
        println!("Not ready to finalize.");
    }
    Ok(())
}

pub async fn finalize(ctx: &AppContext, episode_id: &str) -> Result<()> {
    let ack = ctx
        .api
        .finalize(episode_id)
        .await
        .context("Failed to finalize episode")?;
    println!(
        "✅ {}",
        ack.message.as_deref().unwrap_or("Episode finalized")
    );
    Ok(())
}

pub async fn reset(ctx: &AppContext, episode_id: &str) -> Result<()> {
    let ack = ctx
        .api
        .reset_episode(episode_id)
        .await
        .context("Failed to reset episode")?;
    println!("🔄 {}", ack.message.as_deref().unwrap_or("Episode reset"));
    Ok(())
}
