//! Episode, show and character listings

use super::EpisodeFilter;
use crate::context::AppContext;
use anyhow::{Context, Result};
use showrunner_api::{EpisodeApi, EpisodeQuery, ShowQuery};
use showrunner_core::{Episode, WorkflowKind};

pub async fn list_episodes(ctx: &AppContext, filter: EpisodeFilter) -> Result<()> {
    let query = EpisodeQuery {
        show_id: filter.show,
        page: Some(filter.page),
        limit: filter.limit,
        search: filter.search,
        status: filter.status,
        season: filter.season,
    };
    let page = ctx
        .api
        .list_episodes(&query)
        .await
        .context("Failed to list episodes")?;

    if page.items.is_empty() {
        println!("No episodes found.");
        return Ok(());
    }
    for episode in &page.items {
        print_episode_row(episode);
    }
    println!(
        "\nPage {} of {} ({} episodes)",
        page.page, page.total_pages, page.total
    );
    Ok(())
}

fn print_episode_row(episode: &Episode) {
    println!(
        "{:<8} {:<40} {:<12} script: {:<10} audio: {:<10} {}",
        episode.code(),
        episode.title,
        episode.status.badge().label,
        episode.script_badge(),
        episode.audio_badge(),
        episode.id,
    );
}

pub async fn show_episode(ctx: &AppContext, episode_id: &str) -> Result<()> {
    let episode = ctx
        .api
        .get_episode(episode_id)
        .await
        .context("Failed to fetch episode")?;

    println!("📺 {} {}", episode.code(), episode.title);
    println!("   Status:  {}", episode.status.badge().label);
    if !episode.logline.is_empty() {
        println!("   Logline: {}", episode.logline);
    }
    if let Some(air_date) = &episode.air_date {
        println!("   Airs:    {air_date}");
    }

    for kind in [WorkflowKind::Script, WorkflowKind::Audio] {
        println!("\n{}:", kind.label());
        match ctx.api.detailed_status(episode_id, kind).await {
            Ok(status) => {
                for &phase in kind.phases() {
                    let mark = if status.is_phase_completed(phase) {
                        "✅"
                    } else {
                        "⏳"
                    };
                    println!("  {mark} {}. {}", phase.ordinal(), phase.name());
                    for line in status.detail(phase).map(|d| d.lines()).unwrap_or_default() {
                        println!("       {line}");
                    }
                }
            }
            Err(e) => println!("  ⚠️  Status unavailable: {e}"),
        }
    }
    Ok(())
}

pub async fn list_shows(ctx: &AppContext, search: Option<String>, page: u32) -> Result<()> {
    let query = ShowQuery {
        page: Some(page),
        limit: None,
        search,
    };
    let shows = ctx
        .api
        .list_shows(&query)
        .await
        .context("Failed to list shows")?;

    if shows.items.is_empty() {
        println!("No shows found.");
        return Ok(());
    }
    for show in &shows.items {
        println!(
            "{:<36} {:<32} {:<6} {}",
            show.id, show.name, show.year, show.format
        );
    }
    println!(
        "\nPage {} of {} ({} shows)",
        shows.page, shows.total_pages, shows.total
    );
    Ok(())
}

pub async fn list_characters(ctx: &AppContext, show_id: &str) -> Result<()> {
    let characters = ctx
        .api
        .list_characters(show_id)
        .await
        .context("Failed to list characters")?;

    if characters.is_empty() {
        println!("No characters found.");
        return Ok(());
    }
    for character in &characters {
        let voice = character.eleven_voice_id.as_deref().unwrap_or("no voice");
        println!(
            "{:<28} {:<14} {:<20} {voice}",
            character.character_name, character.role_type, character.archetype
        );
    }
    Ok(())
}
