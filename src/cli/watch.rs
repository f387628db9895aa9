//! Follow realtime progress for one episode

use crate::context::AppContext;
use anyhow::Result;
use showrunner_core::{EventKind, RealtimeEvent};
use showrunner_realtime::EpisodeProgressMap;

pub async fn run(ctx: &AppContext, episode_id: &str) -> Result<()> {
    let progress = EpisodeProgressMap::attach(&ctx.realtime, Some(episode_id));
    let subscriptions = [EventKind::Progress, EventKind::Status].map(|kind| {
        let episode = episode_id.to_string();
        ctx.realtime.subscribe(kind, move |event| {
            if event.episode_id() == episode {
                print_event(event);
            }
        })
    });

    println!("👀 Watching episode {episode_id} (Ctrl+C to stop)");
    ctx.shutdown.cancelled().await;
    drop(subscriptions);

    if let Some(last) = progress.get(episode_id) {
        println!("\nLast known state: {} ({})", last.status, last.phase);
    }
    Ok(())
}

fn print_event(event: &RealtimeEvent) {
    match event {
        RealtimeEvent::Progress(p) => {
            let percent = p.progress.map_or_else(|| "…".to_string(), |v| format!("{v:.0}%"));
            match &p.message {
                Some(message) => println!("  {} {percent} {message}", p.phase),
                None => println!("  {} {percent}", p.phase),
            }
        }
        RealtimeEvent::Status(s) => println!("  status → {}", s.status.badge().label),
    }
}
