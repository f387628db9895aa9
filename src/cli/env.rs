//! Backend environment indicator

use crate::context::AppContext;
use anyhow::Result;
use showrunner_api::EnvironmentMode;

pub async fn run(ctx: &AppContext, follow: bool) -> Result<()> {
    print_mode(ctx.api.environment_mode().await);
    if !follow {
        return Ok(());
    }

    // The watcher only publishes changes
    let mut modes = ctx.watch_environment();
    loop {
        tokio::select! {
            () = ctx.shutdown.cancelled() => break,
            changed = modes.changed() => {
                if changed.is_err() {
                    break;
                }
                print_mode(*modes.borrow_and_update());
            }
        }
    }
    Ok(())
}

fn print_mode(mode: EnvironmentMode) {
    let hint = if mode.is_production() {
        "changes affect live content"
    } else {
        "safe to experiment"
    };
    println!("{} {} ({hint})", mode.marker(), mode.label());
}
