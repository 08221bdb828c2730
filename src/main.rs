use std::sync::Arc;

use eyre::Report;
use tokio::io::AsyncBufReadExt;
use tokio::runtime::Runtime;
use tracing_subscriber::EnvFilter;

use emoteline::models::message::ChatMessage;
use emoteline::registry::bttv::BttvClient;
use emoteline::registry::events::SevenTvEventClient;
use emoteline::registry::ffz::FfzClient;
use emoteline::registry::seventv::SevenTvClient;
use emoteline::{EmoteProvider, EmoteRegistry, LineOutcome, config, process_line, render};

fn main() -> Result<(), Report> {
    // Log to a file so stdout stays clean for rendered lines.
    let file_appender = tracing_appender::rolling::never(".", "emoteline.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(non_blocking)
        .init();

    let runtime = Runtime::new()?;
    runtime.block_on(run())
}

async fn run() -> Result<(), Report> {
    let config = config::load().await?;
    let registry = Arc::new(EmoteRegistry::new());

    populate_registry(&config, &registry).await;
    tracing::info!(emotes = registry.len(), "registry ready");

    let opts = config.render_options();
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();

    while let Some(line) = lines.next_line().await? {
        let message = ChatMessage::from_text(None, line.clone());
        let rendered = match process_line(
            &message.spans,
            message.user.as_ref(),
            registry.as_ref(),
            &opts,
        ) {
            LineOutcome::Unchanged => line,
            LineOutcome::Modified(nodes) => render::to_annotated(&nodes),
        };

        if config.show_timestamps {
            println!("{} {}", message.timestamp.format("[%H:%M:%S]"), rendered);
        } else {
            println!("{}", rendered);
        }
    }

    Ok(())
}

/// Loads global sets for every enabled provider, plus channel sets and the
/// live update socket when a channel is configured. A provider failing to
/// load is logged and skipped; chat still renders with whatever loaded.
async fn populate_registry(config: &config::Config, registry: &Arc<EmoteRegistry>) {
    if config.providers.seventv {
        match SevenTvClient::new() {
            Ok(client) => {
                match client.global_emotes().await {
                    Ok(emotes) => registry.install_global(EmoteProvider::SevenTv, emotes),
                    Err(e) => tracing::warn!(error = %e, "failed to load 7tv global emotes"),
                }
                if let Some(channel_id) = &config.channel_id {
                    match client.channel_emotes(channel_id).await {
                        Ok((set_id, emotes)) => {
                            registry.install_channel(EmoteProvider::SevenTv, emotes);
                            if !set_id.is_empty() {
                                let events =
                                    SevenTvEventClient::new(registry.clone(), set_id);
                                tokio::spawn(events.run());
                            }
                        }
                        Err(e) => tracing::warn!(error = %e, "failed to load 7tv channel emotes"),
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to build 7tv client"),
        }
    }

    if config.providers.bttv {
        match BttvClient::new() {
            Ok(client) => {
                match client.global_emotes().await {
                    Ok(emotes) => registry.install_global(EmoteProvider::Bttv, emotes),
                    Err(e) => tracing::warn!(error = %e, "failed to load bttv global emotes"),
                }
                if let Some(channel_id) = &config.channel_id {
                    match client.channel_emotes(channel_id).await {
                        Ok(emotes) => registry.install_channel(EmoteProvider::Bttv, emotes),
                        Err(e) => tracing::warn!(error = %e, "failed to load bttv channel emotes"),
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to build bttv client"),
        }
    }

    if config.providers.ffz {
        match FfzClient::new() {
            Ok(client) => {
                match client.global_emotes().await {
                    Ok(emotes) => registry.install_global(EmoteProvider::Ffz, emotes),
                    Err(e) => tracing::warn!(error = %e, "failed to load ffz global emotes"),
                }
                if let Some(channel_id) = &config.channel_id {
                    match client.channel_emotes(channel_id).await {
                        Ok(emotes) => registry.install_channel(EmoteProvider::Ffz, emotes),
                        Err(e) => tracing::warn!(error = %e, "failed to load ffz channel emotes"),
                    }
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to build ffz client"),
        }
    }
}
