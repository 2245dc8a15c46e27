//! m3ajem-index - inspect the indexed word list of a dictionary database
//!
//! Usage: `m3ajem-index [word...]`
//!
//! Loads the database named by `M3AJEM_DB_PATH` (or the default data
//! directory), prints index statistics, then walks every occurrence of
//! each given word across all of its instances.

use anyhow::{Context, Result};
use m3ajem_lib::{strip_diacritics, AppState, EngineConfig, NavEvent};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = EngineConfig::from_env()?;
    println!("Using database: {:?}", config.db_path);

    let state = AppState::new(config);
    let snapshot = state
        .load()
        .await
        .with_context(|| format!("Index not ready ({:?})", state.load_state()))?;

    let stats = snapshot.stats();
    println!(
        "{} dictionaries, {} indexed roots, {} words ({} skipped), loaded at {}",
        stats.dictionaries,
        stats.indexed_roots,
        stats.words,
        stats.skipped_words,
        stats.loaded_at.to_rfc3339()
    );

    for typed in std::env::args().skip(1) {
        let word = if snapshot.instances_of(&typed).is_empty() {
            strip_diacritics(&typed)
        } else {
            typed.clone()
        };
        let Some(&first) = snapshot.instances_of(&word).first() else {
            println!("{}: not indexed", typed);
            continue;
        };

        let mut session = state.session();
        let mut current = session.navigate(NavEvent::SelectWord(first));
        loop {
            session.with_cursor(|cursor| {
                let root = cursor.current_root().map(|r| r.root.as_str()).unwrap_or("-");
                let dictionary = cursor.current_dictionary().unwrap_or("-");
                match cursor.current_span() {
                    Some(span) => println!(
                        "{} [{}/{}] {} / {}: occurrence {}/{} at {}..{}",
                        word,
                        cursor.current_instance_index() + 1,
                        cursor.total_instances(),
                        dictionary,
                        root,
                        cursor.current_occurrence_index() + 1,
                        cursor.total_occurrences(),
                        span.start,
                        span.end
                    ),
                    None => println!(
                        "{} [{}/{}] {} / {}: no occurrences",
                        word,
                        cursor.current_instance_index() + 1,
                        cursor.total_instances(),
                        dictionary,
                        root
                    ),
                }
            });

            let next = session.navigate(NavEvent::NextOccurrence);
            if next == current {
                break;
            }
            current = next;
        }
    }

    let (cached, capacity) = state.matcher.stats();
    tracing::debug!(cached, capacity, "occurrence cache");

    Ok(())
}
