//! Live reload of the route declaration file.
//!
//! Watches the YAML declaration file and, on change, builds a complete
//! replacement table and swaps it through the engine's atomic pointer —
//! readers observe either the old table or the new one, never a partial
//! build. If the changed file fails to parse or compile, the error is
//! logged and the previous table stays active; the server keeps serving.

use crate::router::RouteTable;
use crate::routes::load_routes_file;
use arc_swap::ArcSwap;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// Watch a routes file and swap the table when it changes.
///
/// The callback receives each successfully loaded table, for logging or
/// cache invalidation on the caller's side. Keep the returned watcher
/// alive; dropping it stops the reloads.
pub fn watch_routes<P, F>(
    routes_path: P,
    table: Arc<ArcSwap<RouteTable>>,
    mut on_reload: F,
) -> notify::Result<RecommendedWatcher>
where
    P: AsRef<Path>,
    F: FnMut(&RouteTable) + Send + 'static,
{
    let path: PathBuf = routes_path.as_ref().to_path_buf();
    let watch_path = path.clone();

    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    match load_routes_file(&watch_path) {
                        Ok(new_table) => {
                            info!(
                                routes_count = new_table.len(),
                                "hot-reload: routing table rebuilt"
                            );
                            let new_table = Arc::new(new_table);
                            table.store(Arc::clone(&new_table));
                            on_reload(&new_table);
                        }
                        Err(err) => {
                            warn!(
                                error = %format!("{err:#}"),
                                "hot-reload: keeping previous routing table"
                            );
                        }
                    }
                }
            }
            Err(e) => warn!(error = %e, "watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&path, RecursiveMode::NonRecursive)?;
    Ok(watcher)
}
