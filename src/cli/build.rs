use crate::{
    config::Settings,
    error, info,
    playlist::{self, compile_root_playlist, prune_root_playlists},
    success, warning,
};

use super::open_store;

/// Compiles every definition in the playlists directory.
///
/// Root playlists without a definition are pruned, but only when every file
/// parsed; a broken file keeps its previous root playlist around. An empty
/// directory changes nothing.
pub async fn build(settings: &Settings) {
    let mut conn = open_store(settings);

    let definitions = match playlist::config::load_dir(&settings.playlists_dir).await {
        Ok(definitions) => definitions,
        Err(e) => error!(
            "Cannot read playlist definitions from {}: {}",
            settings.playlists_dir.display(),
            e
        ),
    };
    if definitions.is_empty() {
        warning!(
            "No playlist definitions (*.yaml, *.yml, *.toml, *.json) found in {}; stored root playlists are kept.",
            settings.playlists_dir.display()
        );
        return;
    }

    let mut names: Vec<String> = Vec::new();
    let mut unreadable = 0;
    let mut compiled = 0;

    for (path, parsed) in definitions {
        let config = match parsed {
            Ok(config) => config,
            Err(e) => {
                warning!("Skipping {}: {}", path.display(), e);
                unreadable += 1;
                continue;
            }
        };
        names.push(config.name.clone());

        match compile_root_playlist(&mut conn, &config, settings.unresolved) {
            Ok(root) => {
                info!(
                    "Root playlist {} has {} tracks ({} pinned).",
                    root.name,
                    root.len(),
                    root.pinned()
                );
                compiled += 1;
            }
            Err(e) => warning!("Cannot compile {}: {}", config.name, e),
        }
    }

    if unreadable == 0 {
        match prune_root_playlists(&mut conn, &names) {
            Ok(removed) => {
                for name in removed {
                    info!("Removed root playlist {} without a definition.", name);
                }
            }
            Err(e) => warning!("Cannot prune root playlists: {}", e),
        }
    }

    success!("Compiled {} root playlists.", compiled);
}
