use anyhow::Result;

use crate::Context;
use crate::apikey::{self, DockerExtractor, KeyResolver};
use crate::ui;

/// Drop a cached API key so the next run extracts it again
pub fn run(ctx: &Context, container: &str) -> Result<()> {
    let store = apikey::store_for(&ctx.config);
    let extractor = DockerExtractor::default();
    let keys = KeyResolver::new(&store, &extractor);

    if keys.invalidate(container)? {
        ui::success(&format!("Removed cached API key for '{container}'"));
    } else {
        ui::info(&format!(
            "No cached API key for '{container}' in {}",
            store.path().display()
        ));
    }
    Ok(())
}
