use anyhow::Result;
use arrkit::SeedrValidator;

use crate::Context;
use crate::engine::{HttpConnector, print_plan};
use crate::ui;

/// Show what `apply` would change
pub fn run(ctx: &Context, user: Option<&str>) -> Result<()> {
    if ctx.verbose > 0 {
        ui::dim(&format!("State document: {}", ctx.config.display()));
    }
    let state = super::load_state(&ctx.config)?;
    super::check_user(&state, user)?;

    // Credential problems are reported here but only block `apply`
    super::check_seedr(&state, user, &SeedrValidator::new());

    let plan = super::compute_plan(&state, user, &HttpConnector::default(), ctx.quiet)?;
    println!();
    print_plan(&plan);
    Ok(())
}
