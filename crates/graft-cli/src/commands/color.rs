//! `graft color` command - show the color a branch name is drawn with.

use anyhow::Result;
use graft_git::Repository;
use tracing::debug;

use super::ColorArgs;
use super::utils::load_config;
use crate::output;
use crate::services::{ColorInfo, ColorService};

/// Run the color command.
///
/// Works outside a repository too; config and remote names are only read
/// from one when it is found.
pub fn run(args: &ColorArgs) -> Result<()> {
    let repo = match Repository::open_current() {
        Ok(repo) => Some(repo),
        Err(e) => {
            debug!(error = %e, "no repository, using defaults");
            None
        }
    };
    let config = load_config(repo.as_ref(), args.config.as_deref())?;

    let mut remotes = args.remotes.clone();
    if let Some(repo) = &repo {
        remotes.extend(repo.remote_names()?);
    }

    let mut service = ColorService::new(&config, remotes)?;
    let info = service.describe(&args.name);

    if args.json {
        let json_output = serde_json::to_string_pretty(&info)?;
        println!("{json_output}");
    } else {
        output::essential(&format_color(&info));
    }

    Ok(())
}

fn format_color(info: &ColorInfo) -> String {
    let hsl = info.hsl;
    let mut line = format!(
        "{} {}  hsl({:.0}, {:.0}%, {:.0}%)  {}",
        output::paint("■", hsl),
        info.name,
        hsl.hue,
        hsl.saturation * 100.0,
        hsl.lightness * 100.0,
        info.hex,
    );
    if info.normalized != info.name {
        line.push_str(&format!("  as {}", info.normalized));
    }
    if let Some(role) = info.role {
        line.push_str(&format!("  [{role:?}]").to_lowercase());
    }
    line
}
