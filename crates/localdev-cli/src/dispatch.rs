use anyhow::{Context, Result};
use localdev_core::{InventoryProvider, ToggleOutcome, UnitCategory};
use localdev_store::{default_site_root, diagnose_site, DiagnosticSeverity, Site};

use crate::completion::write_completions_script;
use crate::render::{
    current_output_style, format_finding_lines, format_rewrite_lines, format_status_lines,
    format_toggle_report_lines, render_section_header, render_status_line,
};
use crate::{Cli, Commands};

/// Exit code for requests the engine refused without touching site state.
const EXIT_REJECTED: i32 = 1;

pub(crate) fn run_cli(cli: Cli) -> Result<i32> {
    if let Commands::Completion { shell } = cli.command {
        let mut stdout = std::io::stdout().lock();
        write_completions_script(shell, &mut stdout)?;
        return Ok(0);
    }

    let root = match cli.site_root {
        Some(root) => root,
        None => default_site_root()?,
    };
    let site = Site::open(&root)
        .with_context(|| format!("failed to open site: {}", root.display()))?;
    let output_style = current_output_style();

    match cli.command {
        Commands::Status => {
            for category in UnitCategory::ALL {
                if let Some(header) = render_section_header(output_style, category.as_str()) {
                    println!("{header}");
                }
                let statuses = site.statuses(category)?;
                for line in format_status_lines(output_style, category, &statuses) {
                    println!("{line}");
                }
            }
        }
        Commands::Pairs { category } => {
            let category = UnitCategory::parse(&category)?;
            for base in site.pairs(category)? {
                println!("{base}");
            }
        }
        Commands::List { category, all } => {
            let category = UnitCategory::parse(&category)?;
            let inventory = site.list_units(category)?;
            let filter = site.listing_filter(category)?;
            let mut units = inventory
                .iter()
                .map(|(id, slug)| (id.to_string(), slug.to_string()))
                .collect::<Vec<_>>();
            if all {
                for (id, slug) in &units {
                    if filter.hides(slug) {
                        println!("{id} (hidden)");
                    } else {
                        println!("{id}");
                    }
                }
            } else {
                filter.retain_visible(&mut units, |(_, slug)| slug.as_str());
                for (id, _) in &units {
                    println!("{id}");
                }
            }
        }
        Commands::Toggle { category, base } => {
            let category = UnitCategory::parse(&category)?;
            match site.toggle(category, &base) {
                ToggleOutcome::Applied(report) => {
                    for line in format_toggle_report_lines(output_style, &report) {
                        println!("{line}");
                    }
                }
                ToggleOutcome::Rejected(reason) => {
                    println!(
                        "{}",
                        render_status_line(output_style, "warn", &reason.to_string())
                    );
                    return Ok(EXIT_REJECTED);
                }
                ToggleOutcome::Failed(err) => {
                    return Err(err.context(format!("failed to toggle {category} '{base}'")));
                }
            }
        }
        Commands::Reconcile => {
            let rewrites = site.reconcile()?;
            for line in format_rewrite_lines(output_style, &rewrites) {
                println!("{line}");
            }
        }
        Commands::Activate { category, id } => {
            let category = UnitCategory::parse(&category)?;
            let message = match category {
                UnitCategory::Plugins => {
                    if site.activate_plugin(&id)? {
                        format!("activated plugin {id}")
                    } else {
                        format!("plugin {id} is already active")
                    }
                }
                UnitCategory::Themes => {
                    site.activate_theme(&id)?;
                    format!("active theme is now {id}")
                }
            };
            println!("{}", render_status_line(output_style, "ok", &message));
        }
        Commands::Deactivate { id } => {
            let message = if site.deactivate_plugin(&id)? {
                format!("deactivated plugin {id}")
            } else {
                format!("plugin {id} was not active")
            };
            println!("{}", render_status_line(output_style, "ok", &message));
        }
        Commands::Doctor => {
            let layout = site.layout();
            println!("site: {}", layout.root().display());
            println!("plugins: {}", layout.plugins_dir().display());
            println!("themes: {}", layout.themes_dir().display());
            println!("state: {}", layout.state_dir().display());
            println!("local prefix: {}", site.naming().prefix());

            let findings = diagnose_site(&site)?;
            for line in format_finding_lines(output_style, &findings) {
                println!("{line}");
            }
            if findings
                .iter()
                .any(|finding| finding.severity == DiagnosticSeverity::Warning)
            {
                return Ok(EXIT_REJECTED);
            }
        }
        Commands::Completion { .. } => {}
    }

    Ok(0)
}
