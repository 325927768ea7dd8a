use clap::Parser;
use localdev_core::{ActiveRewrite, ToggleReport, UnitCategory, VariantKind, VariantStatus};
use localdev_store::{DiagnosticFinding, DiagnosticSeverity};

use super::*;
use crate::completion::write_completions_script;
use crate::render::{
    format_finding_lines, format_rewrite_lines, format_status_lines, format_toggle_report_lines,
    render_section_header, render_status_line, render_variant_badge, OutputStyle,
};

fn sample_status(effective: VariantKind) -> VariantStatus {
    VariantStatus {
        category: UnitCategory::Plugins,
        base: "foo".to_string(),
        effective,
        vcs_slug: "foo".to_string(),
        local_slug: "localdev-foo".to_string(),
    }
}

fn sample_report(rewritten: usize) -> ToggleReport {
    ToggleReport {
        category: UnitCategory::Plugins,
        base: "foo".to_string(),
        from: VariantKind::Vcs,
        to: VariantKind::Local,
        deactivated: "foo/foo.php".to_string(),
        activated: "localdev-foo/foo.php".to_string(),
        rewritten,
    }
}

#[test]
fn cli_parses_toggle_with_global_flags() {
    let cli = Cli::try_parse_from([
        "localdev",
        "-vv",
        "--site-root",
        "/srv/site",
        "toggle",
        "plugins",
        "foo",
    ])
    .expect("must parse toggle command");
    assert_eq!(cli.verbose, 2);
    assert_eq!(
        cli.site_root.as_deref(),
        Some(std::path::Path::new("/srv/site"))
    );
    match cli.command {
        Commands::Toggle { category, base } => {
            assert_eq!(category, "plugins");
            assert_eq!(base, "foo");
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn cli_parses_list_all_flag() {
    let cli = Cli::try_parse_from(["localdev", "list", "themes", "--all"])
        .expect("must parse list command");
    assert!(matches!(cli.command, Commands::List { all: true, .. }));
}

#[test]
fn cli_rejects_unknown_completion_shell() {
    assert!(Cli::try_parse_from(["localdev", "completion", "tcsh"]).is_err());
}

#[test]
fn default_log_filter_scales_with_verbosity() {
    assert_eq!(
        default_log_filter(0),
        "localdev_core=warn,localdev_store=warn,localdev=warn"
    );
    assert!(default_log_filter(2).contains("localdev_core=debug"));
    assert!(default_log_filter(9).contains("localdev_store=trace"));
}

#[test]
fn completion_script_names_binary() {
    let mut buffer = Vec::new();
    write_completions_script(CliCompletionShell::Bash, &mut buffer)
        .expect("must write bash completions");
    let script = String::from_utf8(buffer).expect("completion script must be utf-8");
    assert!(script.contains("localdev"));
    assert!(script.contains("toggle"));
}

#[test]
fn render_status_line_plain_is_unadorned() {
    assert_eq!(
        render_status_line(OutputStyle::Plain, "ok", "plugin 'foo' switched vcs -> local"),
        "plugin 'foo' switched vcs -> local"
    );
}

#[test]
fn render_status_line_rich_includes_ascii_badge() {
    assert_eq!(
        render_status_line(OutputStyle::Rich, "warn", "'bar' is not a plugin pair"),
        "[WARN] 'bar' is not a plugin pair"
    );
    assert_eq!(
        render_status_line(OutputStyle::Rich, "info", "nothing to do"),
        "[INFO] nothing to do"
    );
}

#[test]
fn section_header_only_in_rich_output() {
    assert_eq!(render_section_header(OutputStyle::Plain, "plugins"), None);
    let header =
        render_section_header(OutputStyle::Rich, "plugins").expect("rich output has headers");
    assert!(header.contains("== plugins =="));
}

#[test]
fn variant_badge_plain_uses_labels() {
    assert_eq!(
        render_variant_badge(OutputStyle::Plain, &sample_status(VariantKind::Local)),
        "[LOCAL ACTIVE]"
    );
    assert_eq!(
        render_variant_badge(OutputStyle::Plain, &sample_status(VariantKind::Vcs)),
        "[VCS ACTIVE]"
    );
}

#[test]
fn variant_badge_rich_colors_by_kind() {
    let local = render_variant_badge(OutputStyle::Rich, &sample_status(VariantKind::Local));
    let vcs = render_variant_badge(OutputStyle::Rich, &sample_status(VariantKind::Vcs));
    assert!(local.contains("[LOCAL ACTIVE]"));
    assert!(vcs.contains("[VCS ACTIVE]"));
    assert_ne!(local, "[LOCAL ACTIVE]");
    assert_ne!(
        local.replace("[LOCAL ACTIVE]", ""),
        vcs.replace("[VCS ACTIVE]", ""),
        "local and vcs badges must use different colors"
    );
}

#[test]
fn status_lines_show_effective_slug_and_action() {
    let lines = format_status_lines(
        OutputStyle::Plain,
        UnitCategory::Plugins,
        &[sample_status(VariantKind::Local)],
    );
    assert_eq!(
        lines,
        vec!["[LOCAL ACTIVE] foo -> localdev-foo (Switch to VCS)".to_string()]
    );
}

#[test]
fn status_lines_report_missing_pairs() {
    assert_eq!(
        format_status_lines(OutputStyle::Plain, UnitCategory::Themes, &[]),
        vec!["no theme pairs installed".to_string()]
    );
}

#[test]
fn toggle_report_lines_describe_rewrite() {
    let lines = format_toggle_report_lines(OutputStyle::Plain, &sample_report(1));
    assert_eq!(
        lines,
        vec![
            "plugin 'foo' switched vcs -> local".to_string(),
            "active: foo/foo.php -> localdev-foo/foo.php (1 entry rewritten)".to_string(),
        ]
    );
}

#[test]
fn toggle_report_lines_note_untouched_active_set() {
    let lines = format_toggle_report_lines(OutputStyle::Rich, &sample_report(0));
    assert_eq!(lines[0], "[OK] plugin 'foo' switched vcs -> local");
    assert_eq!(
        lines[1],
        "active set unchanged; localdev-foo/foo.php is effective on next activation"
    );
}

#[test]
fn rewrite_lines_cover_noop_and_changes() {
    assert_eq!(
        format_rewrite_lines(OutputStyle::Plain, &[]),
        vec!["active set already matches effective variants".to_string()]
    );
    let lines = format_rewrite_lines(
        OutputStyle::Rich,
        &[ActiveRewrite {
            category: UnitCategory::Themes,
            base: "mytheme".to_string(),
            from: "mytheme".to_string(),
            to: "localdev-mytheme".to_string(),
        }],
    );
    assert_eq!(
        lines,
        vec!["[OK] theme 'mytheme': mytheme -> localdev-mytheme".to_string()]
    );
}

#[test]
fn finding_lines_carry_severity_and_code() {
    let findings = vec![
        DiagnosticFinding {
            severity: DiagnosticSeverity::Warning,
            code: "stale-override",
            message: "plugin override 'foo' has no pair installed and is ignored".to_string(),
        },
        DiagnosticFinding {
            severity: DiagnosticSeverity::Info,
            code: "no-local-units",
            message: "no local development units found".to_string(),
        },
    ];

    let plain = format_finding_lines(OutputStyle::Plain, &findings);
    assert_eq!(
        plain[0],
        "warn stale-override: plugin override 'foo' has no pair installed and is ignored"
    );
    let rich = format_finding_lines(OutputStyle::Rich, &findings);
    assert_eq!(
        rich[1],
        "[INFO] no-local-units: no local development units found"
    );
    assert_eq!(
        format_finding_lines(OutputStyle::Plain, &[]),
        vec!["no problems found".to_string()]
    );
}
