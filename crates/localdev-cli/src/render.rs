use std::io::IsTerminal;

use anstyle::{AnsiColor, Effects, Style};
use localdev_core::{ActiveRewrite, ToggleReport, UnitCategory, VariantKind, VariantStatus};
use localdev_store::{DiagnosticFinding, DiagnosticSeverity};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum OutputStyle {
    Plain,
    Rich,
}

pub(crate) fn current_output_style() -> OutputStyle {
    let no_color = std::env::var_os("NO_COLOR").is_some_and(|value| !value.is_empty());
    if !no_color && std::io::stdout().is_terminal() {
        OutputStyle::Rich
    } else {
        OutputStyle::Plain
    }
}

pub(crate) fn render_status_line(style: OutputStyle, status: &str, message: &str) -> String {
    match style {
        OutputStyle::Plain => message.to_string(),
        OutputStyle::Rich => format!("{} {}", status_badge(status), message),
    }
}

fn status_badge(status: &str) -> &'static str {
    match status {
        "ok" => "[OK]",
        "warn" => "[WARN]",
        "err" => "[ERR]",
        "info" => "[INFO]",
        _ => "[..]",
    }
}

pub(crate) fn render_section_header(style: OutputStyle, title: &str) -> Option<String> {
    match style {
        OutputStyle::Plain => None,
        OutputStyle::Rich => Some(colorize(section_style(), &format!("== {title} =="))),
    }
}

pub(crate) fn render_variant_badge(style: OutputStyle, status: &VariantStatus) -> String {
    let badge = format!("[{}]", status.badge_label());
    match style {
        OutputStyle::Plain => badge,
        OutputStyle::Rich => colorize(variant_badge_style(status.effective), &badge),
    }
}

/// One line per pair: badge, base, effective slug and the action that would
/// flip it.
pub(crate) fn format_status_lines(
    style: OutputStyle,
    category: UnitCategory,
    statuses: &[VariantStatus],
) -> Vec<String> {
    if statuses.is_empty() {
        return vec![format!("no {} pairs installed", category.noun())];
    }

    statuses
        .iter()
        .map(|status| {
            format!(
                "{} {} -> {} ({})",
                render_variant_badge(style, status),
                status.base,
                status.effective_slug(),
                status.toggle_label()
            )
        })
        .collect()
}

pub(crate) fn format_toggle_report_lines(
    style: OutputStyle,
    report: &ToggleReport,
) -> Vec<String> {
    let mut lines = vec![render_status_line(
        style,
        "ok",
        &format!(
            "{} '{}' switched {} -> {}",
            report.category.noun(),
            report.base,
            report.from,
            report.to
        ),
    )];
    if report.rewritten == 0 {
        lines.push(format!(
            "active set unchanged; {} is effective on next activation",
            report.activated
        ));
    } else {
        lines.push(format!(
            "active: {} -> {} ({} entr{} rewritten)",
            report.deactivated,
            report.activated,
            report.rewritten,
            if report.rewritten == 1 { "y" } else { "ies" }
        ));
    }
    lines
}

pub(crate) fn format_rewrite_lines(style: OutputStyle, rewrites: &[ActiveRewrite]) -> Vec<String> {
    if rewrites.is_empty() {
        return vec![render_status_line(
            style,
            "ok",
            "active set already matches effective variants",
        )];
    }

    rewrites
        .iter()
        .map(|rewrite| {
            render_status_line(
                style,
                "ok",
                &format!(
                    "{} '{}': {} -> {}",
                    rewrite.category.noun(),
                    rewrite.base,
                    rewrite.from,
                    rewrite.to
                ),
            )
        })
        .collect()
}

pub(crate) fn format_finding_lines(
    style: OutputStyle,
    findings: &[DiagnosticFinding],
) -> Vec<String> {
    if findings.is_empty() {
        return vec![render_status_line(style, "ok", "no problems found")];
    }

    findings
        .iter()
        .map(|finding| {
            let status = match finding.severity {
                DiagnosticSeverity::Info => "info",
                DiagnosticSeverity::Warning => "warn",
            };
            let message = format!("{}: {}", finding.code, finding.message);
            match style {
                OutputStyle::Plain => format!("{} {}", finding.severity.as_str(), message),
                OutputStyle::Rich => render_status_line(style, status, &message),
            }
        })
        .collect()
}

fn section_style() -> Style {
    Style::new()
        .fg_color(Some(AnsiColor::BrightBlue.into()))
        .effects(Effects::BOLD)
}

fn variant_badge_style(kind: VariantKind) -> Style {
    let color = match kind {
        VariantKind::Local => AnsiColor::Green,
        VariantKind::Vcs => AnsiColor::Blue,
    };
    Style::new()
        .fg_color(Some(color.into()))
        .effects(Effects::BOLD)
}

pub(crate) fn colorize(style: Style, text: &str) -> String {
    format!("{}{}{}", style.render(), text, style.render_reset())
}
