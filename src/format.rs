//! Format replay reports and configuration as text.

use crate::config::KnowledgeConfig;
use crate::scenario::ReplayReport;
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;

/// Format a section heading with bold/underline.
pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

/// Format a replay report as human-readable text.
pub fn format_replay_report_text(report: &ReplayReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}\n\n",
        format_section_heading("Component Knowledge")
    ));
    out.push_str(&format!("  Local node: {}\n\n", report.local_node));

    out.push_str(&format!("{}\n\n", format_section_heading("Phases")));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec![
        "Phase",
        "Local only",
        "Shared",
        "Remote",
        "Inaccessible",
        "Nodes",
    ]);
    for phase in &report.phases {
        table.add_row(vec![
            phase.phase.clone(),
            phase.summary.local_only.to_string(),
            phase.summary.shared.to_string(),
            phase.summary.remote_accessible.to_string(),
            phase.summary.remote_inaccessible.to_string(),
            phase.summary.remote_nodes.to_string(),
        ]);
    }
    out.push_str(&format!("{}\n\n", table));

    out.push_str(&format!("{}\n\n", format_section_heading("Installations")));
    if report.installations.is_empty() {
        out.push_str("No components known.\n\n");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Node", "Component", "Name", "Origin", "Permissions", "Access"]);
        for row in &report.installations {
            let access = if row.accessible {
                format!("{}", "yes".green())
            } else {
                format!("{}", "no".red())
            };
            table.add_row(vec![
                row.node.clone(),
                row.component_id.clone(),
                row.display_name.clone(),
                row.origin.clone(),
                row.permissions.clone(),
                access,
            ]);
        }
        out.push_str(&format!("{}\n\n", table));
    }

    out.push_str(&format!(
        "Published: {} properties in {} pushes.\n",
        report.published.len(),
        report.property_pushes
    ));
    out
}

/// Format the effective configuration as human-readable text.
pub fn format_config_text(config: &KnowledgeConfig) -> String {
    let mut out = String::new();
    out.push_str(&format!("{}\n\n", format_section_heading("Configuration")));
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Setting", "Value"]);
    table.add_row(vec!["node_id".to_string(), config.node_id.clone()]);
    table.add_row(vec![
        "property_prefix".to_string(),
        config.property_prefix.clone(),
    ]);
    table.add_row(vec![
        "publication_enabled".to_string(),
        config.publication_enabled.to_string(),
    ]);
    table.add_row(vec![
        "verbose_logging".to_string(),
        config.verbose_logging.to_string(),
    ]);
    table.add_row(vec![
        "listener_exception_policy".to_string(),
        format!("{:?}", config.listener_exception_policy),
    ]);
    table.add_row(vec![
        "logging".to_string(),
        format!(
            "{} / {} / {}",
            config.logging.level, config.logging.format, config.logging.output
        ),
    ]);
    out.push_str(&format!("{}\n", table));
    out
}
