//! Plain-text rendering of the dashboard state

use queuepulse_core::aggregation::{KpiReport, RagStatus};
use queuepulse_core::state::{CycleError, DashboardSnapshot, Session};
use queuepulse_core::types::{AgentRecord, InteractionRecord};
use std::fmt::Write;

fn badge(status: RagStatus) -> String {
    format!("[{:<5}]", status.color())
}

/// KPI block for one applied snapshot
pub fn kpi_block(session: &Session, snapshot: &DashboardSnapshot, report: &KpiReport) -> String {
    let summary = &report.summary;
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} ({}) {}  updated {}  overall {}",
        session.queue_name,
        session.queue_id(),
        session.date(),
        snapshot.fetched_at.format("%H:%M:%S"),
        report.worst()
    );

    let mos = summary
        .mos()
        .map_or_else(|| "n/a".to_string(), |mos| format!("{mos:.2}"));
    let _ = writeln!(out, "  {} MOS            {mos:>8}", badge(report.mos));
    let _ = writeln!(
        out,
        "  {} Service level  {:>7.1}%",
        badge(report.service_level),
        summary.average_service_level
    );
    let _ = writeln!(
        out,
        "  {} Abandoned      {:>7.1}%  ({} of {})",
        badge(report.abandonment),
        summary.abandonment_rate(),
        summary.total_abandoned,
        summary.total_offered
    );
    let _ = writeln!(
        out,
        "          Answered       {:>8}  ({:.1}%)  AHT {:.0}s  agents {}",
        summary.total_answered,
        summary.answer_rate(),
        summary.average_handle_time,
        summary.agent_count
    );
    out
}

/// One line describing the last failed cycle
pub fn error_line(error: &CycleError) -> String {
    format!("! {} [{}] at {}", error.message, error.kind, error.at.format("%H:%M:%S"))
}

/// Agent table
pub fn agents(agents: &[AgentRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Agents ({})", agents.len());
    for agent in agents {
        let _ = writeln!(
            out,
            "  {:<24} {:<14} answered {:>4}",
            agent.name,
            agent.status.as_deref().unwrap_or("-"),
            agent.answered
        );
    }
    out
}

/// Recent interactions table
pub fn interactions(interactions: &[InteractionRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Recent interactions ({})", interactions.len());
    for interaction in interactions {
        let duration = interaction
            .duration_secs()
            .map_or_else(|| "live".to_string(), |secs| format!("{secs}s"));
        let _ = writeln!(
            out,
            "  {} {}  {:<8} {:>6}  {}{}",
            interaction.started_at.format("%H:%M"),
            interaction.conversation_id,
            format!("{:?}", interaction.direction).to_lowercase(),
            duration,
            interaction.participants.join(", "),
            if interaction.has_recording() { "  (recorded)" } else { "" }
        );
    }
    out
}
