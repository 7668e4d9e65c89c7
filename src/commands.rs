//! One-shot subcommands that print to stdout instead of launching the TUI

use anyhow::{Context, Result};
use std::fmt::Write as _;
use std::time::Duration;

use crate::integrations::api::{LegacyRecord, LegacyUser, TelemetryApi};
use crate::telemetry::{
    PollContext, ProcessRecord, StatSnapshot, TelemetryAggregator, TelemetryView, UserSummary,
};
use crate::ui::format::{cpu_percent, disk_usage, fit, memory_usage, process_row, text_or_na};

pub async fn print_users(aggregator: &TelemetryAggregator) -> Result<()> {
    let users = aggregator.users().await.context("failed to load users")?;
    print!("{}", users_table(&users));
    Ok(())
}

/// Poll once into a fresh view and print its history, which keeps at most
/// `history_capacity` of the newest records like a mounted dashboard does.
pub async fn print_stats(
    aggregator: &TelemetryAggregator,
    context: PollContext,
    history_capacity: usize,
) -> Result<()> {
    let mut view = TelemetryView::new(context, history_capacity);
    aggregator
        .poll(&mut view)
        .await
        .with_context(|| format!("poll failed for {}", view.context.label()))?;
    let stats: Vec<StatSnapshot> = view.history.iter().cloned().collect();
    print!("{}", stats_table(&stats));
    Ok(())
}

pub async fn print_processes(aggregator: &TelemetryAggregator, context: PollContext) -> Result<()> {
    let batch = aggregator
        .fetch(&context)
        .await
        .with_context(|| format!("poll failed for {}", context.label()))?;
    print!("{}", processes_table(&batch.processes));
    Ok(())
}

/// Post a command, wait for the executor, then print whatever it produced.
pub async fn exec(api: &dyn TelemetryApi, system: &str, command: &str, delay: Duration) -> Result<()> {
    println!("$ {}", command);
    api.send_command(system, command)
        .await
        .map_err(|e| anyhow::anyhow!("Error: {}", e.display_body()))?;
    tokio::time::sleep(delay).await;
    print_output(api, system).await
}

pub async fn print_output(api: &dyn TelemetryApi, system: &str) -> Result<()> {
    let output = api
        .command_output(system)
        .await
        .map_err(|e| anyhow::anyhow!("Error: {}", e.display_body()))?;
    println!("{}", output.trim_end());
    Ok(())
}

pub async fn print_lookup(api: &dyn TelemetryApi, id: &str) -> Result<()> {
    match api.lookup_user(id).await? {
        Some(record) => print!("{}", lookup_table(&record)),
        None => println!("User not found"),
    }
    Ok(())
}

pub async fn print_legacy_users(api: &dyn TelemetryApi) -> Result<()> {
    let users = api.legacy_users().await?;
    print!("{}", legacy_users_table(&users));
    Ok(())
}

pub fn users_table(users: &[UserSummary]) -> String {
    let mut out = String::new();
    if users.is_empty() {
        out.push_str("No users reported\n");
        return out;
    }

    let _ = writeln!(out, "{} {} {}", fit("USER", 24), fit("IP ADDRESS", 18), "STATUS");
    for user in users {
        let _ = writeln!(
            out,
            "{} {} {}",
            fit(text_or_na(user.user.as_deref()), 24),
            fit(text_or_na(user.ip_address.as_deref()), 18),
            user.status
        );
    }
    out
}

pub fn stats_table(stats: &[StatSnapshot]) -> String {
    let mut out = String::new();
    if stats.is_empty() {
        out.push_str("No stats reported\n");
        return out;
    }

    let _ = writeln!(
        out,
        "{} {} {} {} {} {} {}",
        fit("ID", 8),
        fit("USER", 16),
        fit("IP ADDRESS", 16),
        fit("STATUS", 9),
        fit("CPU", 8),
        fit("MEMORY", 24),
        "DISK"
    );
    for snap in stats {
        let _ = writeln!(
            out,
            "{} {} {} {} {} {} {}",
            fit(text_or_na(snap.id.as_deref()), 8),
            fit(text_or_na(snap.user.as_deref()), 16),
            fit(text_or_na(snap.ip_address.as_deref()), 16),
            fit(&snap.status.to_string(), 9),
            fit(&cpu_percent(snap), 8),
            fit(&memory_usage(snap), 24),
            disk_usage(snap)
        );
    }
    out
}

pub fn processes_table(processes: &[ProcessRecord]) -> String {
    let mut out = String::new();
    if processes.is_empty() {
        out.push_str("No processes reported\n");
        return out;
    }

    let _ = writeln!(
        out,
        "{} {} {} {}",
        fit("PROCESS", 28),
        fit("USER", 16),
        fit("CPU", 10),
        "MEMORY"
    );
    for process in processes {
        let [name, user, cpu, memory] = process_row(process);
        let _ = writeln!(out, "{} {} {} {}", fit(&name, 28), fit(&user, 16), fit(&cpu, 10), memory);
    }
    out
}

fn lookup_table(record: &LegacyRecord) -> String {
    let number = |v: Option<f64>| v.map(|n| format!("{:.2}", n)).unwrap_or_else(|| "N/A".to_string());
    let id = match &record.id {
        serde_json::Value::Null => "N/A".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    let mut out = String::new();
    let _ = writeln!(out, "id:          {}", id);
    let _ = writeln!(out, "user:        {}", text_or_na(record.user.as_deref()));
    let _ = writeln!(out, "cpu_usage:   {}", number(record.cpu_usage));
    let _ = writeln!(out, "memory_used: {}", number(record.memory_used));
    let _ = writeln!(out, "disk_used:   {}", number(record.disk_used));
    out
}

fn legacy_users_table(users: &[LegacyUser]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {}", fit("ID", 10), "USER");
    for user in users {
        let id = match &user.id {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => "N/A".to_string(),
            other => other.to_string(),
        };
        let _ = writeln!(out, "{} {}", fit(&id, 10), text_or_na(user.user.as_deref()));
    }
    out
}
