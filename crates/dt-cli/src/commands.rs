//! Subcommand implementations

use std::path::Path;

use anyhow::{bail, Context};
use chrono::{NaiveDate, Utc};
use dt_core::clock::Clock;
use dt_core::config::AppConfig;
use dt_core::traits::Id;
use dt_db::Database;
use dt_models::{due_dates_between, NewTaskTemplate, TaskTemplate};
use dt_notifications::NotificationService;
use dt_services::{DailyTaskScheduler, ServiceContext};
use serde_json::json;
use tracing::{info, warn};

async fn connect(config: &AppConfig) -> anyhow::Result<(Database, DailyTaskScheduler)> {
    let db = Database::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    let (notifications, _) = NotificationService::from_config(&config.notifications);
    let ctx = ServiceContext::postgres(&db, config, notifications);
    Ok((db, DailyTaskScheduler::new(ctx)))
}

/// Cron trigger: unscoped generation; exits non-zero when any template failed
pub async fn generate(config: &AppConfig, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let (db, scheduler) = connect(config).await?;
    let date = date.unwrap_or_else(|| scheduler.context().clock.today());

    let report = scheduler.generate(date, None).await;
    db.close().await;
    let report = report?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    if !report.is_clean() {
        bail!("{} template(s) failed to generate", report.errors.len());
    }
    Ok(())
}

pub async fn prepare(config: &AppConfig, manager_id: Id, date: Option<NaiveDate>) -> anyhow::Result<()> {
    let (db, scheduler) = connect(config).await?;
    let date = date.unwrap_or_else(|| scheduler.context().clock.today());

    let summary = async {
        let teams = scheduler.context().directory.teams_managed_by(manager_id).await?;
        if teams.is_empty() {
            warn!(manager_id, "manager has no teams");
        }
        scheduler.evaluate_day_preparation(manager_id, &teams, date).await.map_err(anyhow::Error::from)
    }
    .await;
    db.close().await;

    println!("{}", serde_json::to_string_pretty(&summary?)?);
    Ok(())
}

pub fn preview(path: &Path, from: NaiveDate, to: NaiveDate) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let (template, dates) = preview_dates(&raw, from, to)?;

    let output = json!({
        "title": template.title,
        "recurrenceType": template.recurrence_type,
        "recurrenceDays": template.recurrence_days,
        "from": from,
        "to": to,
        "dueDates": dates,
    });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn preview_dates(raw: &str, from: NaiveDate, to: NaiveDate) -> anyhow::Result<(TaskTemplate, Vec<NaiveDate>)> {
    let new: NewTaskTemplate = serde_json::from_str(raw).context("template file is not a valid task template")?;
    if to < from {
        bail!("--to ({}) is before --from ({})", to, from);
    }

    let template = TaskTemplate::from_new(0, new, Utc::now());
    if template.has_implicit_every_day() {
        warn!(title = %template.title, "no recurrence days selected; the template is due every day");
    }

    let dates = due_dates_between(&template, from, to);
    Ok((template, dates))
}

pub async fn check(config: &AppConfig) -> anyhow::Result<()> {
    let db = Database::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    let ping = db.ping().await;
    let stats = db.stats();
    db.close().await;
    ping.context("database did not answer")?;

    info!(size = stats.size, idle = stats.idle, "database reachable");
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "status": "healthy",
            "poolSize": stats.size,
            "idleConnections": stats.idle,
        }))?
    );
    Ok(())
}
