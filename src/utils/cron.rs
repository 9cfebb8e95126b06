//! Cron schedule parsing and evaluation
//!
//! Accepts crontab syntax: five fields (`min hour dom month dow`) or six with
//! a leading seconds field. Day-of-week numerals follow crontab, where both 0
//! and 7 mean Sunday.

use crate::config::ScheduleConfig;
use chrono::{DateTime, Local, Utc};
use chrono_tz::Tz;
use cron::Schedule;
use std::collections::BTreeSet;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    #[error("Invalid cron schedule '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    #[error("Unknown time zone '{0}'")]
    InvalidTimezone(String),
}

/// Time zone the expression is evaluated in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleZone {
    Local,
    Named(Tz),
}

/// A validated cron schedule bound to a time zone
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    schedule: Schedule,
    zone: ScheduleZone,
}

impl CronSchedule {
    pub fn parse(expression: &str, timezone: Option<&str>) -> Result<Self, ScheduleError> {
        let invalid = |reason: String| ScheduleError::InvalidExpression {
            expression: expression.to_string(),
            reason,
        };

        let normalized = to_schedule_syntax(expression).map_err(invalid)?;
        let schedule = Schedule::from_str(&normalized).map_err(|e| invalid(e.to_string()))?;

        let zone = match timezone {
            Some(name) => ScheduleZone::Named(
                name.parse::<Tz>()
                    .map_err(|_| ScheduleError::InvalidTimezone(name.to_string()))?,
            ),
            None => ScheduleZone::Local,
        };

        Ok(Self {
            expression: expression.to_string(),
            schedule,
            zone,
        })
    }

    pub fn from_config(config: &ScheduleConfig) -> Result<Self, ScheduleError> {
        Self::parse(&config.expression, config.timezone.as_deref())
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn zone(&self) -> ScheduleZone {
        self.zone
    }

    pub fn zone_name(&self) -> String {
        match self.zone {
            ScheduleZone::Local => "local time".to_string(),
            ScheduleZone::Named(tz) => tz.name().to_string(),
        }
    }

    /// First occurrence strictly after `after`
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.upcoming(after, 1).into_iter().next()
    }

    /// The next `count` occurrences strictly after `after`
    pub fn upcoming(&self, after: DateTime<Utc>, count: usize) -> Vec<DateTime<Utc>> {
        match self.zone {
            ScheduleZone::Local => self
                .schedule
                .after(&after.with_timezone(&Local))
                .take(count)
                .map(|at| at.with_timezone(&Utc))
                .collect(),
            ScheduleZone::Named(tz) => self
                .schedule
                .after(&after.with_timezone(&tz))
                .take(count)
                .map(|at| at.with_timezone(&Utc))
                .collect(),
        }
    }
}

/// Validate cron schedule syntax
pub fn validate_cron_schedule(schedule: &str) -> bool {
    CronSchedule::parse(schedule, None).is_ok()
}

/// Rewrite a crontab expression into the seconds-first form `cron::Schedule` parses
fn to_schedule_syntax(expression: &str) -> Result<String, String> {
    let mut fields: Vec<String> = expression.split_whitespace().map(str::to_string).collect();

    match fields.len() {
        5 => fields.insert(0, "0".to_string()),
        6 => {}
        n => return Err(format!("expected 5 or 6 fields, found {}", n)),
    }

    fields[5] = translate_day_of_week(&fields[5])?;
    Ok(fields.join(" "))
}

/// Crontab numbers days 0-7 from Sunday; `cron::Schedule` numbers them 1-7 from Sunday
fn translate_day_of_week(field: &str) -> Result<String, String> {
    let mut items = Vec::new();

    for item in field.split(',') {
        if item.chars().any(|c| c.is_ascii_alphabetic()) {
            items.push(item.to_string());
            continue;
        }

        let (base, step) = match item.split_once('/') {
            Some((base, step)) => {
                let step: u32 = step
                    .parse()
                    .map_err(|_| format!("invalid day-of-week step '{}'", item))?;
                if step == 0 {
                    return Err(format!("invalid day-of-week step '{}'", item));
                }
                (base, Some(step))
            }
            None => (item, None),
        };

        if step.is_none() && (base == "*" || base == "?") {
            items.push(base.to_string());
            continue;
        }

        let (first, last) = match base {
            "*" | "?" => (0, 6),
            _ => match base.split_once('-') {
                Some((a, b)) => (parse_weekday(a)?, parse_weekday(b)?),
                None if step.is_some() => (parse_weekday(base)?, 6),
                None => {
                    let day = parse_weekday(base)?;
                    (day, day)
                }
            },
        };

        if first > last {
            return Err(format!("invalid day-of-week range '{}'", item));
        }

        let days: BTreeSet<u32> = (first..=last)
            .step_by(step.unwrap_or(1) as usize)
            .map(|day| day % 7 + 1)
            .collect();
        items.extend(days.iter().map(u32::to_string));
    }

    Ok(items.join(","))
}

fn parse_weekday(raw: &str) -> Result<u32, String> {
    match raw.parse::<u32>() {
        Ok(day) if day <= 7 => Ok(day),
        _ => Err(format!("invalid day of week '{}'", raw)),
    }
}
