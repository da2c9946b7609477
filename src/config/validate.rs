// src/config/validate.rs

use std::time::Duration;

use crate::config::duration::parse_duration;
use crate::config::model::{
    ConfigFile, ExecutorSettings, RawConfigFile, RawExecutorSection, RawScheduleSection,
    ScheduleSettings,
};
use crate::errors::{Result, TestExecutorError};
use crate::scheduler::TimeOptions;

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = TestExecutorError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        let executor = validate_executor(&raw.executor)?;
        let schedule = validate_schedule(&raw.schedule, executor.execution_timeout)?;
        Ok(ConfigFile::new_unchecked(executor, schedule))
    }
}

impl ConfigFile {
    /// Replace `[executor].command`, with the same check the file gets.
    pub fn override_command(&mut self, command: String) -> Result<()> {
        check_command("--command", &command)?;
        self.executor.command = command;
        Ok(())
    }
}

fn check_command(source: &str, command: &str) -> Result<()> {
    if command.trim().is_empty() {
        return Err(TestExecutorError::ConfigError(format!(
            "{source} must not be empty"
        )));
    }
    Ok(())
}

fn validate_executor(raw: &RawExecutorSection) -> Result<ExecutorSettings> {
    check_command("[executor].command", &raw.command)?;

    let execution_timeout = duration_field("executor", "execution_timeout", &raw.execution_timeout)?;
    if execution_timeout.is_zero() {
        return Err(TestExecutorError::ConfigError(
            "[executor].execution_timeout must be greater than zero".to_string(),
        ));
    }

    Ok(ExecutorSettings {
        command: raw.command.clone(),
        execution_timeout,
        content_type: raw.content_type.clone(),
    })
}

fn validate_schedule(
    raw: &RawScheduleSection,
    execution_timeout: Duration,
) -> Result<ScheduleSettings> {
    let timeout = match raw.timeout.as_deref() {
        Some(s) => duration_field("schedule", "timeout", s)?,
        None => execution_timeout,
    };

    let time_options = TimeOptions::new(
        duration_field("schedule", "success", &raw.success)?,
        duration_field("schedule", "error", &raw.error)?,
    )
    .with_timeout(timeout);

    Ok(ScheduleSettings {
        enabled: raw.enabled,
        time_options,
        pause: duration_field("schedule", "pause", &raw.pause)?,
    })
}

fn duration_field(section: &str, field: &str, value: &str) -> Result<Duration> {
    parse_duration(value).map_err(|e| {
        TestExecutorError::ConfigError(format!("[{section}].{field} = {value:?}: {e}"))
    })
}
