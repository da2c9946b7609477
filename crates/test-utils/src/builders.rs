#![allow(dead_code)]

use test_executor::config::{
    ConfigFile, ExecutorSettings, RawConfigFile, RawExecutorSection, RawScheduleSection,
};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(command: &str) -> Self {
        Self {
            config: RawConfigFile {
                executor: RawExecutorSection {
                    command: command.to_string(),
                    execution_timeout: "60s".to_string(),
                    content_type: "application/xml".to_string(),
                },
                schedule: RawScheduleSection::default(),
            },
        }
    }

    pub fn execution_timeout(mut self, value: &str) -> Self {
        self.config.executor.execution_timeout = value.to_string();
        self
    }

    pub fn content_type(mut self, value: &str) -> Self {
        self.config.executor.content_type = value.to_string();
        self
    }

    pub fn schedule_timeout(mut self, value: &str) -> Self {
        self.config.schedule.timeout = Some(value.to_string());
        self
    }

    pub fn success_delay(mut self, value: &str) -> Self {
        self.config.schedule.success = value.to_string();
        self
    }

    pub fn error_delay(mut self, value: &str) -> Self {
        self.config.schedule.error = value.to_string();
        self
    }

    pub fn pause(mut self, value: &str) -> Self {
        self.config.schedule.pause = value.to_string();
        self
    }

    pub fn enabled(mut self, value: bool) -> Self {
        self.config.schedule.enabled = value;
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

/// Executor settings with the given command, a 60s timeout and
/// `content/type` as default content type.
pub fn executor_settings(command: &str) -> ExecutorSettings {
    ConfigFileBuilder::new(command)
        .content_type("content/type")
        .build()
        .executor
}
