#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;

use cloudwork::config::{ConfigFile, RawConfigFile, TransportConfig, Worker};
use cloudwork::script::Operation;
use cloudwork::types::FailurePolicy;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                workers: Vec::new(),
                scripts: BTreeMap::new(),
                setup: None,
                run: None,
                remote_input_dir: "/tmp/worker/input".to_string(),
                remote_output_dir: "/tmp/worker/output".to_string(),
                work_root: PathBuf::from("workers"),
                failure_policy: FailurePolicy::Continue,
                transport: TransportConfig::default(),
            },
        }
    }

    pub fn with_worker(mut self, host: &str) -> Self {
        self.config.workers.push(Worker::new(host));
        self
    }

    pub fn with_workers(mut self, hosts: &[&str]) -> Self {
        for host in hosts {
            self.config.workers.push(Worker::new(*host));
        }
        self
    }

    pub fn with_script(mut self, name: &str, body: &str) -> Self {
        self.config.scripts.insert(name.to_string(), body.to_string());
        self
    }

    pub fn remote_dirs(mut self, input: &str, output: &str) -> Self {
        self.config.remote_input_dir = input.to_string();
        self.config.remote_output_dir = output.to_string();
        self
    }

    pub fn work_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.config.work_root = root.into();
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Operation with the default remote directories.
pub fn operation(name: &str, script: &str) -> Operation {
    Operation {
        name: name.to_string(),
        script: script.to_string(),
        remote_input_dir: "/tmp/worker/input".to_string(),
        remote_output_dir: "/tmp/worker/output".to_string(),
    }
}

pub fn workers(hosts: &[&str]) -> Vec<Worker> {
    hosts.iter().map(|h| Worker::new(*h)).collect()
}
