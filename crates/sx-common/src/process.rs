//! Process snapshots and the category taxonomy used for attribution.
//!
//! Collectors normally classify processes themselves; [`ProcessClassifier`]
//! is the reference name-pattern classifier they can reuse. Patterns are
//! checked in order and the first match wins, so more specific families
//! (AI/ML, containers) are listed before broad ones (developer, system).

use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Coarse process family used to template explanations.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum ProcessCategory {
    /// Web browsers and their helper/renderer processes.
    Browser,
    /// Editors, compilers, bundlers, language servers, test runners.
    Developer,
    /// OS services and daemons.
    System,
    /// Container runtimes and VMs.
    Container,
    /// Model inference and training workloads.
    AiMl,
    #[default]
    Other,
}

impl ProcessCategory {
    pub fn name(&self) -> &'static str {
        match self {
            ProcessCategory::Browser => "browser",
            ProcessCategory::Developer => "developer",
            ProcessCategory::System => "system",
            ProcessCategory::Container => "container",
            ProcessCategory::AiMl => "ai_ml",
            ProcessCategory::Other => "other",
        }
    }

    /// Classify a process name with the shared default classifier.
    pub fn classify(name: &str) -> Self {
        static CLASSIFIER: OnceLock<ProcessClassifier> = OnceLock::new();
        CLASSIFIER.get_or_init(ProcessClassifier::new).classify(name)
    }
}

impl std::fmt::Display for ProcessCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Name-pattern classifier.
#[derive(Debug, Clone)]
pub struct ProcessClassifier {
    patterns: Vec<(ProcessCategory, Regex)>,
}

impl ProcessClassifier {
    pub fn new() -> Self {
        Self {
            patterns: Self::default_patterns(),
        }
    }

    /// Classify a process by name (case-insensitive).
    pub fn classify(&self, name: &str) -> ProcessCategory {
        let lower = name.to_lowercase();
        self.patterns
            .iter()
            .find(|(_, re)| re.is_match(&lower))
            .map(|(cat, _)| *cat)
            .unwrap_or(ProcessCategory::Other)
    }

    fn default_patterns() -> Vec<(ProcessCategory, Regex)> {
        let patterns = vec![
            (ProcessCategory::AiMl, r"(^|[/\s])(ollama|llama[-_.]?(server|cpp)?|lm\s?studio|mlx|whisper|stable[-_]diffusion|comfyui|pytorch|tensorflow|torchrun|vllm)"),
            (ProcessCategory::Container, r"(^|[/\s])(docker|dockerd|containerd|com\.docker|podman|colima|lima|qemu|orbstack|virtualization|vmware|parallels)"),
            (ProcessCategory::Browser, r"(^|[/\s])(safari|google chrome|chrome|chromium|firefox|arc|brave|microsoft edge|opera|vivaldi)(\s|$|\s+helper|\.)"),
            (ProcessCategory::Browser, r"webcontent|web content|renderer"),
            (ProcessCategory::Developer, r"(^|[/\s])(xcode|xcodebuild|swift(-frontend)?|clang|rustc|cargo|rust-analyzer|node|npm|yarn|pnpm|bun|deno|tsc|webpack|vite|esbuild|gradle|java|python3?|go|gopls|code|code helper|cursor|idea|watchman|make|cmake)(\s|$|\.)"),
            (ProcessCategory::System, r"(^|[/\s])(kernel_task|launchd|windowserver|mds(_stores)?|mdworker|spotlight|backupd|coreaudiod|systemd|kworker|cfprefsd|logd|syslogd|bluetoothd|distnoted)(\s|$)"),
        ];

        patterns
            .into_iter()
            .filter_map(|(cat, pat)| Regex::new(pat).ok().map(|r| (cat, r)))
            .collect()
    }
}

impl Default for ProcessClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// One process observed during a sampling tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessSnapshot {
    pub pid: u32,
    pub name: String,
    /// User-facing name (app bundle name where available).
    pub display_name: String,
    /// CPU usage in percent of one core (may exceed 100 on multi-core).
    pub cpu_usage: f64,
    /// Resident memory in bytes.
    pub memory_bytes: u64,
    /// Bytes read + written during the last sampling interval.
    pub disk_bytes: u64,
    pub category: ProcessCategory,
    pub is_system: bool,
}

impl ProcessSnapshot {
    /// Build a snapshot with the category inferred from `name`.
    pub fn new(pid: u32, name: impl Into<String>) -> Self {
        let name = name.into();
        let category = ProcessCategory::classify(&name);
        Self {
            pid,
            display_name: name.clone(),
            name,
            cpu_usage: 0.0,
            memory_bytes: 0,
            disk_bytes: 0,
            category,
            is_system: category == ProcessCategory::System,
        }
    }

    pub fn with_cpu(mut self, cpu_usage: f64) -> Self {
        self.cpu_usage = cpu_usage;
        self
    }

    pub fn with_memory(mut self, memory_bytes: u64) -> Self {
        self.memory_bytes = memory_bytes;
        self
    }

    pub fn with_disk(mut self, disk_bytes: u64) -> Self {
        self.disk_bytes = disk_bytes;
        self
    }

    pub fn with_category(mut self, category: ProcessCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = display_name.into();
        self
    }

    pub fn with_system(mut self, is_system: bool) -> Self {
        self.is_system = is_system;
        self
    }

    pub fn memory_gb(&self) -> f64 {
        self.memory_bytes as f64 / (1024.0 * 1024.0 * 1024.0)
    }

    pub fn disk_mb(&self) -> f64 {
        self.disk_bytes as f64 / crate::metrics::BYTES_PER_MB
    }
}
