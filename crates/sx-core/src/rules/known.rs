//! Name lists for workload-specific rules.

use sx_common::{ProcessCategory, ProcessSnapshot};

/// Compilers, bundlers, watchers and language servers.
pub const DEV_TOOLS: &[&str] = &[
    "node",
    "cargo",
    "rustc",
    "rust-analyzer",
    "webpack",
    "vite",
    "esbuild",
    "tsc",
    "tsserver",
    "nodemon",
    "watchman",
    "fswatch",
    "jest",
    "swift-frontend",
    "xcodebuild",
    "clang",
    "gcc",
    "go",
    "gopls",
    "gradle",
    "java",
    "bazel",
    "make",
];

/// Local inference and training runtimes. Matched as substrings.
pub const ML_TOOLS: &[&str] = &[
    "ollama",
    "llama",
    "mlx",
    "pytorch",
    "torch",
    "tensorflow",
    "lm studio",
    "whisper",
    "stable-diffusion",
    "comfyui",
];

/// True if `name` is `tool` or starts with `tool` followed by a separator.
fn matches_tool(name: &str, tool: &str) -> bool {
    match name.strip_prefix(tool) {
        Some(rest) => rest
            .chars()
            .next()
            .map_or(true, |c| !c.is_ascii_alphanumeric()),
        None => false,
    }
}

pub fn is_dev_tool(process: &ProcessSnapshot) -> bool {
    if process.category == ProcessCategory::Developer {
        return true;
    }
    let name = process.name.to_lowercase();
    DEV_TOOLS.iter().any(|tool| matches_tool(&name, tool))
}

pub fn is_ml_workload(process: &ProcessSnapshot) -> bool {
    if process.category == ProcessCategory::AiMl {
        return true;
    }
    let name = process.name.to_lowercase();
    ML_TOOLS.iter().any(|tool| name.contains(tool))
}
