//! Fixed shader program and compiler diagnostics.

use std::fmt;

/// Vertex stage: passes the position through as clip position, forwards uv.
pub const VERTEX_WGSL: &str = include_str!("shaders/quad_vertex.wgsl");

/// Fragment stage: samples the surface texture, color unmodified.
pub const FRAGMENT_WGSL: &str = include_str!("shaders/quad_fragment.wgsl");

pub const VERTEX_ENTRY: &str = "vs_main";
pub const FRAGMENT_ENTRY: &str = "fs_main";

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn source(self) -> &'static str {
        match self {
            ShaderStage::Vertex => VERTEX_WGSL,
            ShaderStage::Fragment => FRAGMENT_WGSL,
        }
    }

    pub fn entry_point(self) -> &'static str {
        match self {
            ShaderStage::Vertex => VERTEX_ENTRY,
            ShaderStage::Fragment => FRAGMENT_ENTRY,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

/// One compiler message for a shader stage.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ShaderDiagnostic {
    pub stage: ShaderStage,
    pub severity: Severity,
    pub message: String,
    /// 1-based `(line, column)` in the stage source, when the compiler reports one.
    pub location: Option<(u32, u32)>,
}

impl ShaderDiagnostic {
    #[inline]
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ShaderDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some((line, col)) => write!(f, "{} shader {}:{}: {}", self.stage, line, col, self.message),
            None => write!(f, "{} shader: {}", self.stage, self.message),
        }
    }
}

/// Default diagnostic sink: forwards to the `log` facade by severity.
pub fn log_diagnostic(diagnostic: &ShaderDiagnostic) {
    match diagnostic.severity {
        Severity::Error => log::error!("{diagnostic}"),
        Severity::Warning => log::warn!("{diagnostic}"),
        Severity::Info => log::info!("{diagnostic}"),
    }
}
