use clap::ValueEnum;

/// Named bundles of startup/shutdown markers and keywords
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Preset {
    /// Web server logs
    Web,
    /// Database server logs
    Database,
    /// General application logs
    Application,
    /// System and infrastructure logs
    System,
}

impl Preset {
    pub fn startup_pattern(&self) -> &'static str {
        match self {
            Preset::Web => "server started",
            Preset::Database => "database initialized",
            Preset::Application => "application started",
            Preset::System => "system initialized",
        }
    }

    pub fn shutdown_pattern(&self) -> &'static str {
        match self {
            Preset::Web => "server stopped",
            Preset::Database => "database shutdown",
            Preset::Application => "application stopped",
            Preset::System => "system shutdown",
        }
    }

    pub fn keyword_patterns(&self) -> &'static [&'static str] {
        match self {
            Preset::Web => &[
                "ERROR",
                "500",
                "404",
                "timeout",
                "connection refused",
                "Internal Server Error",
            ],
            Preset::Database => &[
                "ERROR",
                "deadlock",
                "connection timeout",
                "out of memory",
                "table lock",
                "query timeout",
            ],
            Preset::Application => &[
                "ERROR",
                "CRITICAL",
                "OutOfMemoryError",
                "NullPointerException",
                "retry",
                "failed",
            ],
            Preset::System => &[
                "ERROR",
                "CRITICAL",
                "disk full",
                "memory exhausted",
                "network unreachable",
                "service unavailable",
            ],
        }
    }
}
