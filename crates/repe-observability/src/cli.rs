//! Per-component debug selection
//!
//! The `REPE_DEBUG` environment variable picks which crates of the stack
//! log at debug level: a comma-separated subset of the component names
//! (`client,uniudp`), or `all`. Everything else stays at info.

/// Debug-level selection across the workspace crates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DebugFlags {
    pub protocol: bool,
    pub client: bool,
    pub server: bool,
    pub registry: bool,
    pub fleet: bool,
    pub uniudp: bool,
}

impl DebugFlags {
    /// Debug logging for every component.
    pub fn all() -> Self {
        Self {
            protocol: true,
            client: true,
            server: true,
            registry: true,
            fleet: true,
            uniudp: true,
        }
    }

    /// Read the selection from `REPE_DEBUG`. Unset means nothing is
    /// raised to debug.
    pub fn from_env() -> Self {
        match std::env::var("REPE_DEBUG") {
            Ok(raw) => Self::parse(&raw),
            Err(_) => Self::default(),
        }
    }

    /// Parse a selection string. Unknown names are ignored.
    pub fn parse(raw: &str) -> Self {
        if raw.trim() == "all" {
            return Self::all();
        }
        let mut flags = Self::default();
        for name in raw.split(',') {
            match name.trim() {
                "protocol" | "repe-protocol" => flags.protocol = true,
                "client" | "repe-client" => flags.client = true,
                "server" | "repe-server" => flags.server = true,
                "registry" | "repe-registry" => flags.registry = true,
                "fleet" | "repe-fleet" => flags.fleet = true,
                "uniudp" | "repe-uniudp" => flags.uniudp = true,
                _ => {}
            }
        }
        flags
    }

    /// Tracing filter directives for the selection: the chosen crates at
    /// debug, everything else at info.
    pub fn to_filter_string(&self) -> String {
        // tracing targets are module paths, so crate names use underscores
        let components = [
            (self.protocol, "repe_protocol"),
            (self.client, "repe_client"),
            (self.server, "repe_server"),
            (self.registry, "repe_registry"),
            (self.fleet, "repe_fleet"),
            (self.uniudp, "repe_uniudp"),
        ];
        let mut directives: Vec<String> = components
            .iter()
            .filter(|(enabled, _)| *enabled)
            .map(|(_, target)| format!("{}=debug", target))
            .collect();
        if directives.is_empty() {
            return "info".to_string();
        }
        directives.push("info".to_string());
        directives.join(",")
    }
}
