//! Fixed names shared by the library and the CLI.

/// Files persisted in the install home directory.
pub mod files {
    /// Persisted deployment configuration
    pub const CONFIG: &str = "config.json";

    /// Compose template as fetched from `dockerComposeTemplate`
    pub const TEMPLATE: &str = "docker-compose.template.yml";

    /// Rendered deployment descriptor
    pub const DESCRIPTOR: &str = "docker-compose.yml";

    /// Lock file guarding concurrent invocations
    pub const LOCK: &str = ".lock";

    /// Log directory
    pub const LOGS_DIR: &str = "logs";

    /// Log file name inside [`LOGS_DIR`]
    pub const LOG_FILE: &str = "ambar.log";
}

/// Container runtime names.
pub mod compose {
    /// Compose project name for the declarative service set
    pub const PROJECT: &str = "ambar";

    /// Image spawned dynamically for crawler workers
    pub const CRAWLER_IMAGE: &str = "ambar-crawler";

    /// Image spawned dynamically for pipeline workers
    pub const PIPELINE_IMAGE: &str = "ambar-pipeline";

    /// Tag pulled for worker images
    pub const WORKER_TAG: &str = "latest";
}

/// Remote locations.
pub mod urls {
    /// Default remote configuration
    pub const DEFAULT_CONFIG: &str =
        "https://raw.githubusercontent.com/ovv/ambar-install/master/config.json";

    /// Where operators find host requirements
    pub const REQUIREMENTS: &str = "https://blog.ambar.cloud/";
}

pub mod envs {
    pub const AMBAR_HOME: &str = "AMBAR_HOME";
    pub const AMBAR_COMPOSE: &str = "AMBAR_COMPOSE";
}

/// Kernel parameters required by the search index and broker.
pub mod kernel {
    /// Boot-time parameter file
    pub const SYSCTL_CONF: &str = "/etc/sysctl.conf";

    /// `(key, value)` pairs, applied in this order.
    pub const PARAMS: &[(&str, &str)] = &[
        ("vm.max_map_count", "262144"),
        ("net.ipv4.ip_local_port_range", "\"15000 61000\""),
        ("net.ipv4.tcp_fin_timeout", "30"),
        ("net.core.somaxconn", "1024"),
        ("net.core.netdev_max_backlog", "2000"),
        ("net.ipv4.tcp_max_syn_backlog", "2048"),
    ];
}

/// Readiness polling defaults for `start`.
pub mod wait {
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
    pub const DEFAULT_INTERVAL_SECS: u64 = 2;
}
