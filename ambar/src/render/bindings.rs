//! Placeholder bindings derived from a [`Configuration`].

use crate::config::{Configuration, Scalar};
use std::collections::BTreeMap;

/// Value bound to one placeholder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Binding {
    Value(String),
    /// The backing configuration field (dotted path) is absent.
    Missing(&'static str),
}

/// Typed mapping from placeholder name (without `${}`) to its value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Bindings {
    entries: BTreeMap<String, Binding>,
}

fn required(value: Option<&Scalar>, field: &'static str) -> Binding {
    match value {
        Some(v) => Binding::Value(v.as_text()),
        None => Binding::Missing(field),
    }
}

fn defaulted(value: Option<&Scalar>, default: &str) -> Binding {
    Binding::Value(value.map(Scalar::as_text).unwrap_or_else(|| default.to_string()))
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, binding: Binding) -> &mut Self {
        self.entries.insert(name.into(), binding);
        self
    }

    pub fn value(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.insert(name, Binding::Value(value.into()))
    }

    pub fn get(&self, name: &str) -> Option<&Binding> {
        self.entries.get(name)
    }

    /// Build the full placeholder table for the compose template.
    pub fn from_config(config: &Configuration) -> Self {
        let mut b = Self::new();
        let data = config.data_path.trim_end_matches('/');
        let fe = &config.fe.external;
        let api = &config.api;
        let es = config.es.as_ref();
        let ocr = config.ocr.as_ref();
        let dropbox = config.dropbox.as_ref();
        let db = config.db.as_ref();

        b.value("DOCKER_REPO_URL", config.docker_repo.as_str())
            .value("DB_PATH", format!("{data}/db"))
            .value("ES_PATH", format!("{data}/es"))
            .value("RABBIT_PATH", format!("{data}/rabbit"));

        b.value("FE_EXT_PORT", fe.port.as_text())
            .value("FE_EXT_HOST", fe.host.as_str())
            .value("FE_EXT_PROTOCOL", fe.protocol.as_str())
            .value("FE_PUBLIC_URI", fe.public_uri());

        b.value("API_EXT_PORT", api.external.port.as_text())
            .value("API_EXT_HOST", api.external.host.as_str())
            .value("API_EXT_PROTOCOL", api.external.protocol.as_str())
            .value("API_PUBLIC_URI", api.external.public_uri());

        b.insert(
            "PIPELINE_COUNT",
            required(api.pipeline_count.as_ref(), "api.pipelineCount"),
        )
        .insert(
            "CRAWLER_COUNT",
            required(api.crawler_count.as_ref(), "api.crawlerCount"),
        )
        .insert(
            "DEFAULT_LANG_ANALYZER",
            required(api.default_lang_analyzer.as_ref(), "api.defaultLangAnalyzer"),
        )
        .insert("AUTH_TYPE", required(api.auth.as_ref(), "api.auth"))
        .insert(
            "WEBAPI_CACHE_SIZE",
            required(api.cache_size.as_ref(), "api.cacheSize"),
        )
        .insert("ANALYTICS_TOKEN", defaulted(api.analytics_token.as_ref(), ""))
        .insert("MODE", defaulted(api.mode.as_ref(), "ce"))
        .insert(
            "SHOW_FILE_PREVIEW",
            defaulted(api.show_file_preview.as_ref(), "false"),
        );

        b.insert(
            "ES_HEAP_SIZE",
            required(es.and_then(|s| s.heap_size.as_ref()), "es.heapSize"),
        )
        .insert(
            "ES_CONTAINER_SIZE",
            required(es.and_then(|s| s.container_size.as_ref()), "es.containerSize"),
        )
        .insert(
            "OCR_PDF_MAX_PAGE_COUNT",
            required(
                ocr.and_then(|s| s.pdf_max_page_count.as_ref()),
                "ocr.pdfMaxPageCount",
            ),
        )
        .insert(
            "OCR_PDF_SYMBOLS_PER_PAGE_THRESHOLD",
            required(
                ocr.and_then(|s| s.pdf_symbols_per_page_threshold.as_ref()),
                "ocr.pdfSymbolsPerPageThreshold",
            ),
        )
        .insert(
            "DROPBOX_CLIENT_ID",
            required(dropbox.and_then(|s| s.client_id.as_ref()), "dropbox.clientId"),
        )
        .insert(
            "DROPBOX_REDIRECT_URI",
            required(
                dropbox.and_then(|s| s.redirect_uri.as_ref()),
                "dropbox.redirectUri",
            ),
        )
        .insert(
            "DB_CACHE_SIZE_GB",
            required(db.and_then(|s| s.cache_size_gb.as_ref()), "db.cacheSizeGb"),
        );

        b
    }
}
