use secrecy::SecretString;
use url::Url;

/// Which backend a completion is sent to
///
/// Selects the request-builder/decoder/normalizer triple. Auth material is
/// resolved externally (settings layer) and carried here; cloud targets
/// without a key fail fast before any network call.
#[derive(Debug, Clone)]
pub enum ProviderTarget {
    /// OpenAI-compatible cloud API
    OpenAi {
        /// API key for the `Authorization: Bearer` header
        api_key: Option<SecretString>,
        /// Base URL override (defaults to the canonical endpoint)
        base_url: Option<Url>,
    },
    /// Anthropic Messages API
    Anthropic {
        /// API key for the `x-api-key` header
        api_key: Option<SecretString>,
        /// Base URL override (defaults to the canonical endpoint)
        base_url: Option<Url>,
    },
    /// Google Gemini API
    Google {
        /// API key for the `x-goog-api-key` header
        api_key: Option<SecretString>,
        /// Base URL override (defaults to the canonical endpoint)
        base_url: Option<Url>,
    },
    /// Local OpenAI-compatible server, no authentication
    Local {
        /// Base URL of the local server
        base_url: Url,
    },
}

impl ProviderTarget {
    /// OpenAI cloud target with the canonical base URL
    pub fn openai(api_key: SecretString) -> Self {
        Self::OpenAi {
            api_key: Some(api_key),
            base_url: None,
        }
    }

    /// Anthropic target with the canonical base URL
    pub fn anthropic(api_key: SecretString) -> Self {
        Self::Anthropic {
            api_key: Some(api_key),
            base_url: None,
        }
    }

    /// Google target with the canonical base URL
    pub fn google(api_key: SecretString) -> Self {
        Self::Google {
            api_key: Some(api_key),
            base_url: None,
        }
    }

    /// Local server target
    pub const fn local(base_url: Url) -> Self {
        Self::Local { base_url }
    }

    /// Stable lowercase provider name used in logs and usage records
    pub const fn provider_name(&self) -> &'static str {
        match self {
            Self::OpenAi { .. } => "openai",
            Self::Anthropic { .. } => "anthropic",
            Self::Google { .. } => "google",
            Self::Local { .. } => "local",
        }
    }
}
