use rand::Rng;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER, USER_AGENT};
use serde::{Deserialize, Serialize};

/// Locale every rendered context reports.
pub const SIMULATED_LOCALE: &str = "en-US";
pub const SIMULATED_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.9";
pub const SIMULATED_TIMEZONE: &str = "Africa/Lagos";
/// Lagos, matching the timezone above.
pub const SIMULATED_GEOLOCATION: GeoPoint = GeoPoint {
    latitude: 6.5244,
    longitude: 3.3792,
};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: u32,
    pub height: u32,
}

pub struct UserAgentGenerator {
    user_agents: Vec<String>,
}

impl UserAgentGenerator {
    pub fn new() -> Self {
        let user_agents = vec![
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15".to_string(),
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/122.0.0.0 Safari/537.36".to_string(),
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:123.0) Gecko/20100101 Firefox/123.0".to_string(),
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:123.0) Gecko/20100101 Firefox/123.0".to_string(),
        ];

        Self { user_agents }
    }

    pub fn random_user_agent(&self) -> &str {
        let mut rng = rand::thread_rng();
        let index = rng.gen_range(0..self.user_agents.len());
        &self.user_agents[index]
    }
}

impl Default for UserAgentGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity presented by one rendered browsing context.
///
/// The user agent is randomized per context; locale, timezone and
/// geolocation are fixed so every fetch looks like the same region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrowserFingerprint {
    pub user_agent: String,
    pub platform: String,
    pub locale: String,
    pub accept_language: String,
    pub timezone: String,
    pub geolocation: GeoPoint,
    pub viewport: ViewportSize,
}

impl BrowserFingerprint {
    pub fn for_user_agent(user_agent: &str) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            platform: platform_for(user_agent).to_string(),
            locale: SIMULATED_LOCALE.to_string(),
            accept_language: SIMULATED_ACCEPT_LANGUAGE.to_string(),
            timezone: SIMULATED_TIMEZONE.to_string(),
            geolocation: SIMULATED_GEOLOCATION,
            viewport: ViewportSize {
                width: 1920,
                height: 1080,
            },
        }
    }

    pub fn random(generator: &UserAgentGenerator) -> Self {
        Self::for_user_agent(generator.random_user_agent())
    }
}

fn platform_for(user_agent: &str) -> &'static str {
    if user_agent.contains("Windows") {
        "Win32"
    } else if user_agent.contains("Macintosh") {
        "MacIntel"
    } else {
        "Linux x86_64"
    }
}

/// Headers a desktop browser sends on a top-level navigation.
pub fn browser_headers(user_agent: &str, referer: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();

    if let Ok(value) = HeaderValue::from_str(user_agent) {
        headers.insert(USER_AGENT, value);
    }
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(SIMULATED_ACCEPT_LANGUAGE));
    headers.insert(
        HeaderName::from_static("upgrade-insecure-requests"),
        HeaderValue::from_static("1"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-dest"),
        HeaderValue::from_static("document"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-mode"),
        HeaderValue::from_static("navigate"),
    );
    headers.insert(
        HeaderName::from_static("sec-fetch-site"),
        HeaderValue::from_static(if referer.is_some() { "same-origin" } else { "none" }),
    );

    if let Some(referer) = referer {
        if let Ok(value) = HeaderValue::from_str(referer) {
            headers.insert(REFERER, value);
        }
    }

    headers
}

/// Script installed on every new document before any page script runs.
pub fn generate_stealth_script(fingerprint: &BrowserFingerprint) -> String {
    let primary_language = fingerprint.locale.as_str();
    let mut script = String::from(
        r#"
    (function() {
    "#,
    );

    script.push_str(&format!(
        "        Object.defineProperty(navigator, 'platform', {{ get: () => '{}' }});\n",
        fingerprint.platform
    ));
    script.push_str(&format!(
        "        Object.defineProperty(navigator, 'language', {{ get: () => '{}' }});\n",
        primary_language
    ));
    script.push_str(&format!(
        "        Object.defineProperty(navigator, 'languages', {{ get: () => ['{}', 'en'] }});\n",
        primary_language
    ));

    script.push_str(
        r#"
        // hide webdriver flag
        Object.defineProperty(navigator, 'webdriver', { get: () => undefined });

        Object.defineProperty(navigator, 'plugins', {
            get: () => [
                { name: 'Chrome PDF Plugin', description: 'Portable Document Format' },
                { name: 'Chrome PDF Viewer', description: 'PDF Viewer' },
                { name: 'Native Client', description: 'Native Client' }
            ]
        });

        if (navigator.permissions && navigator.permissions.query) {
            const originalQuery = navigator.permissions.query;
            navigator.permissions.query = function(parameters) {
                return parameters.name === 'notifications'
                    ? Promise.resolve({ state: Notification.permission })
                    : originalQuery.call(this, parameters);
            };
        }

        delete window.cdc_adoQpoasnfa76pfcZLmcfl_Array;
        delete window.cdc_adoQpoasnfa76pfcZLmcfl_Promise;
        delete window.cdc_adoQpoasnfa76pfcZLmcfl_Symbol;

        if (!window.chrome) {
            window.chrome = { runtime: {} };
        }
    })();
    "#,
    );

    script
}

/// Scroll a quarter of the page to trigger lazy-loaded content.
pub const LAZY_LOAD_SCROLL_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight / 4)";
