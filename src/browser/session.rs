use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    BrowserContextId, CloseParams, GrantPermissionsParams, PermissionType,
};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetGeolocationOverrideParams, SetLocaleOverrideParams,
    SetTimezoneOverrideParams, SetUserAgentOverrideParams,
};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::browser_protocol::target::{
    CreateBrowserContextParams, CreateTargetParams, DisposeBrowserContextParams,
};
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::browser::stealth::{generate_stealth_script, BrowserFingerprint, UserAgentGenerator};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SessionError {
    #[error("Browser engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Browser session has been shut down")]
    ShutDown,

    #[error("Browser context error: {0}")]
    Context(String),
}

/// Launch settings for the shared browser process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Chrome/Chromium binary; auto-detected when unset.
    pub executable: Option<PathBuf>,
    pub headless: bool,
    pub user_data_root: PathBuf,
    pub launch_attempts: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            executable: None,
            headless: true,
            user_data_root: std::env::temp_dir(),
            launch_attempts: 3,
        }
    }
}

struct RunningBrowser {
    browser: Arc<Browser>,
    handler: JoinHandle<()>,
    user_data_dir: PathBuf,
}

enum SessionState {
    Idle,
    Running(RunningBrowser),
    Closed,
}

/// One lazily-started browser process shared by every rendered fetch.
///
/// Start and shutdown both go through the state mutex, so at most one
/// launch can race and nothing can use the browser after shutdown.
/// Fetches never hold the lock: they clone the browser handle and work
/// inside their own isolated [`RenderContext`].
pub struct RenderedSession {
    settings: SessionSettings,
    state: Mutex<SessionState>,
    user_agents: UserAgentGenerator,
}

impl RenderedSession {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            state: Mutex::new(SessionState::Idle),
            user_agents: UserAgentGenerator::new(),
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn user_agents(&self) -> &UserAgentGenerator {
        &self.user_agents
    }

    pub async fn is_running(&self) -> bool {
        matches!(*self.state.lock().await, SessionState::Running(_))
    }

    /// Returns the shared browser, launching it on the first call.
    pub async fn get_browser(&self) -> Result<Arc<Browser>, SessionError> {
        let mut state = self.state.lock().await;

        match &*state {
            SessionState::Running(running) => return Ok(running.browser.clone()),
            SessionState::Closed => return Err(SessionError::ShutDown),
            SessionState::Idle => {}
        }

        let running = self.launch().await?;
        let browser = running.browser.clone();
        *state = SessionState::Running(running);
        Ok(browser)
    }

    async fn launch(&self) -> Result<RunningBrowser, SessionError> {
        let user_data_dir = self.settings.user_data_root.join(format!(
            "ospm-browser-{}-{}",
            std::process::id(),
            Uuid::new_v4()
        ));
        let _ = std::fs::create_dir_all(&user_data_dir);

        let user_data_arg = format!("--user-data-dir={}", user_data_dir.display());
        let mut builder = BrowserConfig::builder().no_sandbox().args(vec![
            user_data_arg.as_str(),
            "--disable-gpu",
            "--disable-dev-shm-usage",
            "--disable-extensions",
            "--mute-audio",
            "--no-first-run",
            "--disable-default-apps",
            "--disable-sync",
            "--disable-background-networking",
            "--disable-blink-features=AutomationControlled", // hide automation
            "--disable-background-timer-throttling",
            "--disable-renderer-backgrounding",
            "--log-level=3",
        ]);

        if let Some(ref executable) = self.settings.executable {
            builder = builder.chrome_executable(executable);
        }
        if !self.settings.headless {
            builder = builder.with_head();
        }

        let config = builder
            .build()
            .map_err(|e| SessionError::EngineUnavailable(format!("invalid browser config: {}", e)))?;

        info!("Starting shared browser process");

        let attempts = self.settings.launch_attempts.max(1);
        let mut last_error = String::new();
        for attempt in 1..=attempts {
            match Browser::launch(config.clone()).await {
                Ok((browser, mut handler)) => {
                    let handler = tokio::spawn(async move {
                        while let Some(event) = handler.next().await {
                            if let Err(e) = event {
                                // chromiumoxide surfaces unknown CDP messages as errors
                                let message = e.to_string();
                                if message.contains("data did not match any variant") {
                                    debug!("Ignoring unrecognised CDP message: {}", e);
                                } else {
                                    warn!("Browser handler error: {}", e);
                                }
                            }
                        }
                        debug!("Browser handler task ended");
                    });

                    info!("Browser started on attempt {}", attempt);
                    return Ok(RunningBrowser {
                        browser: Arc::new(browser),
                        handler,
                        user_data_dir,
                    });
                }
                Err(e) => {
                    error!("Browser launch attempt {} failed: {}", attempt, e);
                    last_error = e.to_string();
                    if attempt < attempts {
                        tokio::time::sleep(Duration::from_secs(2)).await;
                    }
                }
            }
        }

        let _ = std::fs::remove_dir_all(&user_data_dir);
        Err(SessionError::EngineUnavailable(format!(
            "failed to launch browser after {} attempt(s): {}",
            attempts, last_error
        )))
    }

    /// Opens an isolated browsing context (own cookies and storage)
    /// presenting `fingerprint`. The caller must `close()` it.
    pub async fn context_for(
        &self,
        fingerprint: &BrowserFingerprint,
    ) -> Result<RenderContext, SessionError> {
        let browser = self.get_browser().await?;

        let context_id = browser
            .execute(CreateBrowserContextParams::default())
            .await
            .map_err(|e| SessionError::Context(format!("failed to create browser context: {}", e)))?
            .result
            .browser_context_id
            .clone();

        match open_page(&browser, &context_id, fingerprint).await {
            Ok(page) => {
                let context = RenderContext {
                    browser,
                    context_id,
                    page,
                    fingerprint: fingerprint.clone(),
                };
                debug!("Opened render context {}", context.context_id.inner());
                Ok(context)
            }
            Err(e) => {
                dispose_context(&browser, context_id).await;
                Err(e)
            }
        }
    }

    /// Closes the browser. Safe to call when never started or twice.
    pub async fn shutdown(&self) {
        let mut state = self.state.lock().await;
        let previous = std::mem::replace(&mut *state, SessionState::Closed);

        if let SessionState::Running(running) = previous {
            info!("Shutting down shared browser");
            if let Err(e) = running.browser.execute(CloseParams::default()).await {
                warn!("Browser close command failed: {}", e);
            }
            running.handler.abort();
            let _ = std::fs::remove_dir_all(&running.user_data_dir);
            info!("Browser stopped");
        }
    }
}

async fn open_page(
    browser: &Browser,
    context_id: &BrowserContextId,
    fingerprint: &BrowserFingerprint,
) -> Result<Page, SessionError> {
    let mut grant = GrantPermissionsParams::new(vec![PermissionType::Geolocation]);
    grant.browser_context_id = Some(context_id.clone());
    if let Err(e) = browser.execute(grant).await {
        debug!("Geolocation permission grant failed: {}", e);
    }

    let target = CreateTargetParams::builder()
        .url("about:blank")
        .browser_context_id(context_id.clone())
        .build()
        .map_err(|e| SessionError::Context(format!("failed to build target params: {}", e)))?;

    let page = browser
        .new_page(target)
        .await
        .map_err(|e| SessionError::Context(format!("failed to create page: {}", e)))?;

    if let Err(e) = apply_fingerprint(&page, fingerprint).await {
        let _ = page.close().await;
        return Err(e);
    }

    Ok(page)
}

async fn apply_fingerprint(page: &Page, fingerprint: &BrowserFingerprint) -> Result<(), SessionError> {
    let device_metrics = SetDeviceMetricsOverrideParams::builder()
        .width(fingerprint.viewport.width as i64)
        .height(fingerprint.viewport.height as i64)
        .device_scale_factor(1.0)
        .mobile(false)
        .build()
        .map_err(|e| SessionError::Context(format!("failed to build device metrics: {}", e)))?;
    page.execute(device_metrics)
        .await
        .map_err(|e| SessionError::Context(format!("failed to set viewport: {}", e)))?;

    let user_agent = SetUserAgentOverrideParams::builder()
        .user_agent(&fingerprint.user_agent)
        .accept_language(&fingerprint.accept_language)
        .platform(&fingerprint.platform)
        .build()
        .map_err(|e| SessionError::Context(format!("failed to build user agent params: {}", e)))?;
    page.execute(user_agent)
        .await
        .map_err(|e| SessionError::Context(format!("failed to set user agent: {}", e)))?;

    page.execute(SetLocaleOverrideParams {
        locale: Some(fingerprint.locale.clone()),
        ..Default::default()
    })
    .await
    .map_err(|e| SessionError::Context(format!("failed to set locale: {}", e)))?;

    page.execute(SetTimezoneOverrideParams::new(fingerprint.timezone.clone()))
        .await
        .map_err(|e| SessionError::Context(format!("failed to set timezone: {}", e)))?;

    page.execute(SetGeolocationOverrideParams {
        latitude: Some(fingerprint.geolocation.latitude),
        longitude: Some(fingerprint.geolocation.longitude),
        accuracy: Some(100.0),
        ..Default::default()
    })
    .await
    .map_err(|e| SessionError::Context(format!("failed to set geolocation: {}", e)))?;

    // must be registered before navigation to run ahead of page scripts
    page.execute(AddScriptToEvaluateOnNewDocumentParams::new(generate_stealth_script(
        fingerprint,
    )))
    .await
    .map_err(|e| SessionError::Context(format!("failed to install stealth script: {}", e)))?;

    Ok(())
}

async fn dispose_context(browser: &Browser, context_id: BrowserContextId) {
    if let Err(e) = browser
        .execute(DisposeBrowserContextParams::new(context_id))
        .await
    {
        warn!("Failed to dispose browser context: {}", e);
    }
}

/// A single-use browsing context; dropped state never leaks to other fetches.
pub struct RenderContext {
    browser: Arc<Browser>,
    context_id: BrowserContextId,
    page: Page,
    fingerprint: BrowserFingerprint,
}

impl RenderContext {
    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn fingerprint(&self) -> &BrowserFingerprint {
        &self.fingerprint
    }

    pub async fn close(self) {
        if let Err(e) = self.page.close().await {
            warn!("Failed to close page for context {}: {}", self.context_id.inner(), e);
        }
        debug!("Closing render context {}", self.context_id.inner());
        dispose_context(&self.browser, self.context_id).await;
    }
}
