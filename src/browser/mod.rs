pub mod session;
pub mod stealth;


pub use session::{RenderContext, RenderedSession, SessionError, SessionSettings};
pub use stealth::{browser_headers, BrowserFingerprint, UserAgentGenerator};
