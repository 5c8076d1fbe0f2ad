use emi_portal_session::Navigator;
use tracing::info;

/// Reports redirects on stderr; a terminal has nowhere to navigate to.
#[derive(Debug, Default)]
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn redirect_to(&self, path: &str) {
        info!(path, "redirect");
        eprintln!("-> {path}");
    }
}
