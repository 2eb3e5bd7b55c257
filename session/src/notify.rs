use tracing::{error, info, warn};

use crowd_types::{Notice, NoticeSeverity, Notifier};

/// Writes notices to the log. The CLI's notice sink.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            NoticeSeverity::Info | NoticeSeverity::Success => {
                info!(title = %notice.title, "{}", notice.description)
            }
            NoticeSeverity::Warning => warn!(title = %notice.title, "{}", notice.description),
            NoticeSeverity::Error => error!(title = %notice.title, "{}", notice.description),
        }
    }
}
