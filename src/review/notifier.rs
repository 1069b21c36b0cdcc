//! Confirmation notifications
//!
//! An applicant is told once that their application arrived. Delivery belongs to
//! an external transport; the service only decides when to send.

use crate::config::NotificationSettings;
use crate::error::Result;
use crate::types::Application;
use tracing::{debug, info};

/// Trait for sending the first-save confirmation
pub trait ConfirmationNotifier: Send + Sync {
    /// Send the confirmation for a newly stored application
    fn send_confirmation(&self, application: &Application) -> Result<()>;
}

/// Notifier that writes confirmations to the log instead of a mail transport
#[derive(Debug, Clone)]
pub struct LoggingNotifier {
    settings: NotificationSettings,
}

impl LoggingNotifier {
    pub fn new(settings: NotificationSettings) -> Self {
        Self { settings }
    }
}

impl ConfirmationNotifier for LoggingNotifier {
    fn send_confirmation(&self, application: &Application) -> Result<()> {
        if !self.settings.enabled {
            debug!(
                application_id = %application.id,
                "Notifications disabled, skipping confirmation"
            );
            return Ok(());
        }

        info!(
            application_id = %application.id,
            to = %application.email,
            from = %self.settings.from_address,
            "Application received confirmation sent"
        );
        Ok(())
    }
}

/// Notifier that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNotifier;

impl ConfirmationNotifier for NoOpNotifier {
    fn send_confirmation(&self, _application: &Application) -> Result<()> {
        Ok(())
    }
}
