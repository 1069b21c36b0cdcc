//! Test fixtures and mock implementations for integration testing

#![allow(dead_code)]

use review_pipeline::error::Result;
use review_pipeline::metrics::MetricsCollector;
use review_pipeline::review::{ConfirmationNotifier, InMemoryReviewStore, ReviewService};
use review_pipeline::{Application, ApplicationId, EligibilityEngine, EngineConfig, Reviewer};
use std::sync::{Arc, Mutex};

/// Notifier that captures confirmations for assertions
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<ApplicationId>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applications a confirmation was sent for
    pub fn sent(&self) -> Vec<ApplicationId> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    pub fn count_for(&self, id: ApplicationId) -> usize {
        self.sent().iter().filter(|sent| **sent == id).count()
    }
}

impl ConfirmationNotifier for RecordingNotifier {
    fn send_confirmation(&self, application: &Application) -> Result<()> {
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(application.id);
        }
        Ok(())
    }
}

/// Round-0 gatekeepers
pub const GATEKEEPERS: [&str; 3] = ["gate-a", "gate-b", "gate-c"];

/// General round-1 reviewers
pub const REVIEWERS: [&str; 4] = ["rev-a", "rev-b", "rev-c", "rev-d"];

/// Round-2 committee members
pub const COMMITTEE: [&str; 3] = ["com-a", "com-b", "com-c"];

/// Everything an integration test needs
pub struct TestSystem {
    pub service: Arc<ReviewService>,
    pub store: Arc<InMemoryReviewStore>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn create_test_system() -> TestSystem {
    create_test_system_with(EngineConfig::default())
}

/// Build a service with the standard reviewer roster
pub fn create_test_system_with(config: EngineConfig) -> TestSystem {
    let store = Arc::new(InMemoryReviewStore::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let service = ReviewService::new(
        store.clone(),
        EligibilityEngine::new(config).expect("valid engine config"),
        notifier.clone(),
        Arc::new(MetricsCollector::new().expect("metrics registry")),
    );

    for id in GATEKEEPERS {
        service
            .register_reviewer(
                Reviewer::new(id, id, format!("{id}@example.org")).with_rounds(true, false, false),
            )
            .expect("register gatekeeper");
    }
    for id in REVIEWERS {
        service
            .register_reviewer(Reviewer::new(id, id, format!("{id}@example.org")))
            .expect("register reviewer");
    }
    for id in COMMITTEE {
        service
            .register_reviewer(
                Reviewer::new(id, id, format!("{id}@example.org")).with_rounds(false, true, true),
            )
            .expect("register committee member");
    }

    TestSystem {
        service: Arc::new(service),
        store,
        notifier,
    }
}

/// Submit a fresh application
pub fn submit(system: &TestSystem, name: &str) -> Application {
    system
        .service
        .submit_application(Application::new(name, format!("{}@example.org", name)))
        .expect("submit application")
}
