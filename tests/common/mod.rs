//! Shared helpers for integration tests

#![allow(dead_code)]

use dynamics_webapi::api::{ClientSettings, NotificationSink, RequestClient};
use std::sync::Mutex;
use wiremock::MockServer;

/// Client pointed at a mock server, starting at the default 9.0 version
pub fn client_for(server: &MockServer) -> RequestClient {
    RequestClient::new(ClientSettings::new(server.uri())).expect("client builds")
}

/// Path under the versioned API root for the default version
pub fn api_path(relative: &str) -> String {
    format!("/api/data/v9.0{}", relative)
}

/// Sink that remembers every notification for later assertions
#[derive(Default)]
pub struct RecordingSink {
    pub shown: Mutex<Vec<String>>,
    pub cleared: Mutex<usize>,
}

impl RecordingSink {
    pub fn messages(&self) -> Vec<String> {
        self.shown.lock().unwrap().clone()
    }

    pub fn clear_count(&self) -> usize {
        *self.cleared.lock().unwrap()
    }
}

impl NotificationSink for RecordingSink {
    fn show(&self, message: &str) {
        self.shown.lock().unwrap().push(message.to_string());
    }

    fn clear(&self) {
        *self.cleared.lock().unwrap() += 1;
    }
}
