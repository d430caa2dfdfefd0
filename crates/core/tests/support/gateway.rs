//! Scripted PBX gateway.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use pbxpresence_core::PbxGateway;
use pbxpresence_domain::{PresenceError, PresenceStatus, RemoteExtension, Result};
use tokio::time::Instant;

#[derive(Default)]
struct GatewayState {
    remote: Vec<RemoteExtension>,
    failures: HashMap<i64, PresenceError>,
    list_failure: Option<PresenceError>,
    calls: Vec<(i64, PresenceStatus, Instant)>,
    list_calls: usize,
}

/// Records every call and answers from a script.
#[derive(Clone, Default)]
pub struct ScriptedGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remote extensions returned by `list_extensions`.
    pub fn with_remote(self, remote: Vec<RemoteExtension>) -> Self {
        self.state.lock().remote = remote;
        self
    }

    /// Make `set_presence` fail for `remote_id`.
    pub fn fail_for(self, remote_id: i64, error: PresenceError) -> Self {
        self.state.lock().failures.insert(remote_id, error);
        self
    }

    pub fn fail_listing(self, error: PresenceError) -> Self {
        self.state.lock().list_failure = Some(error);
        self
    }

    /// `(remote_id, status)` of every `set_presence` call, in order.
    pub fn calls(&self) -> Vec<(i64, PresenceStatus)> {
        self.state.lock().calls.iter().map(|(id, status, _)| (*id, status.clone())).collect()
    }

    pub fn call_instants(&self) -> Vec<Instant> {
        self.state.lock().calls.iter().map(|(_, _, at)| *at).collect()
    }

    pub fn list_calls(&self) -> usize {
        self.state.lock().list_calls
    }
}

#[async_trait]
impl PbxGateway for ScriptedGateway {
    async fn list_extensions(&self) -> Result<Vec<RemoteExtension>> {
        let mut state = self.state.lock();
        state.list_calls += 1;
        if let Some(err) = state.list_failure.clone() {
            return Err(err);
        }
        Ok(state.remote.clone())
    }

    async fn set_presence(&self, remote_id: i64, status: &PresenceStatus) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push((remote_id, status.clone(), Instant::now()));
        match state.failures.get(&remote_id) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

pub fn remote(remote_id: i64, number: &str, status: Option<&str>) -> RemoteExtension {
    RemoteExtension {
        remote_id,
        number: number.to_string(),
        name: Some(format!("Ext {number}")),
        email: None,
        presence_status: status.map(PresenceStatus::from),
    }
}
