//! Shared test helpers.
//!
//! `ScriptedClient` stands in for a Firebird native client: it records every call
//! and answers statements from rules matched by SQL fragment.

#![allow(dead_code)]

use async_trait::async_trait;
use dbal::db::{ConnectParams, DatabaseDriver, NativeClient, NativeConnection, NativeError, NativeResult};
use dbal::models::ConnectionConfig;
use serde_json::Value as JsonValue;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct ScriptState {
    responses: Vec<(String, NativeResult)>,
    failures: Vec<(String, String)>,
    executed: Vec<String>,
    connects: Vec<ConnectParams>,
    closed: usize,
    severed: bool,
}

/// Shared record of what the fake server saw, plus its canned answers.
#[derive(Clone, Default)]
pub struct Script {
    state: Arc<Mutex<ScriptState>>,
}

impl Script {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer statements containing `fragment` with `result`. Earlier rules win.
    pub fn respond(&self, fragment: &str, result: NativeResult) -> &Self {
        self.state
            .lock()
            .unwrap()
            .responses
            .push((fragment.to_string(), result));
        self
    }

    /// Fail statements containing `fragment`.
    pub fn fail(&self, fragment: &str, message: &str) -> &Self {
        self.state
            .lock()
            .unwrap()
            .failures
            .push((fragment.to_string(), message.to_string()));
        self
    }

    /// Statements and native transaction calls, in order.
    pub fn executed(&self) -> Vec<String> {
        self.state.lock().unwrap().executed.clone()
    }

    pub fn connects(&self) -> Vec<ConnectParams> {
        self.state.lock().unwrap().connects.clone()
    }

    pub fn closed(&self) -> usize {
        self.state.lock().unwrap().closed
    }

    /// Make every open connection report itself as no longer valid.
    pub fn sever(&self) {
        self.state.lock().unwrap().severed = true;
    }

    fn record(&self, entry: &str) {
        self.state.lock().unwrap().executed.push(entry.to_string());
    }

    fn answer(&self, sql: &str) -> Result<NativeResult, NativeError> {
        let state = self.state.lock().unwrap();
        if let Some((_, message)) = state.failures.iter().find(|(f, _)| sql.contains(f.as_str())) {
            return Err(NativeError::new(message.clone()).with_code(-204));
        }
        Ok(state
            .responses
            .iter()
            .find(|(f, _)| sql.contains(f.as_str()))
            .map(|(_, result)| result.clone())
            .unwrap_or_default())
    }
}

/// Native client backed by a `Script`.
pub struct ScriptedClient {
    script: Script,
    available: bool,
    refuse: Option<String>,
}

impl ScriptedClient {
    pub fn new(script: &Script) -> Arc<Self> {
        Arc::new(Self {
            script: script.clone(),
            available: true,
            refuse: None,
        })
    }

    pub fn unavailable(script: &Script) -> Arc<Self> {
        Arc::new(Self {
            script: script.clone(),
            available: false,
            refuse: None,
        })
    }

    pub fn refusing(script: &Script, message: &str) -> Arc<Self> {
        Arc::new(Self {
            script: script.clone(),
            available: true,
            refuse: Some(message.to_string()),
        })
    }
}

#[async_trait]
impl NativeClient for ScriptedClient {
    fn name(&self) -> &str {
        "scripted"
    }

    fn is_available(&self) -> bool {
        self.available
    }

    async fn connect(&self, params: &ConnectParams) -> Result<Box<dyn NativeConnection>, NativeError> {
        self.script.state.lock().unwrap().connects.push(params.clone());
        if let Some(message) = &self.refuse {
            return Err(NativeError::new(message.clone()));
        }
        Ok(Box::new(ScriptedConnection {
            script: self.script.clone(),
        }))
    }
}

struct ScriptedConnection {
    script: Script,
}

#[async_trait]
impl NativeConnection for ScriptedConnection {
    async fn query(&mut self, sql: &str) -> Result<NativeResult, NativeError> {
        self.script.record(sql);
        self.script.answer(sql)
    }

    async fn begin(&mut self) -> Result<(), NativeError> {
        self.script.record("BEGIN");
        Ok(())
    }

    async fn commit(&mut self) -> Result<(), NativeError> {
        self.script.record("COMMIT");
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), NativeError> {
        self.script.record("ROLLBACK");
        Ok(())
    }

    fn is_valid(&self) -> bool {
        !self.script.state.lock().unwrap().severed
    }

    async fn close(self: Box<Self>) -> Result<(), NativeError> {
        self.script.state.lock().unwrap().closed += 1;
        Ok(())
    }
}

/// Result set with the given column names.
pub fn rows(columns: &[&str], rows: Vec<Vec<JsonValue>>) -> NativeResult {
    NativeResult::with_rows(columns.iter().map(|c| c.to_string()).collect(), rows)
}

/// Firebird driver on a scripted client, tables prefixed with `jos_`.
pub fn firebird_driver(script: &Script) -> DatabaseDriver {
    firebird_driver_with(script, ConnectionConfig::default().with_database("/data/site.fdb"))
}

pub fn firebird_driver_with(script: &Script, config: ConnectionConfig) -> DatabaseDriver {
    DatabaseDriver::with_client(config.with_prefix("jos_"), ScriptedClient::new(script))
}
