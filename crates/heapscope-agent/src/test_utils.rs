//! Scripted in-memory agent for tests.
//!
//! [`FakeAgent`] answers every [`HeapAgent`] call from canned data and
//! records the calls it received, so tests can assert both on rendered
//! output and on whether the agent was contacted at all.

use std::sync::Mutex;

use serde_json::Value;

use heapscope_core::prelude::*;
use heapscope_core::{HeapObjectSummary, IvarDump, MethodList};

use crate::heap::HeapAgent;

/// A call received by [`FakeAgent`].
#[derive(Debug, Clone, PartialEq)]
pub enum AgentCall {
    ListLiveInstances {
        class_name: String,
    },
    DumpIvars {
        pointer: String,
        utf8: bool,
    },
    ListMethods {
        pointer: String,
    },
    InvokeMethod {
        pointer: String,
        selector: String,
        return_as_string: bool,
    },
    EvaluateScript {
        pointer: String,
        script: String,
    },
}

/// Failure every call of a [`FakeAgent`] reports.
#[derive(Debug, Clone)]
enum Fault {
    Agent(i32, String),
    Disconnected,
}

/// Agent stand-in with canned responses.
#[derive(Debug, Default)]
pub struct FakeAgent {
    instances: Vec<HeapObjectSummary>,
    ivars: Option<IvarDump>,
    methods: Option<MethodList>,
    invoke_result: Value,
    fault: Option<Fault>,
    calls: Mutex<Vec<AgentCall>>,
}

impl FakeAgent {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_instances(mut self, instances: Vec<HeapObjectSummary>) -> Self {
        self.instances = instances;
        self
    }

    pub fn with_ivars(mut self, dump: IvarDump) -> Self {
        self.ivars = Some(dump);
        self
    }

    pub fn with_methods(mut self, methods: MethodList) -> Self {
        self.methods = Some(methods);
        self
    }

    pub fn with_invoke_result(mut self, value: Value) -> Self {
        self.invoke_result = value;
        self
    }

    /// Make every call fail with a JSON-RPC error.
    pub fn failing_with(mut self, code: i32, message: impl Into<String>) -> Self {
        self.fault = Some(Fault::Agent(code, message.into()));
        self
    }

    /// Make every call fail as if the connection had dropped.
    pub fn disconnected(mut self) -> Self {
        self.fault = Some(Fault::Disconnected);
        self
    }

    /// Calls received so far, in order.
    pub fn calls(&self) -> Vec<AgentCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn record(&self, call: AgentCall) -> Result<()> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(call);
        match &self.fault {
            Some(Fault::Agent(code, message)) => Err(Error::agent(*code, message.clone())),
            Some(Fault::Disconnected) => Err(Error::ChannelClosed),
            None => Ok(()),
        }
    }
}

impl HeapAgent for FakeAgent {
    async fn list_live_instances(&self, class_name: &str) -> Result<Vec<HeapObjectSummary>> {
        self.record(AgentCall::ListLiveInstances {
            class_name: class_name.to_string(),
        })?;
        Ok(self.instances.clone())
    }

    async fn dump_ivars(&self, pointer: &str, utf8: bool) -> Result<IvarDump> {
        self.record(AgentCall::DumpIvars {
            pointer: pointer.to_string(),
            utf8,
        })?;
        self.ivars
            .clone()
            .ok_or_else(|| Error::agent(-32000, format!("no object at {pointer}")))
    }

    async fn list_methods(&self, pointer: &str) -> Result<MethodList> {
        self.record(AgentCall::ListMethods {
            pointer: pointer.to_string(),
        })?;
        self.methods
            .clone()
            .ok_or_else(|| Error::agent(-32000, format!("no object at {pointer}")))
    }

    async fn invoke_method(
        &self,
        pointer: &str,
        selector: &str,
        return_as_string: bool,
    ) -> Result<Value> {
        self.record(AgentCall::InvokeMethod {
            pointer: pointer.to_string(),
            selector: selector.to_string(),
            return_as_string,
        })?;
        Ok(self.invoke_result.clone())
    }

    async fn evaluate_script(&self, pointer: &str, script: &str) -> Result<()> {
        self.record(AgentCall::EvaluateScript {
            pointer: pointer.to_string(),
            script: script.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_fake_agent_records_calls() {
        let agent = FakeAgent::new().with_invoke_result(json!("done"));

        let result = agent.invoke_method("0x1", "description", true).await.unwrap();
        assert_eq!(result, json!("done"));
        assert_eq!(
            agent.calls(),
            vec![AgentCall::InvokeMethod {
                pointer: "0x1".to_string(),
                selector: "description".to_string(),
                return_as_string: true,
            }]
        );
    }

    #[tokio::test]
    async fn test_fake_agent_fault_still_records() {
        let agent = FakeAgent::new().failing_with(-32000, "stale pointer");

        let err = agent.list_methods("0xdead").await.unwrap_err();
        assert!(err.to_string().contains("stale pointer"));
        assert_eq!(agent.call_count(), 1);
    }

    #[tokio::test]
    async fn test_fake_agent_unscripted_ivars_is_agent_error() {
        let agent = FakeAgent::new();
        let err = agent.dump_ivars("0x2", false).await.unwrap_err();
        assert!(matches!(err, Error::Agent { .. }));
    }
}
