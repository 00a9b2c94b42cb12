//! Typed access to the agent's heap exports.
//!
//! [`HeapAgent`] is the surface the command handlers consume. [`AgentHandle`]
//! implements it by calling the agent's RPC exports with positional params
//! and decoding their results into `heapscope_core` types.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use heapscope_core::prelude::*;
use heapscope_core::{HeapObjectSummary, IvarDump, MethodList};

use crate::client::AgentHandle;

/// RPC export names of the agent's heap module.
pub mod rpc {
    /// `(className) -> [HeapObjectSummary]`
    pub const LIST_LIVE_INSTANCES: &str = "iosHeapPrintLiveInstances";
    /// `(pointer, utf8) -> [className, {ivar: value}]`
    pub const DUMP_IVARS: &str = "iosHeapPrintIvars";
    /// `(pointer) -> [className, [signature]]`
    pub const LIST_METHODS: &str = "iosHeapPrintMethods";
    /// `(pointer, selector, returnString) -> value`
    pub const INVOKE_METHOD: &str = "iosHeapExecMethod";
    /// `(pointer, script) -> void`
    pub const EVALUATE_SCRIPT: &str = "iosHeapEvaluateJs";
}

/// Heap inspection operations offered by the agent.
///
/// Every method is one request/response round trip. Pointers are passed
/// through untouched; a stale pointer surfaces as an agent error.
#[trait_variant::make(HeapAgent: Send)]
pub trait LocalHeapAgent {
    /// Find live instances of `class_name`.
    async fn list_live_instances(&self, class_name: &str) -> Result<Vec<HeapObjectSummary>>;

    /// Snapshot the ivars of the object at `pointer`.
    async fn dump_ivars(&self, pointer: &str, utf8: bool) -> Result<IvarDump>;

    /// List the methods of the object's class.
    async fn list_methods(&self, pointer: &str) -> Result<MethodList>;

    /// Invoke a zero-argument method on the object at `pointer`.
    async fn invoke_method(
        &self,
        pointer: &str,
        selector: &str,
        return_as_string: bool,
    ) -> Result<Value>;

    /// Evaluate `script` with the object at `pointer` bound as `ptr`.
    async fn evaluate_script(&self, pointer: &str, script: &str) -> Result<()>;
}

impl HeapAgent for AgentHandle {
    async fn list_live_instances(&self, class_name: &str) -> Result<Vec<HeapObjectSummary>> {
        let result = self
            .request(rpc::LIST_LIVE_INSTANCES, Some(json!([class_name])))
            .await?;
        decode(rpc::LIST_LIVE_INSTANCES, result)
    }

    async fn dump_ivars(&self, pointer: &str, utf8: bool) -> Result<IvarDump> {
        let result = self
            .request(rpc::DUMP_IVARS, Some(json!([pointer, utf8])))
            .await?;
        decode(rpc::DUMP_IVARS, result)
    }

    async fn list_methods(&self, pointer: &str) -> Result<MethodList> {
        let result = self
            .request(rpc::LIST_METHODS, Some(json!([pointer])))
            .await?;
        decode(rpc::LIST_METHODS, result)
    }

    async fn invoke_method(
        &self,
        pointer: &str,
        selector: &str,
        return_as_string: bool,
    ) -> Result<Value> {
        self.request(
            rpc::INVOKE_METHOD,
            Some(json!([pointer, selector, return_as_string])),
        )
        .await
    }

    async fn evaluate_script(&self, pointer: &str, script: &str) -> Result<()> {
        self.request(rpc::EVALUATE_SCRIPT, Some(json!([pointer, script])))
            .await?;
        Ok(())
    }
}

/// Decode an export's result, naming the export on failure.
pub fn decode<T: DeserializeOwned>(method: &str, result: Value) -> Result<T> {
    serde_json::from_value(result)
        .map_err(|e| Error::protocol(format!("unexpected `{method}` result: {e}")))
}
