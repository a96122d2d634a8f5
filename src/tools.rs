//! Tool Registry & typed input schema (spec §3, §4.1).
//!
//! Grounded in the teacher's `tools.rs` (name/description/schema/func
//! entries, `schemas()` for LLM binding) generalized with a typed
//! `ToolInputSchema` so specialists can declare parameter shapes without
//! hand-writing JSON Schema, and hardened with `catch_unwind` so a
//! misbehaving callable can never escape `invoke()`.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};

/// Primitive parameter type accepted by a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Str,
    Int,
    Float,
    Bool,
}

impl FieldType {
    fn json_type(self) -> &'static str {
        match self {
            FieldType::Str => "string",
            FieldType::Int => "integer",
            FieldType::Float => "number",
            FieldType::Bool => "boolean",
        }
    }
}

/// One declared input field of a tool.
#[derive(Debug, Clone)]
pub struct ToolField {
    pub name: String,
    pub field_type: FieldType,
    pub required: bool,
    pub description: String,
}

impl ToolField {
    pub fn new(name: impl Into<String>, field_type: FieldType, description: impl Into<String>) -> Self {
        Self { name: name.into(), field_type, required: true, description: description.into() }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }
}

/// A tool's declared input shape — a flat record of primitives (Design
/// Notes "Tool input shapes"); nested data travels as a JSON-string field
/// (e.g. `filters_json`) instead of a nested schema.
#[derive(Debug, Clone, Default)]
pub struct ToolInputSchema {
    pub fields: Vec<ToolField>,
}

impl ToolInputSchema {
    pub fn new(fields: Vec<ToolField>) -> Self {
        Self { fields }
    }

    /// Converts to a JSON Schema object for LLM tool-binding.
    pub fn to_json_schema(&self) -> Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();
        for field in &self.fields {
            properties.insert(
                field.name.clone(),
                json!({ "type": field.field_type.json_type(), "description": field.description }),
            );
            if field.required {
                required.push(Value::String(field.name.clone()));
            }
        }
        json!({
            "type": "object",
            "properties": Value::Object(properties),
            "required": required,
        })
    }
}

/// A tool's metadata as sent to an LLM for function/tool calling.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

/// Per-turn workspace a handful of tools (`generate_comprehensive_report` /
/// `export_report`) use to hand data to one another within one user turn.
/// Callers create a fresh one per turn — it is never shared across turns.
pub type Scratch = HashMap<String, Value>;

/// A tool implementation: takes JSON args plus the turn's scratch
/// workspace, returns a result string or an "오류"-prefixed error string.
/// Never expected to panic, but `invoke()` tolerates it anyway.
pub type ToolFn = Box<dyn Fn(&Value, &mut Scratch) -> Result<String, String> + Send + Sync>;

/// A named, typed, synchronous callable plus its LLM-facing schema.
pub struct Tool {
    name: String,
    description: String,
    input_schema: ToolInputSchema,
    func: ToolFn,
}

impl Tool {
    pub fn new(name: impl Into<String>, description: impl Into<String>, func: ToolFn) -> Self {
        Self { name: name.into(), description: description.into(), input_schema: ToolInputSchema::default(), func }
    }

    pub fn with_schema(mut self, schema: ToolInputSchema) -> Self {
        self.input_schema = schema;
        self
    }

    fn to_schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: self.input_schema.to_json_schema(),
        }
    }
}

/// The fixed error-string convention every tool and the registry itself
/// honor (Korean "오류" = "error", matching the collaborator contract in
/// `original_source/alm_functions.py`).
pub fn unknown_tool_error(name: &str) -> String {
    format!("오류: 알 수 없는 도구 '{name}'")
}

pub fn tool_panicked_error(name: &str) -> String {
    format!("오류: 도구 '{name}' 실행 중 예외 발생")
}

/// Registry of named tools. Never raises — `invoke()` always returns a
/// string (success or "오류"-prefixed failure), even for an unknown name
/// or a callable that panics.
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Tool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    pub fn register(&mut self, tool: Tool) {
        self.tools.insert(tool.name.clone(), tool);
    }

    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// All schemas, for binding to an LLM's tool/function list.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(Tool::to_schema).collect()
    }

    /// Schemas restricted to a named subset, preserving the requested
    /// order — used by specialists to expose only their allowed tools.
    pub fn schemas_for(&self, names: &[&str]) -> Vec<ToolSchema> {
        names
            .iter()
            .filter_map(|n| self.tools.get(*n).map(Tool::to_schema))
            .collect()
    }

    /// Invokes a registered tool. Always returns `Ok` with either the
    /// tool's own result or an "오류"-prefixed error string — the registry
    /// itself never returns `Err` and never propagates a panic.
    ///
    /// `scratch` is the caller's per-turn workspace (see [`Scratch`]):
    /// callers are expected to create one fresh `Scratch` per top-level run
    /// and thread the same one through every `invoke` call in that turn, so
    /// e.g. `export_report` can see what `generate_comprehensive_report`
    /// left behind earlier in the same turn — and nothing from a prior or
    /// concurrent turn.
    pub fn invoke(&self, name: &str, args: &Value, scratch: &mut Scratch) -> String {
        let Some(tool) = self.tools.get(name) else {
            tracing::debug!(tool = name, "tool not found");
            return unknown_tool_error(name);
        };
        let func = &tool.func;
        let result = panic::catch_unwind(AssertUnwindSafe(|| func(args, scratch)));
        match result {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => err,
            Err(_) => {
                tracing::warn!(tool = name, "tool panicked");
                tool_panicked_error(name)
            }
        }
    }
}
