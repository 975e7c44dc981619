//! The five tools exposed by the JSON-RPC surface's `tools/list`.
//! Schemas are plain JSON Schema draft objects; enumerations are
//! enforced here so a malformed `category`/`type`/`priority` is rejected
//! at the surface rather than reaching the core.

use serde_json::{json, Value};

pub struct ToolDef {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: fn() -> Value,
}

fn memory_fields_schema(content_required: bool) -> Value {
    json!({
        "type": "object",
        "properties": {
            "content": { "type": "string", "minLength": 1 },
            "category": { "type": "string", "enum": ["personal", "project", "business"] },
            "type": { "type": "string", "enum": ["fact", "conversation", "context", "preference"] },
            "priority": { "type": "string", "enum": ["low", "medium", "high", "critical"] },
            "update_key": { "type": "string" },
            "tags": { "type": "array", "items": { "type": "string" } },
            "metadata": { "type": "object" }
        },
        "required": if content_required { json!(["content"]) } else { json!([]) }
    })
}

fn store_memory_schema() -> Value {
    memory_fields_schema(true)
}

fn store_memories_bulk_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "memories": { "type": "array", "items": memory_fields_schema(true) }
        },
        "required": ["memories"]
    })
}

fn search_memories_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "query": { "type": "string" },
            "category": { "type": "string", "enum": ["personal", "project", "business"] },
            "type": { "type": "string", "enum": ["fact", "conversation", "context", "preference"] },
            "limit": { "type": "integer", "minimum": 1, "maximum": 1000 },
            "use_semantic": { "type": "boolean" }
        },
        "required": ["query"]
    })
}

fn update_memory_schema() -> Value {
    let mut schema = memory_fields_schema(false);
    schema["properties"]["id"] = json!({ "type": "string", "format": "uuid" });
    if let Some(required) = schema.get_mut("required").and_then(|r| r.as_array_mut()) {
        required.push(json!("id"));
    }
    schema
}

fn delete_memory_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "id": { "type": "string", "format": "uuid" } },
        "required": ["id"]
    })
}

pub const TOOLS: &[ToolDef] = &[
    ToolDef {
        name: "store_memory",
        description: "Store a new memory, or update the existing one if it shares an update_key or exact content with the caller's prior memories.",
        input_schema: store_memory_schema,
    },
    ToolDef {
        name: "store_memories_bulk",
        description: "Store multiple memories in one call, applying the same dedup/update rule to each.",
        input_schema: store_memories_bulk_schema,
    },
    ToolDef {
        name: "search_memories",
        description: "Search the caller's memories by keyword, or semantically when an embedding provider is configured.",
        input_schema: search_memories_schema,
    },
    ToolDef {
        name: "update_memory",
        description: "Patch fields on an existing memory by id. Only non-empty fields are applied.",
        input_schema: update_memory_schema,
    },
    ToolDef {
        name: "delete_memory",
        description: "Delete a memory by id.",
        input_schema: delete_memory_schema,
    },
];

pub fn find(name: &str) -> Option<&'static ToolDef> {
    TOOLS.iter().find(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tool_has_a_valid_object_schema() {
        for tool in TOOLS {
            let schema = (tool.input_schema)();
            assert_eq!(schema["type"], "object");
        }
    }

    #[test]
    fn find_resolves_known_names() {
        assert!(find("store_memory").is_some());
        assert!(find("nonexistent_tool").is_none());
    }
}
