use super::protocol::*;
use crate::config::DEFAULT_TOP_K;
use crate::embeddings::{NewEntry, RecordType, SearchFilter, VectorStore};
use crate::error::{RagError, Result};
use crate::server::models::RecordResponse;
use serde_json::{json, Value};
use std::io::{BufRead, Write};
use std::sync::Arc;

pub struct McpServer {
    store: Arc<VectorStore>,
}

impl McpServer {
    pub fn new(store: Arc<VectorStore>) -> Self {
        Self { store }
    }

    /// Run the tool server on stdio
    pub fn run(&self) -> Result<()> {
        tracing::info!("ragstore tool server listening on stdio");
        let stdin = std::io::stdin();
        let stdout = std::io::stdout();
        self.serve(stdin.lock(), stdout.lock())
    }

    /// Answer one request per input line until the reader is exhausted
    pub fn serve<R: BufRead, W: Write>(&self, reader: R, mut writer: W) -> Result<()> {
        for line in reader.lines() {
            let line = line?;

            if line.trim().is_empty() {
                continue;
            }

            let response = match serde_json::from_str::<Request>(&line) {
                Ok(request) => self.handle_request(request),
                Err(e) => {
                    tracing::warn!("Failed to parse request: {}", e);
                    Response::error(Value::Null, PARSE_ERROR, format!("Parse error: {}", e))
                }
            };

            let response_json = serde_json::to_string(&response)?;
            writeln!(writer, "{}", response_json)?;
            writer.flush()?;
        }

        Ok(())
    }

    fn handle_request(&self, request: Request) -> Response {
        match request.method.as_str() {
            "initialize" => self.handle_initialize(request.id),
            "tools/list" => self.handle_tools_list(request.id),
            "tools/call" => self.handle_tools_call(request.id, request.params),
            _ => Response::error(
                request.id,
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            ),
        }
    }

    fn handle_initialize(&self, id: Value) -> Response {
        Response::success(
            id,
            json!({
                "protocolVersion": "2024-11-05",
                "capabilities": {
                    "tools": {
                        "listChanged": false
                    }
                },
                "serverInfo": {
                    "name": "ragstore",
                    "version": env!("CARGO_PKG_VERSION")
                }
            }),
        )
    }

    fn handle_tools_list(&self, id: Value) -> Response {
        let entry_schema = json!({
            "type": "object",
            "properties": {
                "id": { "type": "string", "description": "Unique record id; re-using it replaces the record" },
                "content": { "type": "string", "description": "Text to index" },
                "type": { "type": "string", "description": "issue, sop, log or a custom tag" },
                "sourceId": { "type": "string", "description": "Id of the originating entity" },
                "vector": { "type": "array", "items": { "type": "number" }, "description": "Precomputed embedding (optional)" },
                "metadata": { "type": "object", "description": "Extra metadata (optional)" }
            },
            "required": ["id", "content", "type", "sourceId"]
        });

        let id_schema = json!({
            "type": "object",
            "properties": {
                "id": { "type": "string", "description": "Record id" }
            },
            "required": ["id"]
        });

        let tools = vec![
            Tool {
                name: "store_vector".to_string(),
                description: "Index one piece of content".to_string(),
                input_schema: entry_schema.clone(),
            },
            Tool {
                name: "batch_store".to_string(),
                description: "Index many entries; incomplete entries are skipped".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "entries": { "type": "array", "items": entry_schema }
                    },
                    "required": ["entries"]
                }),
            },
            Tool {
                name: "search".to_string(),
                description: "Find indexed content similar to a query".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "query": { "type": "string", "description": "Free-text query" },
                        "topK": { "type": "integer", "description": "Maximum results (default: 5)" },
                        "type": { "type": "string", "description": "Only records of this type" },
                        "sourceId": { "type": "string", "description": "Only records from this entity" }
                    },
                    "required": ["query"]
                }),
            },
            Tool {
                name: "get_vector".to_string(),
                description: "Fetch a stored record".to_string(),
                input_schema: id_schema.clone(),
            },
            Tool {
                name: "delete_vector".to_string(),
                description: "Remove a stored record".to_string(),
                input_schema: id_schema,
            },
            Tool {
                name: "clear".to_string(),
                description: "Remove every stored record".to_string(),
                input_schema: json!({ "type": "object", "properties": {} }),
            },
            Tool {
                name: "stats".to_string(),
                description: "Record counts and time range".to_string(),
                input_schema: json!({ "type": "object", "properties": {} }),
            },
        ];

        Response::success(id, json!({ "tools": tools }))
    }

    fn handle_tools_call(&self, id: Value, params: Value) -> Response {
        let tool_name = match params.get("name").and_then(|v| v.as_str()) {
            Some(name) => name,
            None => return Response::error(id, INVALID_PARAMS, "Missing tool name"),
        };

        let args = params.get("arguments").cloned().unwrap_or(json!({}));

        let result = match tool_name {
            "store_vector" => self.tool_store(args),
            "batch_store" => self.tool_batch_store(args),
            "search" => self.tool_search(args),
            "get_vector" => self.tool_get(args),
            "delete_vector" => self.tool_delete(args),
            "clear" => self.tool_clear(),
            "stats" => self.tool_stats(),
            _ => Err(RagError::Validation(format!("Unknown tool: {}", tool_name))),
        };

        match result.and_then(|value| serde_json::to_string_pretty(&value).map_err(RagError::from)) {
            Ok(content) => Response::success(
                id,
                json!({
                    "content": [
                        {
                            "type": "text",
                            "text": content
                        }
                    ]
                }),
            ),
            Err(e) => Response::error(id, TOOL_ERROR, format!("Tool error: {}", e)),
        }
    }

    fn tool_store(&self, args: Value) -> Result<Value> {
        let entry: NewEntry = serde_json::from_value(args)?;
        let record = self.store.store(entry)?;
        Ok(json!({
            "success": true,
            "id": record.id,
            "storedAt": record.created_at_iso()
        }))
    }

    fn tool_batch_store(&self, args: Value) -> Result<Value> {
        let items = match args.get("entries") {
            Some(Value::Array(items)) => items.clone(),
            _ => return Err(RagError::Validation("entries must be an array".into())),
        };
        let entries: Vec<NewEntry> = items
            .into_iter()
            .filter_map(|item| serde_json::from_value(item).ok())
            .collect();
        let outcome = self.store.batch_store(entries);
        Ok(serde_json::to_value(outcome)?)
    }

    fn tool_search(&self, args: Value) -> Result<Value> {
        let query = args.get("query").and_then(|v| v.as_str()).unwrap_or_default();
        let top_k = match args.get("topK").and_then(|v| v.as_i64()) {
            Some(k) => usize::try_from(k).unwrap_or(0),
            None => DEFAULT_TOP_K,
        };
        let filter = SearchFilter {
            record_type: args
                .get("type")
                .and_then(|v| v.as_str())
                .map(RecordType::from),
            source_id: args
                .get("sourceId")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string()),
        };

        let results = self.store.search(query, top_k, &filter)?;
        Ok(json!({ "results": results }))
    }

    fn tool_get(&self, args: Value) -> Result<Value> {
        let id = required_id(&args)?;
        let record = self.store.get(id)?;
        Ok(serde_json::to_value(RecordResponse::from(record))?)
    }

    fn tool_delete(&self, args: Value) -> Result<Value> {
        let id = required_id(&args)?;
        self.store.delete(id)?;
        Ok(json!({ "success": true, "id": id }))
    }

    fn tool_clear(&self) -> Result<Value> {
        self.store.clear();
        Ok(json!({ "success": true, "message": "All vectors cleared" }))
    }

    fn tool_stats(&self) -> Result<Value> {
        Ok(serde_json::to_value(self.store.stats())?)
    }
}

fn required_id(args: &Value) -> Result<&str> {
    args.get("id")
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| RagError::Validation("Missing required field: id".into()))
}
