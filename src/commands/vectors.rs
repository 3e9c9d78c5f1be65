use super::runtime;
use colored::Colorize;
use ragstore::embeddings::RecordType;
use ragstore::error::{RagError, Result};
use ragstore::{NewEntry, RagClient, SearchFilter};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

pub fn cmd_add(
    url: &str,
    content: &str,
    record_type: &str,
    source_id: &str,
    id: Option<&str>,
    meta: &[String],
) -> Result<()> {
    let id = id
        .map(|s| s.to_string())
        .unwrap_or_else(|| generate_record_id(content));
    let metadata = parse_metadata(meta)?;
    let entry = NewEntry::new(id, content, record_type, source_id).with_metadata(metadata);

    let client = RagClient::new(url);
    let stored = runtime()?.block_on(client.store(&entry))?;

    println!(
        "{} {} at {}",
        "Stored".green().bold(),
        stored.id.cyan(),
        stored.stored_at.dimmed()
    );
    Ok(())
}

pub fn cmd_search(
    url: &str,
    query: &str,
    top_k: usize,
    record_type: Option<&str>,
    source_id: Option<&str>,
) -> Result<()> {
    let filter = SearchFilter {
        record_type: record_type.map(RecordType::from),
        source_id: source_id.map(|s| s.to_string()),
    };

    let client = RagClient::new(url);
    let results = runtime()?.block_on(client.search(query, top_k, &filter))?;

    if results.is_empty() {
        println!("{}", "No similar content found.".yellow());
        return Ok(());
    }

    println!(
        "{} {} result(s) for '{}':\n",
        "Found".green().bold(),
        results.len(),
        query
    );
    for (i, result) in results.iter().enumerate() {
        let kind = result
            .metadata
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or("?");
        println!(
            "{}. [{:.3}] {} ({})",
            i + 1,
            result.score,
            result.id.cyan(),
            kind
        );
        let preview: String = result.content.chars().take(160).collect();
        println!("   {}\n", preview.dimmed());
    }
    Ok(())
}

pub fn cmd_get(url: &str, id: &str) -> Result<()> {
    let client = RagClient::new(url);
    let record = runtime()?.block_on(client.get(id))?;

    println!("{} {}", "Record".green().bold(), record.id.cyan());
    println!("  dimension: {}", record.vector.len());
    println!("  content:   {}", record.content);
    println!(
        "  metadata:  {}",
        serde_json::to_string_pretty(&record.metadata)?
    );
    Ok(())
}

pub fn cmd_delete(url: &str, id: &str) -> Result<()> {
    let client = RagClient::new(url);
    runtime()?.block_on(client.delete(id))?;
    println!("{} {}", "Deleted".green().bold(), id);
    Ok(())
}

pub fn cmd_clear(url: &str, yes: bool) -> Result<()> {
    if !yes {
        return Err(RagError::Validation(
            "Refusing to clear every vector without --yes".into(),
        ));
    }
    let client = RagClient::new(url);
    runtime()?.block_on(client.clear())?;
    println!("{}", "All vectors cleared".green().bold());
    Ok(())
}

pub fn cmd_stats(url: &str) -> Result<()> {
    let client = RagClient::new(url);
    let stats = runtime()?.block_on(client.stats())?;

    println!("{}", "Vector store".green().bold());
    println!("  Total vectors: {}", stats.total_vectors);
    println!("  By type:");
    println!("    issue: {}", stats.by_type.issue);
    println!("    sop:   {}", stats.by_type.sop);
    println!("    log:   {}", stats.by_type.log);
    println!(
        "  Oldest: {}",
        stats.oldest_entry.as_deref().unwrap_or("-")
    );
    println!(
        "  Newest: {}",
        stats.newest_entry.as_deref().unwrap_or("-")
    );
    Ok(())
}

fn generate_record_id(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    format!("{:x}", hasher.finalize())[..16].to_string()
}

/// `key=value` pairs; values that parse as JSON keep their type
fn parse_metadata(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut metadata = Map::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| RagError::Validation(format!("Expected key=value, got '{}'", pair)))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(RagError::Validation(format!("Empty metadata key in '{}'", pair)));
        }
        let value =
            serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        metadata.insert(key.to_string(), value);
    }
    Ok(metadata)
}
