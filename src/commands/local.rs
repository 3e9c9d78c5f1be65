use colored::Colorize;
use ragstore::embeddings;
use ragstore::error::{RagError, Result};
use ragstore::extractor::{sop_index_text, ResolutionSummary, SopDocument, SopFallback};
use std::io::Read;
use std::path::Path;

pub fn cmd_embed(text: &str, full: bool) -> Result<()> {
    let vector = embeddings::embed(text);

    if full {
        println!("{}", serde_json::to_string(&vector)?);
        return Ok(());
    }

    let norm = vector.iter().map(|v| v * v).sum::<f64>().sqrt();
    println!("{} '{}'", "Embedded".green().bold(), text);
    println!("  Dimension: {}", vector.len());
    println!("  Norm:      {:.6}", norm);
    let head: Vec<String> = vector.iter().take(4).map(|v| format!("{:.4}", v)).collect();
    println!("  Head:      [{}, ...]", head.join(", "));
    Ok(())
}

fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => Ok(std::fs::read_to_string(path)?),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}

pub fn cmd_extract(file: Option<&Path>, json: bool) -> Result<()> {
    let text = read_input(file)?;
    let summary = ResolutionSummary::from_response(&text);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{} {:.2}", "Confidence:".green().bold(), summary.confidence);
    println!(
        "{} {}",
        "Auto-resolve:".green().bold(),
        if summary.can_auto_resolve { "yes" } else { "no" }
    );
    println!("{} {}", "Reasoning:".green().bold(), summary.reasoning);
    if summary.steps.is_empty() {
        println!("{} {}", "Steps:".green().bold(), "none found".dimmed());
    } else {
        println!("{}", "Steps:".green().bold());
        for (i, step) in summary.steps.iter().enumerate() {
            println!("  {}. {}", i + 1, step);
        }
    }
    Ok(())
}

/// Issue details for `extract --sop`; title and resolution are mandatory
pub fn sop_fallback(
    title: Option<&str>,
    resolution: Option<&str>,
    symptoms: Option<&str>,
    root_cause: Option<&str>,
    category: Option<&str>,
) -> Result<SopFallback> {
    let required = |value: Option<&str>, flag: &str| {
        value
            .filter(|v| !v.trim().is_empty())
            .map(|v| v.to_string())
            .ok_or_else(|| RagError::Validation(format!("--sop requires {}", flag)))
    };

    Ok(SopFallback {
        issue_title: required(title, "--title")?,
        resolution: required(resolution, "--resolution")?,
        symptoms: symptoms.map(|s| s.to_string()),
        root_cause: root_cause.map(|s| s.to_string()),
        category: category.map(|s| s.to_string()),
    })
}

pub fn cmd_extract_sop(file: Option<&Path>, json: bool, fallback: &SopFallback) -> Result<()> {
    let text = read_input(file)?;
    let sop = SopDocument::from_response(&text, fallback);
    let index_text = sop_index_text(&sop);

    if json {
        let out = serde_json::json!({ "sop": sop, "indexText": index_text });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("{}", sop.title.green().bold());
    println!("  {} {}", "Category:".bold(), sop.category);
    println!("  {} {}", "Problem:".bold(), sop.problem);
    println!("  {} {}", "Symptoms:".bold(), sop.symptoms);
    println!("  {} {}", "Cause:".bold(), sop.cause);
    println!("  {}", "Steps:".bold());
    for (i, step) in sop.steps.iter().enumerate() {
        println!("    {}. {}", i + 1, step);
    }
    println!("  {} {}", "Validation:".bold(), sop.validation);
    println!("  {} {}", "Rollback:".bold(), sop.rollback);
    println!("\n{}", "Index text:".green().bold());
    println!("{}", index_text.dimmed());
    Ok(())
}
