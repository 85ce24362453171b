use std::{env, path::PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use sonar_core::config::Config;
use sonar_engine::SocialIndexer;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let args: Vec<String> = env::args().skip(1).collect();
    let mut data_dir = None; let mut index_dir = None;
    let mut i = 0; while i < args.len() { match args[i].as_str() {
        "--index" => { if i + 1 < args.len() { index_dir = Some(PathBuf::from(&args[i + 1])); i += 1; } else { eprintln!("Error: --index requires a path"); std::process::exit(1); } }
        _ if !args[i].starts_with('-') => data_dir = Some(PathBuf::from(&args[i])), _ => {} } i += 1; }
    let data_dir = data_dir.unwrap_or_else(|| { let dir: String = config.get("data.documents_dir").unwrap_or_else(|_| "./dev_data/documents".to_string()); PathBuf::from(dir) });
    let index_dir = index_dir.unwrap_or_else(|| { let dir: String = config.get("data.index_dir").unwrap_or_else(|_| "./dev_data/index".to_string()); PathBuf::from(dir) });

    println!("Sonar Document Indexer\n======================");
    println!("Data directory: {}", data_dir.display());

    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(&data_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| matches!(e.path().extension().and_then(|s| s.to_str()), Some("json") | Some("jsonl")))
        .map(|e| e.path().to_path_buf())
        .collect();
    files.sort();
    if files.is_empty() { println!("No .json/.jsonl files found under {}.", data_dir.display()); return Ok(()); }

    let bar = ProgressBar::new(files.len() as u64);
    bar.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")?);
    let mut docs: Vec<Value> = Vec::new();
    for file in &files {
        bar.set_message(file.display().to_string());
        let content = std::fs::read_to_string(file)?;
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            for line in content.lines().filter(|l| !l.trim().is_empty()) {
                match serde_json::from_str(line) {
                    Ok(doc) => docs.push(doc),
                    Err(e) => eprintln!("Skipping bad line in {}: {}", file.display(), e),
                }
            }
        } else {
            match serde_json::from_str::<Value>(&content) {
                Ok(Value::Array(items)) => docs.extend(items),
                Ok(doc) => docs.push(doc),
                Err(e) => eprintln!("Skipping unreadable file {}: {}", file.display(), e),
            }
        }
        bar.inc(1);
    }
    bar.finish_and_clear();

    let indexer = SocialIndexer::create(&index_dir)?;
    let count = indexer.add_documents(&docs)?;
    println!("📊 Indexed {} documents into {}", count, index_dir.display());
    println!("\n✅ Indexing completed successfully!");
    println!("\n💡 To query, use: cargo run --bin sonar-analytics <view> --request req.json --categories categories.json --index {}", index_dir.display());
    Ok(())
}
