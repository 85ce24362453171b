use std::{env, path::PathBuf};

use serde_json::Value;
use sonar_core::config::Config;
use sonar_core::request::AnalyticsRequest;
use sonar_core::types::{ApiError, ApiResponse, Category, CategorySet};
use sonar_engine::EmbeddedEngine;
use sonar_views::Analytics;

const VIEWS: &[&str] = &["emotions", "leaderboard", "inflation", "trust", "sectors"];

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
    let config = Config::load().map_err(|e| { eprintln!("Error loading config: {}", e); e })?;
    let args: Vec<String> = env::args().skip(1).collect();
    let mut view = None; let mut request_file = None; let mut categories_file = None; let mut index_dir = None;
    let mut i = 0; while i < args.len() { match args[i].as_str() {
        "--request" => { if i + 1 < args.len() { request_file = Some(PathBuf::from(&args[i + 1])); i += 1; } else { eprintln!("Error: --request requires a path"); std::process::exit(1); } }
        "--categories" => { if i + 1 < args.len() { categories_file = Some(PathBuf::from(&args[i + 1])); i += 1; } else { eprintln!("Error: --categories requires a path"); std::process::exit(1); } }
        "--index" => { if i + 1 < args.len() { index_dir = Some(PathBuf::from(&args[i + 1])); i += 1; } else { eprintln!("Error: --index requires a path"); std::process::exit(1); } }
        _ if !args[i].starts_with('-') => view = Some(args[i].clone()), _ => {} } i += 1; }
    let Some(view) = view else {
        eprintln!("Usage: sonar-analytics <{}> [--request req.json] [--categories categories.json] [--index dir]", VIEWS.join("|"));
        std::process::exit(1);
    };
    let index_dir = index_dir.unwrap_or_else(|| { let dir: String = config.get("data.index_dir").unwrap_or_else(|_| "./dev_data/index".to_string()); PathBuf::from(dir) });

    let request: AnalyticsRequest = match &request_file {
        Some(path) => serde_json::from_str(&std::fs::read_to_string(path)?)?,
        None => AnalyticsRequest::default(),
    };
    let categories = match &categories_file {
        Some(path) => category_set_from_value(&serde_json::from_str(&std::fs::read_to_string(path)?)?)?,
        None => CategorySet::new(),
    };

    let engine = EmbeddedEngine::open(&index_dir)?;
    let svc = Analytics::new(engine, config.analytics());
    let rt = tokio::runtime::Runtime::new()?;
    let rendered = rt.block_on(async {
        match view.as_str() {
            "emotions" => svc.emotion_mix(&request, &categories).await.map(|p| to_json(&ApiResponse::ok(p))),
            "leaderboard" => svc.sentiment_leaderboard(&request, &categories).await.map(|p| to_json(&ApiResponse::ok(p))),
            "inflation" => svc.inflation_narratives(&request, &categories).await.map(|p| to_json(&ApiResponse::ok(p))),
            "trust" => svc.trust_tones(&request, &categories).await.map(|p| to_json(&ApiResponse::ok(p))),
            "sectors" => svc.sector_distribution(&request, &categories).await.map(|p| to_json(&ApiResponse::ok(p))),
            other => {
                eprintln!("Unknown view '{}'. Expected one of: {}", other, VIEWS.join(", "));
                std::process::exit(1);
            }
        }
    });
    match rendered {
        Ok(json) => println!("{}", json),
        Err(err) => {
            eprintln!("{}", to_json(&ApiError::from(&err)));
            std::process::exit(1);
        }
    }
    Ok(())
}

fn to_json<T: serde::Serialize>(payload: &T) -> String {
    serde_json::to_string_pretty(payload).unwrap_or_else(|_| "{\"success\":false}".to_string())
}

/// Categories file shape: `{ "<name>": { "keywords": [], "hashtags": [], "urls": [] } }`.
fn category_set_from_value(value: &Value) -> anyhow::Result<CategorySet> {
    let Some(entries) = value.as_object() else {
        anyhow::bail!("categories file must be a JSON object keyed by category name");
    };
    let mut set = CategorySet::new();
    for (name, body) in entries {
        set.insert(Category {
            name: name.clone(),
            keywords: string_list(&body["keywords"]),
            hashtags: string_list(&body["hashtags"]),
            urls: string_list(&body["urls"]),
        });
    }
    Ok(set)
}

fn string_list(value: &Value) -> Vec<String> {
    value
        .as_array()
        .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default()
}
