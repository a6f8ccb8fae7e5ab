//! Server command implementation

use std::path::Path;

use anyhow::Result;

use super::open_db;
use catat_server::ServerConfig;

pub async fn cmd_serve(db_path: &Path, host: &str, port: u16, no_auth: bool) -> Result<()> {
    println!("🚀 Starting catat web server...");
    println!("   Database: {}", db_path.display());
    println!("   Listening: http://{}:{}", host, port);

    // Parse API keys from environment (comma-separated)
    let api_keys: Vec<String> = std::env::var("CATAT_API_KEYS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    if no_auth {
        println!();
        println!("   ⚠️  WARNING: Authentication is DISABLED (--no-auth)");
        println!("   ⚠️  Do not expose this server to a network!");
        println!();
    } else if api_keys.is_empty() {
        println!("   ℹ️  No API keys configured (set CATAT_API_KEYS=key1,key2)");
    } else {
        println!("   🔑 API keys: {} configured", api_keys.len());
    }

    // Allowed CORS origins (comma-separated)
    let allowed_origins: Vec<String> = std::env::var("CATAT_ALLOWED_ORIGINS")
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();

    let config = ServerConfig {
        require_auth: !no_auth,
        allowed_origins,
        api_keys,
    };

    let db = open_db(db_path)?;
    catat_server::serve(db, host, port, config).await
}
