//! `docrouter doctor` — Diagnose configuration and credentials.

use docrouter_config::AppConfig;
use docrouter_core::provider::Provider;
use docrouter_providers::build_from_config;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 DocRouter Doctor — System Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found");
    } else {
        println!("  ⚠️  No config file — using defaults (run `docrouter onboard`)");
    }

    match AppConfig::load().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => {
            println!("  ✅ Config valid");
            println!("     Provider:   {}", config.default_provider);
            println!("     Model:      {}", config.default_model);
            println!(
                "     Embedding:  {} ({})",
                config.embedding.provider, config.embedding.model
            );

            match config.require_api_key() {
                Ok(_) => println!("  ✅ API key configured"),
                Err(e) => {
                    println!("  ❌ {e}");
                    issues += 1;
                }
            }

            let router = build_from_config(&config);
            println!("     Providers:  {}", router.list().join(", "));
            match router.default() {
                Some(provider) => match provider.health_check().await {
                    Ok(true) => println!("  ✅ {} reachable", provider.name()),
                    Ok(false) => {
                        println!("  ❌ {} answered but rejected the request", provider.name());
                        issues += 1;
                    }
                    Err(e) => {
                        println!("  ❌ {} unreachable: {e}", provider.name());
                        issues += 1;
                    }
                },
                None => {
                    println!("  ❌ Default provider '{}' is not registered", config.default_provider);
                    issues += 1;
                }
            }
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
