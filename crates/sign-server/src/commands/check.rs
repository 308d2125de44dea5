//! Check command implementation.

use std::path::Path;

use anyhow::{Context, Result};
use sign_core::{AppSettings, Lifecycle, LoadedModule, ServiceState, SignService, loaded_modules};

/// Run the check command
pub fn run(settings: &AppSettings) -> Result<()> {
    let config = &settings.sign_service;
    let mut service = SignService::new(config);
    service.start().context("Startup check failed")?;

    println!("=== Sign Server Check ===");
    println!("Mode:        {}", service.state());
    println!("Listen:      {}", config.bind_address());
    println!("Timeout:     {} ms", config.timeout_ms);
    match service.entry_point() {
        Some(entry) => println!("Entry point: {}", entry),
        None => println!("Entry point: (none, test mode)"),
    }

    let info = service.app_info_source().app_info();
    match service.app_info_source().locate() {
        Some(path) => println!(
            "App info:    {} {} ({})",
            info.platform,
            info.version,
            path.display()
        ),
        None => println!("App info:    {} {} (defaults)", info.platform, info.version),
    }

    if service.state() == ServiceState::Ready {
        let mut names: Vec<String> = config.libs.iter().map(|lib| file_name(lib)).collect();
        names.push(config.invoker_settings().module_name());

        let modules = loaded_modules().context("Failed to list loaded modules")?;
        println!();
        println!("Loaded modules:");
        for module in relevant_modules(&modules, &names) {
            println!("  0x{:016X}  {}", module.base, module.path);
        }
    }

    service.stop();
    Ok(())
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

fn relevant_modules<'a>(
    modules: &'a [LoadedModule],
    names: &'a [String],
) -> impl Iterator<Item = &'a LoadedModule> {
    modules
        .iter()
        .filter(move |module| names.iter().any(|name| module.path.contains(name.as_str())))
}
