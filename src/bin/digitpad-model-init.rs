use std::path::PathBuf;

use digitpad::{config, inference};

fn main() {
    let mut out: Option<PathBuf> = None;
    let mut import: Option<PathBuf> = None;
    let mut base_width: Option<usize> = None;
    let mut force = false;
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--out" => {
                if let Some(value) = args.next() {
                    out = Some(PathBuf::from(value));
                }
            }
            "--import" => match args.next() {
                Some(value) => import = Some(PathBuf::from(value)),
                None => {
                    eprintln!("--import expects a .pt, .pth or .safetensors path");
                    std::process::exit(2);
                }
            },
            "--base-width" => match args.next().map(|value| value.parse::<usize>()) {
                Some(Ok(value)) if value > 0 => base_width = Some(value),
                _ => {
                    eprintln!("--base-width expects a positive integer");
                    std::process::exit(2);
                }
            },
            "--force" => {
                force = true;
            }
            "--help" | "-h" => {
                print_help();
                return;
            }
            other => {
                eprintln!("Ignoring unknown argument '{other}'");
            }
        }
    }

    let mut settings = match config::load_or_default() {
        Ok(config) => config.model,
        Err(err) => {
            eprintln!("Failed to load config: {err}");
            std::process::exit(1);
        }
    };
    if let Some(width) = base_width {
        settings.base_width = width;
    }
    let target = match out.map_or_else(|| settings.resolved_path(), Ok) {
        Ok(path) => path,
        Err(err) => {
            eprintln!("Failed to resolve model path: {err}");
            std::process::exit(1);
        }
    };

    let written = match &import {
        Some(source) => inference::import_weights(source, &target, &settings, force),
        None => inference::write_initial_weights(&target, &settings, force),
    };
    match written {
        Ok(path) => {
            match &import {
                Some(source) => {
                    println!("Imported {} into {}", source.display(), path.display())
                }
                None => println!("Untrained classifier written: {}", path.display()),
            }
            if base_width.is_some() {
                println!(
                    "Set `base_width = {}` under [model] in config.toml to load it.",
                    settings.base_width
                );
            }
        }
        Err(err) => {
            eprintln!("Failed to write classifier: {err}");
            std::process::exit(1);
        }
    }
}

fn print_help() {
    println!(
        "Usage: digitpad-model-init [--import <checkpoint>] [--out <path>] [--base-width <n>] [--force]"
    );
    println!();
    println!("With --import, converts a trained ResNet-layout state dict (.pt, .pth or");
    println!(".safetensors) into the classifier record. Without it, writes randomly");
    println!("initialized weights so the UI can start; their predictions are meaningless.");
}
