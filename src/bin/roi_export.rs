use dendrite_roi::config::export::load_config;
use dendrite_roi::image::io::{load_stack, save_mask_png};
use dendrite_roi::persist::{encode, save_container, EncodeOptions};
use dendrite_roi::skeleton::parse_swc;
use dendrite_roi::Session;
use std::env;
use std::fs;
use std::path::Path;

fn main() {
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = load_config(Path::new(&config_path))?;

    if config.frames.is_empty() {
        return Err("Config lists no frame images".to_string());
    }
    let stack = load_stack(&config.frames)?;
    let swc = fs::read_to_string(&config.skeleton)
        .map_err(|e| format!("Failed to read {}: {e}", config.skeleton.display()))?;
    let skeleton = parse_swc(&swc).map_err(|e| e.to_string())?;

    let mut session = Session::new(stack, None, &config.session).map_err(|e| e.to_string())?;
    let added = session.add_skeleton(&skeleton).map_err(|e| e.to_string())?;
    if let Some(threshold) = config.threshold {
        session.set_threshold(threshold);
    }
    let segments = match config.split_length {
        Some(length) => session.split_branches(length).map_err(|e| e.to_string())?,
        None => 0,
    };

    let options = EncodeOptions {
        mask: true,
        data: config.output.include_data,
    };
    let container = encode(&mut session, options).map_err(|e| e.to_string())?;
    save_container(&config.output.container_json, &container)?;
    if let Some(mask_path) = &config.output.mask_image {
        save_mask_png(session.mask(), mask_path)?;
        println!("Saved mask to {}", mask_path.display());
    }

    let [h, w, frames] = session.stack().shape();
    println!(
        "Loaded {frames} frames of {w}x{h}; threshold {:.4}, foreground {} px",
        session.threshold(),
        session.mask().count()
    );
    println!(
        "Exported {} branches ({} skipped), {segments} segments to {}",
        added.len(),
        skeleton.branches.len() - added.len(),
        config.output.container_json.display()
    );

    Ok(())
}

fn usage() -> String {
    "Usage: roi_export <config.json>".to_string()
}
