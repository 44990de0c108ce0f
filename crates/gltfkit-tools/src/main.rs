//! gltfkit - inspect, validate and convert glTF 2.0 assets.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{debug, info, LevelFilter};
use thiserror::Error;

use gltfkit_core::{GltfError, Model};
use gltfkit_io::{load, Decoded, EncodeOptions, Encoder};

#[derive(Parser, Debug)]
#[command(name = "gltfkit")]
#[command(about = "Inspect, validate and convert glTF 2.0 assets")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print a summary of an asset
    Info {
        /// Input .gltf or .glb file
        input: PathBuf,
    },

    /// Decode an asset and report errors and warnings
    Validate {
        /// Input .gltf or .glb file
        input: PathBuf,
    },

    /// Re-encode an asset
    Convert {
        /// Input .gltf or .glb file
        input: PathBuf,

        /// Output file; a .glb extension implies --glb
        output: PathBuf,

        /// Embed buffers as base64 data URIs
        #[arg(long)]
        embed_buffers: bool,

        /// Embed images as base64 data URIs
        #[arg(long)]
        embed_images: bool,

        /// Indent the JSON
        #[arg(long)]
        pretty: bool,

        /// Write a binary GLB container
        #[arg(long)]
        glb: bool,
    },
}

#[derive(Error, Debug)]
enum CliError {
    #[error("{path}: {source}")]
    Gltf {
        path: String,
        #[source]
        source: GltfError,
    },

    #[error("failed to write output: {0}")]
    Output(#[from] io::Error),
}

fn gltf_error(path: &Path) -> impl FnOnce(GltfError) -> CliError + '_ {
    move |source| CliError::Gltf {
        path: path.display().to_string(),
        source,
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let stdout = io::stdout();
    match run(cli.command, &mut stdout.lock()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {}", err);
            ExitCode::FAILURE
        }
    }
}

/// Runs one command. `Ok(false)` means the input was rejected by `validate`.
fn run(command: Commands, out: &mut impl Write) -> Result<bool, CliError> {
    match command {
        Commands::Info { input } => {
            let decoded = load(&input).map_err(gltf_error(&input))?;
            print_info(&decoded, out)?;
            Ok(true)
        }
        Commands::Validate { input } => match load(&input) {
            Ok(decoded) => {
                for warning in &decoded.warnings {
                    writeln!(out, "warning: {}", warning)?;
                }
                writeln!(
                    out,
                    "{}: valid ({} warnings)",
                    input.display(),
                    decoded.warnings.len()
                )?;
                Ok(true)
            }
            Err(err) => {
                writeln!(out, "{}: {}: {}", input.display(), err.category(), err)?;
                Ok(false)
            }
        },
        Commands::Convert {
            input,
            output,
            embed_buffers,
            embed_images,
            pretty,
            glb,
        } => {
            let decoded = load(&input).map_err(gltf_error(&input))?;
            let binary = glb || has_glb_extension(&output);
            let options = EncodeOptions::new()
                .with_binary_container(binary)
                .with_embed_buffers(embed_buffers)
                .with_embed_images(embed_images)
                .with_pretty(pretty)
                .with_buffer_uri_stem(buffer_stem(&output));
            debug!("convert options: {:?}", options);

            let asset = Encoder::new(options)
                .encode(&decoded.model)
                .map_err(gltf_error(&output))?;
            asset.save(&output).map_err(gltf_error(&output))?;
            info!(
                "wrote {} ({} external resources)",
                output.display(),
                asset.resources.len()
            );
            writeln!(out, "{} -> {}", input.display(), output.display())?;
            Ok(true)
        }
    }
}

fn has_glb_extension(path: &Path) -> bool {
    path.extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("glb"))
}

/// `scene.gltf` writes its buffers as `scene0.bin`, `scene1.bin`, ...
fn buffer_stem(output: &Path) -> String {
    output
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "buffer".to_string())
}

fn print_info(decoded: &Decoded, out: &mut impl Write) -> io::Result<()> {
    let model: &Model = &decoded.model;
    writeln!(out, "glTF {}", model.asset.version)?;
    if let Some(generator) = &model.asset.generator {
        writeln!(out, "generator: {}", generator)?;
    }

    let tables = [
        ("scenes", model.scenes.len()),
        ("nodes", model.nodes.len()),
        ("meshes", model.meshes.len()),
        ("accessors", model.accessors.len()),
        ("bufferViews", model.buffer_views.len()),
        ("buffers", model.buffers.len()),
        ("materials", model.materials.len()),
        ("textures", model.textures.len()),
        ("images", model.images.len()),
        ("samplers", model.samplers.len()),
        ("animations", model.animations.len()),
        ("skins", model.skins.len()),
        ("cameras", model.cameras.len()),
    ];
    for (name, count) in tables {
        if count > 0 {
            writeln!(out, "{:>12}: {}", name, count)?;
        }
    }

    let bytes: usize = model.buffers.iter().map(|b| b.data.len()).sum();
    writeln!(out, "buffer bytes: {}", bytes)?;
    if !model.extensions_used.is_empty() {
        writeln!(out, "extensions: {}", model.extensions_used.join(", "))?;
    }
    if !decoded.warnings.is_empty() {
        writeln!(out, "warnings: {}", decoded.warnings.len())?;
    }
    Ok(())
}
