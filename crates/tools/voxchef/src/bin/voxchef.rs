//! Voxchef CLI - Cook Qubicle QBT assets
//!
//! Reads `.qbt` voxel trees and writes greedy-merged OBJ meshes, a texture
//! atlas and a skeleton document per asset.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use voxel::{cook, load_qbt, CookConfig, SkeletonCentering, VoxelMatrix, VoxelScene};

#[derive(Parser)]
#[command(name = "voxchef")]
#[command(author, version, about = "Cook Qubicle QBT assets into meshes and skeletons")]
struct Cli {
    /// Log at debug level (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Centering {
    /// Root local transform relative to the object center
    ObjectOffset,
    /// Root local transform relative to the root marker
    RootNullRelative,
}

impl From<Centering> for SkeletonCentering {
    fn from(value: Centering) -> Self {
        match value {
            Centering::ObjectOffset => SkeletonCentering::ObjectOffset,
            Centering::RootNullRelative => SkeletonCentering::RootNullRelative,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Cook an asset into .obj, .mtl, .png and .skl files
    Cook {
        /// Input .qbt file
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Cook config (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Base name of the output files (default: input file stem)
        #[arg(short, long)]
        name: Option<String>,

        /// World units per voxel
        #[arg(long)]
        voxel_size: Option<f32>,

        /// Origin of the skeleton root's local transform
        #[arg(long, value_enum)]
        centering: Option<Centering>,
    },

    /// Print the node tree with per-matrix voxel and face counts
    Info {
        /// Input .qbt file
        input: PathBuf,

        /// Print a JSON summary instead of the tree
        #[arg(long)]
        json: bool,
    },

    /// Print the skeleton document
    Skeleton {
        /// Input .qbt file
        input: PathBuf,

        /// Cook config (TOML)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<CookConfig> {
    match path {
        Some(path) => CookConfig::load(path).with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(CookConfig::default()),
    }
}

fn load_scene(input: &Path) -> Result<VoxelScene> {
    load_qbt(input).with_context(|| format!("Failed to read {}", input.display()))
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "asset".to_string())
}

fn run_cook(
    input: &Path,
    output: &Path,
    config: Option<&Path>,
    name: Option<String>,
    voxel_size: Option<f32>,
    centering: Option<Centering>,
) -> Result<()> {
    let mut config = load_config(config)?;
    if voxel_size.is_some() {
        config.voxel_size = voxel_size;
    }
    if let Some(centering) = centering {
        config.centering = Some(centering.into());
    }
    tracing::debug!(?config, "cook config");

    let scene = load_scene(input)?;
    let cooked = cook(&scene, &config).with_context(|| format!("Failed to cook {}", input.display()))?;

    let base = name.unwrap_or_else(|| file_stem(input));
    let files = cooked
        .write_files(output, &base)
        .with_context(|| format!("Failed to write {} to {}", base, output.display()))?;

    println!("Cooked {} as {}", input.display(), cooked.object_type.name);
    println!("  {}", files.obj.display());
    println!("  {}", files.mtl.display());
    if let Some(png) = &files.png {
        println!("  {}", png.display());
    }
    println!("  {}", files.skeleton.display());
    Ok(())
}

fn run_info(input: &Path, json: bool) -> Result<()> {
    let scene = load_scene(input)?;

    let mut matrices = Vec::new();
    for id in scene.descendants(scene.root_id()) {
        if scene.node(id).kind.has_voxels() {
            let matrix = VoxelMatrix::build(&scene, id)
                .with_context(|| format!("Failed to build matrix {}", scene.node(id).full_name))?;
            matrices.push((id, matrix));
        }
    }

    if json {
        let summary = serde_json::json!({
            "name": scene.root().name,
            "nodes": scene.len(),
            "matrices": matrices
                .iter()
                .map(|(_, m)| serde_json::json!({
                    "name": m.full_name,
                    "size": m.size.to_array(),
                    "position": m.world_position.to_array(),
                    "voxels": m.voxels().len(),
                    "faces": m.faces().len(),
                    "triangles": m.faces().len() * 2,
                }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("{} ({} nodes)", scene.root().name, scene.len());
    for id in scene.descendants(scene.root_id()) {
        let node = scene.node(id);
        let indent = "  ".repeat(scene.depth(id));
        match matrices.iter().find(|(mid, _)| *mid == id) {
            Some((_, m)) => println!(
                "{indent}{} {} size={} pos={} voxels={} faces={} triangles={}",
                node.kind,
                node.name,
                m.size,
                m.world_position,
                m.voxels().len(),
                m.faces().len(),
                m.faces().len() * 2
            ),
            None => println!("{indent}{} {}", node.kind, node.name),
        }
    }

    let faces: usize = matrices.iter().map(|(_, m)| m.faces().len()).sum();
    let voxels: usize = matrices.iter().map(|(_, m)| m.voxels().len()).sum();
    println!("Total: {} matrices, {} voxels, {} faces", matrices.len(), voxels, faces);
    Ok(())
}

fn run_skeleton(input: &Path, config: Option<&Path>) -> Result<()> {
    let config = load_config(config)?;
    let scene = load_scene(input)?;
    let cooked = cook(&scene, &config).with_context(|| format!("Failed to cook {}", input.display()))?;
    println!("{}", cooked.document().to_json()?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Cook {
            input,
            output,
            config,
            name,
            voxel_size,
            centering,
        } => run_cook(&input, &output, config.as_deref(), name, voxel_size, centering),
        Commands::Info { input, json } => run_info(&input, json),
        Commands::Skeleton { input, config } => run_skeleton(&input, config.as_deref()),
    }
}
