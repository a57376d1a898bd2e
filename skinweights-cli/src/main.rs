use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use skinweights_core::config::{self, SkinConfig};
use skinweights_core::editor::MirrorSide;
use skinweights_core::geometry::{Axis, GeometryKind};
use skinweights_core::scene::{MemoryScene, Shape};
use skinweights_core::{session, OperationReport, SkinScene, VERSION};

#[derive(Parser, Debug)]
#[command(name = "skinweights", version = VERSION, about = "Save, restore and edit skin weights")]
struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,
    /// YAML settings: side markers, mirror axis/side, world-space threshold
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the nodes of a scene file and their bindings
    Inspect { scene: PathBuf },
    /// Write a node's weights to a .skinData file
    Export {
        scene: PathBuf,
        /// Selected nodes; the first one is used
        #[arg(short, long = "node", required = true)]
        nodes: Vec<String>,
        #[arg(short, long)]
        out: PathBuf,
    },
    /// Load a .skinData file onto a node, binding it first if needed
    Import {
        scene: PathBuf,
        #[arg(short, long = "node", required = true)]
        nodes: Vec<String>,
        file: PathBuf,
        /// Match vertices by world position instead of index
        #[arg(long)]
        world: bool,
        #[arg(long)]
        threshold: Option<f64>,
        /// Namespace for influences of a newly created binding
        #[arg(long)]
        namespace: Option<String>,
    },
    /// Move a percentage of one influence's weight onto another
    Transfer {
        scene: PathBuf,
        #[arg(short, long = "node", required = true)]
        nodes: Vec<String>,
        #[arg(long)]
        source: String,
        #[arg(long)]
        target: String,
        #[arg(long)]
        percent: f64,
        /// Restrict to these vertex indices
        #[arg(long, value_delimiter = ',')]
        vertices: Option<Vec<usize>>,
    },
    /// Mirror weights across a symmetry plane
    Mirror {
        scene: PathBuf,
        #[arg(short, long = "node", required = true)]
        nodes: Vec<String>,
        #[arg(long)]
        axis: Option<Axis>,
        #[arg(long, value_enum)]
        side: Option<SideArg>,
    },
    /// Copy weights from one node's binding onto another's by vertex position
    Copy {
        scene: PathBuf,
        source: String,
        target: String,
        #[arg(long)]
        axis: Option<Axis>,
    },
    /// Enable (or with --off disable) the envelope of every binding
    ToggleEnvelopes {
        scene: PathBuf,
        #[arg(long)]
        off: bool,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SideArg {
    NegToPos,
    PosToNeg,
    Both,
}

impl From<SideArg> for MirrorSide {
    fn from(side: SideArg) -> Self {
        match side {
            SideArg::NegToPos => MirrorSide::NegToPos,
            SideArg::PosToNeg => MirrorSide::PosToNeg,
            SideArg::Both => MirrorSide::Both,
        }
    }
}

/// Unmatched components printed before the list is elided.
const MAX_LISTED: usize = 8;

fn load_scene(path: &Path) -> Result<MemoryScene> {
    MemoryScene::load_from_path(path).with_context(|| format!("loading scene {}", path.display()))
}

fn save_scene(scene: &MemoryScene, path: &Path) -> Result<()> {
    scene.save(path).with_context(|| format!("writing scene {}", path.display()))
}

fn progress_logger(label: &'static str) -> impl FnMut(f64) {
    let mut last = -1.0;
    move |percent: f64| {
        // every 10%
        if percent - last >= 10.0 || percent >= 100.0 {
            log::debug!("{}: {:.0}%", label, percent);
            last = percent;
        }
    }
}

fn print_report(what: &str, node: &str, kind: GeometryKind, report: &OperationReport) {
    println!("{}: wrote {} vertices", what, report.written);
    if !report.unmatched_vertices.is_empty() {
        let shown: Vec<String> = report
            .unmatched_vertices
            .iter()
            .take(MAX_LISTED)
            .map(|v| format!("{}.{}[{}]", node, kind.component_name(), v))
            .collect();
        let more = report.unmatched_vertices.len().saturating_sub(MAX_LISTED);
        let tail = if more > 0 { format!(" (+{} more)", more) } else { String::new() };
        println!("  unmatched: {}{}", shown.join(" "), tail);
    }
    if !report.unmatched_influences.is_empty() {
        println!("  unmatched influences: {}", report.unmatched_influences.join(", "));
    }
}

fn inspect(scene: &MemoryScene, config: &SkinConfig) {
    for (name, node) in &scene.nodes {
        match &node.shape {
            None => println!("{}: (no shape)", name),
            Some(Shape::Unbound { kind, points }) => {
                println!("{}: {:?}, {} points, unbound", name, kind, points.len())
            }
            Some(Shape::Bound(b)) => {
                println!("{}: {:?}, {} points, binding {}", name, b.kind, b.points.len(), b.name);
                println!("  influences: {}", b.influences.join(", "));
                println!(
                    "  normalize={} envelope={} method={:?}",
                    b.normalize_weights, b.envelope, b.skinning_method
                );
                if !b.weights.is_normalized(config.normalize.epsilon) {
                    println!("  some vertices do not sum to 1.0");
                }
            }
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = match &cli.config {
        Some(path) => config::load_from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SkinConfig::default(),
    };

    match cli.cmd {
        Command::Inspect { scene } => {
            inspect(&load_scene(&scene)?, &config);
        }
        Command::Export { scene, nodes, out } => {
            let mut s = load_scene(&scene)?;
            let node = session::resolve(&nodes)?;
            let written = session::export_node(&mut s, node, &out)?;
            println!("Exported {} to {}", node, written.display());
        }
        Command::Import { scene, nodes, file, world, threshold, namespace } => {
            let mut s = load_scene(&scene)?;
            let node = session::resolve(&nodes)?;
            let mode = session::import_mode(&config, world, threshold);
            let mut progress = progress_logger("import");
            let report = session::load_and_import(
                &mut s,
                node,
                &file,
                mode,
                namespace.as_deref(),
                &mut progress,
            )
            .with_context(|| format!("importing {} onto {}", file.display(), node))?;
            save_scene(&s, &scene)?;
            print_report("import", node, s.shape(node)?.0, &report);
        }
        Command::Transfer { scene, nodes, source, target, percent, vertices } => {
            let mut s = load_scene(&scene)?;
            let node = session::resolve(&nodes)?;
            let report = session::transfer_node(
                &mut s,
                node,
                &source,
                &target,
                percent,
                vertices.as_deref(),
            )?;
            save_scene(&s, &scene)?;
            print_report("transfer", node, s.shape(node)?.0, &report);
        }
        Command::Mirror { scene, nodes, axis, side } => {
            let mut s = load_scene(&scene)?;
            let node = session::resolve(&nodes)?;
            let mut options = config.mirror_options();
            if let Some(axis) = axis {
                options.axis = axis;
            }
            if let Some(side) = side {
                options.side = side.into();
            }
            let mut progress = progress_logger("mirror");
            let report = session::mirror_node(&mut s, node, &options, &mut progress)?;
            save_scene(&s, &scene)?;
            print_report("mirror", node, s.shape(node)?.0, &report);
        }
        Command::Copy { scene, source, target, axis } => {
            let mut s = load_scene(&scene)?;
            let axis = axis.unwrap_or(config.mirror.axis);
            let mut progress = progress_logger("copy");
            let report = session::copy_between(&mut s, &source, &target, axis, &mut progress)?;
            save_scene(&s, &scene)?;
            print_report("copy", &target, s.shape(&target)?.0, &report);
        }
        Command::ToggleEnvelopes { scene, off } => {
            let mut s = load_scene(&scene)?;
            let touched = session::toggle_envelopes(&mut s, !off);
            save_scene(&s, &scene)?;
            println!("Envelope {} on {} bindings", if off { "off" } else { "on" }, touched);
        }
    }
    Ok(())
}
