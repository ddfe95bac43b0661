use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use sha2::Digest as _;
use tracing_subscriber::EnvFilter;

use tilemark::params::LenientNumber;
use tilemark::{BatchOpts, FontFace, NamedInput, WatermarkParams};

#[derive(Parser, Debug)]
#[command(name = "tilemark", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stamp repeated rotated text across an image.
    Text(TextArgs),
    /// Stamp a repeated desaturated image across an image.
    Image(ImageArgs),
    /// Apply one watermark to many images.
    Batch(BatchArgs),
    /// Print the glyph face that text mode would use.
    FontInfo(FontArgs),
}

/// Values left unset fall back to the params file, then to built-in defaults.
#[derive(Parser, Debug)]
struct ParamArgs {
    /// JSON file with watermark params (text, color, opacity, spacing, fontSize, watermarkSize).
    #[arg(long)]
    params: Option<PathBuf>,

    /// Opacity in [0, 1]; out-of-range values are clamped.
    #[arg(long)]
    opacity: Option<String>,

    /// Spacing multiplier between tiles.
    #[arg(long)]
    spacing: Option<String>,
}

/// The bold face bundled with tilemark is used unless one of these is given.
#[derive(Parser, Debug)]
struct FontArgs {
    /// TTF/OTF file.
    #[arg(long, conflicts_with = "system_font")]
    font: Option<PathBuf>,

    /// Use a bold sans-serif face installed on this machine.
    #[arg(long)]
    system_font: bool,
}

#[derive(Parser, Debug)]
struct TextArgs {
    /// Input PNG or JPEG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path. The encoding always matches the input.
    #[arg(long)]
    out: PathBuf,

    /// Watermark text.
    #[arg(long)]
    text: Option<String>,

    /// Hex color, e.g. #000000.
    #[arg(long)]
    color: Option<String>,

    /// Glyph size in pixels.
    #[arg(long)]
    font_size: Option<String>,

    #[command(flatten)]
    params: ParamArgs,

    #[command(flatten)]
    font: FontArgs,
}

#[derive(Parser, Debug)]
struct ImageArgs {
    /// Input PNG or JPEG.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output path. The encoding always matches the input.
    #[arg(long)]
    out: PathBuf,

    /// Watermark image (PNG or JPEG).
    #[arg(long)]
    stencil: PathBuf,

    /// Watermark width as a percentage of the input width.
    #[arg(long)]
    size_percent: Option<String>,

    #[command(flatten)]
    params: ParamArgs,
}

#[derive(Parser, Debug)]
struct BatchArgs {
    /// Directory for outputs; each keeps its input file stem and format.
    #[arg(long)]
    out_dir: PathBuf,

    /// Watermark image. Text mode is used when absent.
    #[arg(long)]
    stencil: Option<PathBuf>,

    /// Override rayon worker threads.
    #[arg(long)]
    threads: Option<usize>,

    #[command(flatten)]
    params: ParamArgs,

    #[command(flatten)]
    font: FontArgs,

    /// Input images.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Text(args) => cmd_text(args),
        Command::Image(args) => cmd_image(args),
        Command::Batch(args) => cmd_batch(args),
        Command::FontInfo(args) => cmd_font_info(args),
    }
}

fn cmd_text(args: TextArgs) -> anyhow::Result<()> {
    let input = read_bytes(&args.in_path)?;
    let font = load_font(&args.font)?;
    let cli = WatermarkParams {
        text: args.text,
        color: args.color,
        font_size: args.font_size.map(LenientNumber::Text),
        ..Default::default()
    };
    let spec = resolve_params(&args.params, cli)?.into_text_spec(font)?;

    let out = tilemark::apply_detailed(&input, &spec)?;
    write_bytes(&args.out, &out.bytes)?;
    eprintln!("wrote {} ({})", args.out.display(), out.format);
    Ok(())
}

fn cmd_image(args: ImageArgs) -> anyhow::Result<()> {
    let input = read_bytes(&args.in_path)?;
    let stencil = read_bytes(&args.stencil)?;
    let cli = WatermarkParams {
        watermark_size: args.size_percent.map(LenientNumber::Text),
        ..Default::default()
    };
    let spec = resolve_params(&args.params, cli)?.into_image_spec(stencil)?;

    let out = tilemark::apply_detailed(&input, &spec)?;
    write_bytes(&args.out, &out.bytes)?;
    eprintln!("wrote {} ({})", args.out.display(), out.format);
    Ok(())
}

fn cmd_batch(args: BatchArgs) -> anyhow::Result<()> {
    let params = resolve_params(&args.params, WatermarkParams::default())?;
    let spec = match &args.stencil {
        Some(path) => params.into_image_spec(read_bytes(path)?)?,
        None => params.into_text_spec(load_font(&args.font)?)?,
    };

    let mut inputs = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_owned());
        inputs.push(NamedInput::new(name, read_bytes(path)?));
    }

    let items = tilemark::apply_batch(
        &inputs,
        &spec,
        BatchOpts {
            threads: args.threads,
        },
    )?;

    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;
    let mut taken = HashSet::new();
    let mut failed = 0usize;
    for item in items {
        match item.result {
            Ok(out) => {
                let file_name = claim_output_name(&mut taken, &item.name, out.format.extension());
                let path = args.out_dir.join(file_name);
                write_bytes(&path, &out.bytes)?;
                eprintln!("wrote {}", path.display());
            }
            Err(err) => {
                failed += 1;
                eprintln!("skipped {}: {err}", item.name);
            }
        }
    }
    if failed == args.inputs.len() {
        anyhow::bail!("every input failed");
    }
    Ok(())
}

fn cmd_font_info(args: FontArgs) -> anyhow::Result<()> {
    let face = load_font(&args)?;
    println!("family: {}", face.family_name());
    println!("index:  {}", face.index());
    println!("bytes:  {}", face.bytes().len());
    println!("sha256: {}", sha256_hex(face.bytes()));
    Ok(())
}

fn resolve_params(args: &ParamArgs, cli: WatermarkParams) -> anyhow::Result<WatermarkParams> {
    let cli = WatermarkParams {
        opacity: args.opacity.clone().map(LenientNumber::Text),
        spacing: args.spacing.clone().map(LenientNumber::Text),
        ..cli
    };
    match &args.params {
        Some(path) => Ok(cli.merged_over(WatermarkParams::from_path(path)?)),
        None => Ok(cli),
    }
}

fn load_font(args: &FontArgs) -> anyhow::Result<FontFace> {
    if let Some(path) = &args.font {
        return FontFace::from_bytes(read_bytes(path)?)
            .with_context(|| format!("load font '{}'", path.display()));
    }
    if args.system_font {
        return Ok(FontFace::system_bold_sans()?);
    }
    Ok(FontFace::embedded_bold()?)
}

/// `<stem>.<ext>`, or `<stem>-N.<ext>` when an earlier input already wrote that name.
fn claim_output_name(taken: &mut HashSet<String>, stem: &str, ext: &str) -> String {
    let mut name = format!("{stem}.{ext}");
    let mut n = 2u32;
    while !taken.insert(name.clone()) {
        name = format!("{stem}-{n}.{ext}");
        n += 1;
    }
    name
}

fn read_bytes(path: &Path) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("read '{}'", path.display()))
}

fn write_bytes(path: &Path, bytes: &[u8]) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(path, bytes).with_context(|| format!("write '{}'", path.display()))
}

fn sha256_hex(bytes: &[u8]) -> String {
    let digest = sha2::Sha256::digest(bytes);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
