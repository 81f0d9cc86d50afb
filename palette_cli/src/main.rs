use anyhow::Context;
use clap::{Parser, Subcommand};
use colored::Colorize;
use palette_core::api::{self, CodeRequest, ErrorBody, NameRequest, Request, Response, SaveRequest};
use palette_core::{
    Config, ErrorKind, MemoryStore, Method, Palette, PaletteError, PaletteStore, SavedPalette,
    Session, Swatch,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Generate, lock and save 5-color palettes.
#[derive(Parser, Debug)]
#[command(version, about, arg_required_else_help = true)]
struct Args {
    /// Config file (defaults to ./swatchbox.toml when present).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Palette file override.
    #[arg(long, global = true)]
    store: Option<PathBuf>,

    /// Keep saved palettes in memory only.
    #[arg(long, global = true)]
    memory: bool,

    /// Log filter, e.g. `debug` or `palette_core=trace`.
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a new palette as JSON.
    Generate {
        /// random, monochrome, triadic or quadratic.
        #[arg(short, long)]
        method: Option<String>,
        /// JSON file with the current swatches; locked ones are kept.
        #[arg(long)]
        current: Option<PathBuf>,
    },
    /// Save a palette JSON file under a name (`-` reads stdin).
    Save { name: String, palette: PathBuf },
    /// Print the saved palette with this code.
    Load { code: String },
    /// Print the saved palette with this name.
    Open { name: String },
    /// List saved palette names.
    List,
    /// Toggle the like flag of a saved palette.
    Like { name: String },
    /// Answer one JSON request per stdin line with one JSON response per line.
    Serve,
    /// Interactive session.
    Repl {
        #[arg(short, long)]
        method: Option<String>,
    },
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn read_json_input(path: &Path) -> anyhow::Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        io::Read::read_to_string(&mut io::stdin(), &mut text).context("read stdin")?;
        Ok(text)
    } else {
        fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
    }
}

/// A missing or blank method falls back to the configured default.
fn apply_default_method(req: &mut api::GenerateRequest, default_method: Method) {
    if req.method.as_deref().is_none_or(|m| m.trim().is_empty()) {
        req.method = Some(default_method.to_string());
    }
}

/// Print the response; operation errors become a failing exit status.
fn run_once(request: Request, store: &dyn PaletteStore) -> anyhow::Result<()> {
    let mut rng = StdRng::from_entropy();
    debug!(op = request.op(), "handling request");
    let response = api::handle(request, store, &mut rng);
    println!(
        "{}",
        serde_json::to_string_pretty(&response).context("serialize response")?
    );
    if let Response::Error(body) = response {
        anyhow::bail!(body.message);
    }
    Ok(())
}

fn serve(store: &dyn PaletteStore, default_method: Method) -> anyhow::Result<()> {
    let mut rng = StdRng::from_entropy();
    let mut stdout = io::stdout().lock();
    info!("serving requests on stdin");

    for line in io::stdin().lock().lines() {
        let line = line.context("read request line")?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(&line) {
            Ok(mut request) => {
                if let Request::Generate(req) = &mut request {
                    apply_default_method(req, default_method);
                }
                debug!(op = request.op(), "handling request");
                api::handle(request, store, &mut rng)
            }
            Err(e) => Response::Error(ErrorBody {
                kind: ErrorKind::Validation,
                message: format!("malformed request: {e}"),
            }),
        };

        serde_json::to_writer(&mut stdout, &response).context("write response")?;
        writeln!(stdout)?;
        stdout.flush()?;
    }

    Ok(())
}

fn swatch_line(index: usize, s: &Swatch) -> String {
    let (r, g, b) = s.color.rgb();
    let chip = "      ".on_truecolor(r, g, b);
    let lock = if s.locked { "locked".bold().to_string() } else { String::new() };
    format!(
        "  {index} {chip} {} | {:<20} | {:<22} | {lock}",
        s.color,
        s.rgb(),
        s.hsl()
    )
}

fn print_palette(palette: &Palette) {
    for (i, s) in palette.iter().enumerate() {
        println!("{}", swatch_line(i, s));
    }
}

fn print_saved(saved: &SavedPalette) {
    let like = if saved.liked { " (liked)" } else { "" };
    println!("{} | code {} | {}{like}", saved.name, saved.code, saved.link);
}

/// Soft failures are reported and the session goes on; so are store failures,
/// which only fail the one command.
fn report(err: &PaletteError) {
    match err.kind() {
        ErrorKind::Validation => println!("{err}"),
        ErrorKind::StoreUnavailable => println!("{} {err}", "store error:".red()),
    }
}

fn repl(store: Arc<dyn PaletteStore>, method: Method) -> anyhow::Result<()> {
    let mut session = Session::new(store, method);

    println!("Palette session ({})", session.method);
    println!("Type 'help' for commands. Empty line regenerates. 'quit' to exit.");
    print_palette(session.palette());

    loop {
        print!("pal> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            // EOF (Ctrl+D)
            break;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let cmd = parts.first().map(|s| s.to_lowercase()).unwrap_or_default();
        let rest = parts.get(1..).unwrap_or_default().join(" ");

        match cmd.as_str() {
            "help" => {
                println!(
                    r#"Commands:
                        (empty) | g      regenerate unlocked swatches
                        lock <0..4>      toggle lock on a swatch
                        method <m>       random | monochrome | triadic | quadratic
                        show             print the working palette
                        json             print the working palette as JSON
                        save <name>      save (or overwrite) under a name
                        load <code>      replace the working palette by code
                        open <name>      replace the working palette by name
                        like <name>      toggle like on a saved palette
                        list             saved palette names
                        quit
                        "#
                );
            }
            "quit" | "exit" => break,

            "" | "g" | "gen" | "generate" => print_palette(session.regenerate()),

            "show" => print_palette(session.palette()),

            "json" => println!("{}", serde_json::to_string_pretty(session.palette())?),

            "lock" | "l" => {
                let Some(index) = parts.get(1).and_then(|s| s.parse::<i64>().ok()) else {
                    println!("Usage: lock <0..4>");
                    continue;
                };
                match session.toggle_lock(index) {
                    Ok(p) => print_palette(p),
                    Err(e) => report(&e),
                }
            }

            "method" => match rest.parse::<Method>() {
                Ok(m) => {
                    session.method = m;
                    println!("Method: {m}");
                }
                Err(e) => println!("{e}"),
            },

            "save" => {
                if rest.is_empty() {
                    println!("Usage: save <name>");
                    continue;
                }
                match session.save(&rest) {
                    Ok(saved) => print_saved(&saved),
                    Err(e) => report(&e),
                }
            }

            "load" | "open" => {
                if rest.is_empty() {
                    println!("Usage: {cmd} <{}>", if cmd == "load" { "code" } else { "name" });
                    continue;
                }
                let found = if cmd == "load" {
                    session.load_code(&rest)
                } else {
                    session.open_name(&rest)
                };
                match found {
                    Ok(Some(saved)) => {
                        print_saved(&saved);
                        print_palette(session.palette());
                    }
                    Ok(None) => println!("No saved palette matches '{rest}'."),
                    Err(e) => report(&e),
                }
            }

            "like" => match session.toggle_like(&rest) {
                Ok(Some(saved)) => print_saved(&saved),
                Ok(None) => println!("No saved palette named '{rest}'."),
                Err(e) => report(&e),
            },

            "list" => match session.saved_names() {
                Ok(names) if names.is_empty() => println!("(no saved palettes yet)"),
                Ok(names) => {
                    println!("Saved palettes:");
                    for name in names {
                        println!("  {name}");
                    }
                }
                Err(e) => report(&e),
            },

            _ => println!("Unknown command '{cmd}'. Type 'help'."),
        }
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref());

    let mut config = Config::load_or_default(args.config.as_deref())?;
    if let Some(path) = args.store {
        config.store_path = path;
    }

    let store: Arc<dyn PaletteStore> = if args.memory {
        Arc::new(MemoryStore::new(config.link_base.clone()))
    } else {
        Arc::new(config.open_store())
    };

    match args.command {
        Command::Generate { method, current } => {
            let current_colors = match current {
                Some(path) => {
                    let text = read_json_input(&path)?;
                    let swatches: Vec<Swatch> = serde_json::from_str(&text)
                        .with_context(|| format!("parse swatches in {}", path.display()))?;
                    Some(swatches)
                }
                None => None,
            };
            let mut req = api::GenerateRequest {
                method,
                current_colors,
            };
            apply_default_method(&mut req, config.default_method);
            run_once(Request::Generate(req), store.as_ref())?;
        }
        Command::Save { name, palette } => {
            let text = read_json_input(&palette)?;
            let colors: Palette = serde_json::from_str(&text)
                .with_context(|| format!("parse palette in {}", palette.display()))?;
            run_once(Request::Save(SaveRequest { name, colors }), store.as_ref())?;
        }
        Command::Load { code } => {
            run_once(Request::LoadByCode(CodeRequest { code }), store.as_ref())?;
        }
        Command::Open { name } => {
            run_once(Request::LoadByName(NameRequest { name }), store.as_ref())?;
        }
        Command::List => run_once(Request::ListNames, store.as_ref())?,
        Command::Like { name } => {
            run_once(Request::ToggleLike(NameRequest { name }), store.as_ref())?;
        }
        Command::Serve => serve(store.as_ref(), config.default_method)?,
        Command::Repl { method } => {
            let method = method
                .as_deref()
                .map(|m| Method::resolve(Some(m)))
                .unwrap_or(config.default_method);
            repl(store, method)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use palette_core::Color;

    #[test]
    fn global_flags_parse_after_the_subcommand() -> anyhow::Result<()> {
        let args = Args::try_parse_from([
            "palette_cli",
            "generate",
            "--method",
            "triadic",
            "--store",
            "other.json",
        ])?;
        assert_eq!(args.store, Some(PathBuf::from("other.json")));
        assert!(matches!(
            args.command,
            Command::Generate { method: Some(ref m), current: None } if m == "triadic"
        ));
        Ok(())
    }

    #[test]
    fn save_takes_name_and_file() -> anyhow::Result<()> {
        let args = Args::try_parse_from(["palette_cli", "save", "Sunset", "-"])?;
        match args.command {
            Command::Save { name, palette } => {
                assert_eq!(name, "Sunset");
                assert_eq!(palette, PathBuf::from("-"));
            }
            other => panic!("unexpected command {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn blank_method_takes_the_configured_default() -> anyhow::Result<()> {
        for raw in [
            r#"{"op":"generate"}"#,
            r#"{"op":"generate","method":""}"#,
            r#"{"op":"generate","method":"  "}"#,
        ] {
            let Request::Generate(mut req) = serde_json::from_str::<Request>(raw)? else {
                panic!("{raw} is not a generate request");
            };
            apply_default_method(&mut req, Method::Monochrome);
            assert_eq!(req.method.as_deref(), Some("monochrome"), "{raw}");
        }

        let mut named = api::GenerateRequest {
            method: Some("triadic".into()),
            current_colors: None,
        };
        apply_default_method(&mut named, Method::Monochrome);
        assert_eq!(named.method.as_deref(), Some("triadic"));
        Ok(())
    }

    #[test]
    fn swatch_line_shows_every_rendering() {
        let s = Swatch::locked(Color::new(255, 0, 0));
        let line = swatch_line(3, &s);
        assert!(line.contains("#FF0000"));
        assert!(line.contains("rgb(255, 0, 0)"));
        assert!(line.contains("hsl(0, 100%, 50%)"));
        assert!(line.contains("locked"));
    }
}
