use std::fs;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{debug, info};
use unicode_width::UnicodeWidthStr;

use crate::catalog::Catalog;
use crate::config::{AppContext, LEVEL_NAMES, RoleKind, ViewerOverrides, parse_level};
use crate::filter::filter_products;
use crate::map::viewport::{self, CameraAction};
use crate::model::{CategoryFilter, Viewer};
use crate::state::AppState;

mod catalog;
mod config;
mod filter;
mod gui;
mod map;
mod model;
mod position;
mod state;

#[derive(Parser, Debug)]
#[command(author, version, about = "Register, verify and locate farm production regions on a map.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Viewer role: farmer, buyer, admin
    #[arg(long, global = true)]
    role: Option<String>,

    /// Admin level: commune, district, province, central
    #[arg(long, global = true)]
    level: Option<String>,

    /// Assigned area of an admin viewer
    #[arg(long, global = true)]
    area: Option<String>,

    /// Load the catalog from a JSON snapshot instead of the built-in data
    #[arg(long, global = true, value_name = "JSON")]
    catalog: Option<PathBuf>,

    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Launch the map window (default)
    Gui,
    /// Print the products visible to the viewer
    List {
        #[arg(long, default_value = "")]
        query: String,
        /// Category name, or "all"
        #[arg(long, default_value = "all")]
        category: String,
    },
    /// Print catalog statistics and the certificate register
    Stats,
    /// Print version and build information
    About,
}

impl Cli {
    fn validate(&self) -> Result<(), String> {
        if let Some(role) = &self.role
            && RoleKind::parse(role).is_none()
        {
            return Err(format!("Invalid role '{}'. Use one of: {}", role, RoleKind::NAMES.join(", ")));
        }

        if let Some(level) = &self.level
            && parse_level(level).is_none()
        {
            return Err(format!("Invalid level '{}'. Use one of: {}", level, LEVEL_NAMES.join(", ")));
        }

        if let Some(path) = &self.catalog
            && !path.is_file()
        {
            return Err(format!("Catalog file does not exist: {:?}", path));
        }

        Ok(())
    }

    fn overrides(&self) -> ViewerOverrides {
        ViewerOverrides {
            role: self.role.as_deref().and_then(RoleKind::parse),
            level: self.level.as_deref().and_then(parse_level),
            area: self.area.clone(),
        }
    }
}

// --- CLI Helpers ---

fn pad(s: &str, width: usize) -> String {
    let w = UnicodeWidthStr::width(s);
    if w >= width { s.to_string() } else { format!("{}{}", s, " ".repeat(width - w)) }
}

fn print_list(catalog: &Catalog, viewer: &Viewer, ctx: &AppContext, query: &str, category: &CategoryFilter) {
    let query = crate::map::search::commit(query);
    let results = filter_products(catalog.products(), viewer, &query, category);

    let name_w = results.iter().map(|p| p.name.width()).max().unwrap_or(0).max(4);
    let code_w = results.iter().map(|p| p.region_code.width()).max().unwrap_or(0).max(6);
    println!("{}  {}  {}  {}", pad("Name", name_w), pad("Region", code_w), pad("Status", 14), "Address");
    for p in &results {
        println!(
            "{}  {}  {}  {}",
            pad(&p.name, name_w),
            pad(&p.region_code, code_w),
            pad(p.status.label(), 14),
            p.location.address
        );
    }

    let decision = viewport::decide(&query, &results, &ctx.map_config.camera);
    println!("\n{} result(s). Rule: {:?}", results.len(), decision.rule);
    match decision.camera {
        CameraAction::Keep => println!("Camera: unchanged"),
        CameraAction::FlyTo(f) => println!(
            "Camera: fly to {:.5}, {:.5} at zoom {} over {:.1}s",
            f.target.y(),
            f.target.x(),
            f.zoom,
            f.duration
        ),
        CameraAction::FitBounds(b) => println!(
            "Camera: fit {:.5}, {:.5} .. {:.5}, {:.5} over {:.1}s",
            b.bounds.min().y,
            b.bounds.min().x,
            b.bounds.max().y,
            b.bounds.max().x,
            b.duration
        ),
    }
    println!("Selection: {:?}", decision.selection);
}

fn print_stats(state: &AppState) {
    let catalog = &state.catalog;
    let stats = catalog.stats();
    println!("Products:      {}", stats.total_products);
    println!("Area:          {:.1} ha", stats.total_area);
    println!("Approved:      {}", stats.approved);
    println!("Pending:       {}", stats.pending);
    println!("Yield:         {:.0} t", stats.total_yield);
    println!("Certificates:  {}", stats.total_certificates);

    println!("\nBy category:");
    let cat_w = catalog.category_breakdown().iter().map(|s| s.category.width()).max().unwrap_or(0);
    for share in catalog.category_breakdown() {
        println!("  {}  {:>3}  {:>8.1} ha", pad(&share.category, cat_w), share.count, share.area);
    }

    println!("\nCertificate register (as of {}):", state.today);
    let rows = catalog.certificate_register(state.today);
    let farm_w = rows.iter().map(|r| r.farm_name.width()).max().unwrap_or(0);
    for row in rows {
        println!(
            "  {}  {}  {:<9}  {}{}",
            pad(&row.farm_name, farm_w),
            row.region_code,
            row.cert_type.label(),
            row.expiry_date,
            if row.expired { "  EXPIRED" } else { "" }
        );
    }
}

fn print_about() {
    println!("{} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    println!("Git: {}", env!("APP_GIT_HASH"));
    let deps = fs::read_to_string(env!("DEPS_INFO_PATH"))
        .ok()
        .and_then(|s| serde_json::from_str::<Vec<serde_json::Value>>(&s).ok());
    match deps {
        Some(d) => println!("Dependencies: {}", d.len()),
        None => println!("Dependencies: unknown"),
    }
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    let directive = if args.verbose { "pucmap=debug" } else { "pucmap=info" };
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_target(false)
        .init();

    if let Some(Command::About) = args.command {
        print_about();
        return Ok(());
    }

    let ctx = AppContext::new()?;
    let catalog = match &args.catalog {
        Some(path) => Catalog::load_json(path)?,
        None => Catalog::seeded(),
    };
    let viewer = ctx.viewer(&args.overrides());
    debug!("Viewer: {:?}", viewer);

    match &args.command {
        Some(Command::List { query, category }) => {
            print_list(&catalog, &viewer, &ctx, query, &CategoryFilter::from_arg(category));
        }
        Some(Command::Stats) => print_stats(&AppState::new(catalog, viewer)),
        Some(Command::About) => {}
        Some(Command::Gui) | None => {
            info!("Launching GUI with {} products", catalog.products().len());
            let app = gui::GuiApp::new(ctx, AppState::new(catalog, viewer));
            if let Err(e) = app.run() {
                eprintln!("GUI Error: {}", e);
            }
        }
    }
    Ok(())
}
