use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geocompute::io::{self, GeoData, ReadOptions, WriteOptions};
use geocompute::reproject::{locate_zone, reproject_collection, reproject_raster};
use geocompute::driver::Capabilities;
use geocompute::{zone, CrsSpec, DataKind, DriverRegistry, GeoPoint, ZoneCode};
use rayon::ThreadPoolBuilder;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Parallel worker threads (default: number of CPU cores)
    #[arg(short, long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the UTM zone EPSG code for a longitude/latitude
    #[command(allow_negative_numbers = true)]
    Zone {
        lon: f64,
        lat: f64,

        /// Also print the zone number, hemisphere and PROJ string
        #[arg(short, long)]
        verbose: bool,
    },

    /// Resolve UTM zones for a file of "lon,lat" lines
    Zones {
        #[arg(value_name = "FILE")]
        input: PathBuf,
    },

    /// List the available GDAL drivers
    Drivers {
        #[arg(long, conflicts_with = "raster")]
        vector: bool,

        #[arg(long)]
        raster: bool,
    },

    /// Summarise a vector or raster dataset
    Info {
        #[arg(value_name = "PATH")]
        input: PathBuf,

        /// Vector layer to read (default: first layer)
        #[arg(long)]
        layer: Option<String>,
    },

    /// Reproject a dataset and write the result
    Reproject {
        #[arg(value_name = "INPUT")]
        input: PathBuf,

        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,

        /// Target CRS: EPSG code, "EPSG:NNNN", PROJ string, WKT, or "utm"
        #[arg(long, default_value = "utm")]
        crs: String,

        /// Output driver short name (default: chosen from the extension)
        #[arg(long)]
        driver: Option<String>,

        /// Vector layer to read (default: first layer)
        #[arg(long)]
        layer: Option<String>,

        #[arg(long)]
        overwrite: bool,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    let start_time = std::time::Instant::now();

    // Configure thread pool
    if let Some(threads) = args.threads {
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to build thread pool")?;
    }

    // Dispatch subcommand
    match &args.command {
        Command::Zone { lon, lat, verbose } => run_zone(*lon, *lat, *verbose)?,
        Command::Zones { input } => run_zones(input)?,
        Command::Drivers { vector, raster } => run_drivers(*vector, *raster),
        Command::Info { input, layer } => run_info(input, layer.clone())?,
        Command::Reproject {
            input,
            output,
            crs,
            driver,
            layer,
            overwrite,
        } => {
            // Parse target CRS before touching the input
            let target: CrsSpec = crs.parse()?;
            let read_options = ReadOptions {
                layer: layer.clone(),
            };
            let write_options = WriteOptions {
                driver: driver.clone(),
                overwrite: *overwrite,
            };
            run_reproject(input, output, &target, &read_options, &write_options)?;
        }
    }

    info!("Total processing time: {:?}", start_time.elapsed());
    Ok(())
}

fn run_zone(lon: f64, lat: f64, verbose: bool) -> Result<()> {
    let code = zone::resolve_lon_lat(lon, lat)?;
    println!("{}", code);
    if verbose {
        println!("{}", code.description());
        println!("{}", code.proj_string());
    }
    Ok(())
}

fn run_zones(input: &Path) -> Result<()> {
    let content =
        fs::read_to_string(input).with_context(|| format!("Failed to read {:?}", input))?;

    let (resolved, failures) = resolve_lines(&content);
    for (point, code) in &resolved {
        println!("{},{}", point, code.epsg());
    }

    if failures > 0 {
        anyhow::bail!("{} points failed to resolve", failures);
    }
    Ok(())
}

/// Resolves every "lon,lat" line of `content`, skipping blank and `#` lines.
///
/// Returns the resolved points in input order and the number of lines that
/// failed to parse or resolve.
fn resolve_lines(content: &str) -> (Vec<(GeoPoint, ZoneCode)>, usize) {
    // Parse points
    let mut failures = 0;
    let mut points = Vec::new();
    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match line.parse::<GeoPoint>() {
            Ok(p) => points.push(p),
            Err(e) => {
                error!("line {}: {}", line_no + 1, e);
                failures += 1;
            }
        }
    }
    info!("Resolving {} points", points.len());

    // Resolve in parallel, collecting errors
    let mut resolved = Vec::with_capacity(points.len());
    for (point, result) in points.iter().zip(zone::resolve_all(&points)) {
        match result {
            Ok(code) => resolved.push((*point, code)),
            Err(e) => {
                error!("{}: {}", point, e);
                failures += 1;
            }
        }
    }
    (resolved, failures)
}

fn run_drivers(vector: bool, raster: bool) {
    let registry = DriverRegistry::from_gdal();
    let drivers: Vec<_> = match (vector, raster) {
        (true, _) => registry.filter(DataKind::Vector).collect(),
        (_, true) => registry.filter(DataKind::Raster).collect(),
        _ => registry.drivers().iter().collect(),
    };

    for d in drivers {
        println!(
            "{:<20} {} {:<24} {}",
            d.short_name,
            capability_flags(&d.capabilities),
            d.extensions.join(","),
            d.long_name
        );
    }
}

/// `rvws` flags: raster, vector, write, virtual I/O (`/vsi*` paths).
fn capability_flags(caps: &Capabilities) -> String {
    [
        (caps.raster, 'r'),
        (caps.vector, 'v'),
        (caps.create, 'w'),
        (caps.virtual_io, 's'),
    ]
    .iter()
    .map(|&(set, flag)| if set { flag } else { '-' })
    .collect()
}

fn run_info(input: &Path, layer: Option<String>) -> Result<()> {
    let data = io::read(input, &ReadOptions { layer })
        .with_context(|| format!("Failed to read {:?}", input))?;
    let driver = data.driver().unwrap_or("unknown");

    let extent = match &data {
        GeoData::Vector(c) => {
            println!("Vector layer '{}'", c.name);
            println!("  Driver: {}", driver);
            println!("  Features: {}", c.len());
            let names: Vec<&str> = c.fields.iter().map(|(n, _)| n.as_str()).collect();
            println!("  Fields: {}", names.join(", "));
            c.extent()
        }
        GeoData::Raster(r) => {
            println!("Raster {} x {}, {} bands", r.width, r.height, r.bands.len());
            println!("  Driver: {}", driver);
            if let Some(nodata) = r.nodata {
                println!("  NoData: {}", nodata);
            }
            Some(r.bounds())
        }
    };

    if let Some(e) = extent {
        println!("  Extent: {}, {}, {}, {}", e[0], e[1], e[2], e[3]);
    }

    match (data.crs_wkt(), extent) {
        (None, _) => println!("  CRS: none"),
        (Some(wkt), Some(e)) => {
            println!("  CRS: {}", wkt);
            match locate_zone(e, Some(wkt)) {
                Ok(code) => println!("  Local UTM: {}", code.description()),
                Err(err) => warn!("Could not locate a UTM zone: {}", err),
            }
        }
        (Some(wkt), None) => println!("  CRS: {}", wkt),
    }
    Ok(())
}

fn run_reproject(
    input: &Path,
    output: &Path,
    target: &CrsSpec,
    read_options: &ReadOptions,
    write_options: &WriteOptions,
) -> Result<()> {
    info!("Reprojecting {:?} to {}", input, target);

    let data =
        io::read(input, read_options).with_context(|| format!("Failed to read {:?}", input))?;

    let projected = match &data {
        GeoData::Vector(c) => GeoData::Vector(reproject_collection(c, target)?),
        GeoData::Raster(r) => GeoData::Raster(reproject_raster(r, target)?),
    };

    io::write(&projected, output, write_options)
        .with_context(|| format!("Failed to write {:?}", output))?;
    info!("Written: {:?}", output);
    Ok(())
}
