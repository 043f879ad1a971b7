use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use ine_rs::api::DEFAULT_BASE_URL;
use ine_rs::flatten::{FlattenConfig, flatten};
use ine_rs::models::{ClassificationFilter, DataQuery, Tip};
use ine_rs::{ApiError, Client};
use ine_rs::{report, stats, storage};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "ine",
    version,
    about = "CLI para consultar la API del INE (Instituto Nacional de Estadística)",
    after_help = "Ejemplos:
  ine operaciones              Lista todas las operaciones
  ine operaciones -b \"IPC\"     Busca operaciones que contengan \"IPC\"
  ine tablas 25                Muestra tablas de la operación 25
  ine datos 76092              Descarga la tabla 76092
  ine datos 76092 -o ipc.csv   Descarga y exporta a CSV"
)]
struct Cli {
    /// Base URL of the INE JSON API.
    #[arg(long, global = true, env = "INE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    base_url: String,
    /// Debug logging to stderr (RUST_LOG takes precedence).
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Lista operaciones disponibles.
    Operaciones(OperacionesArgs),
    /// Lista tablas de una operación.
    Tablas(TablasArgs),
    /// Descarga datos de una tabla.
    Datos(DatosArgs),
}

#[derive(Args, Debug)]
struct OperacionesArgs {
    /// Filtrar por texto en el nombre (sin distinguir mayúsculas).
    #[arg(short, long)]
    buscar: Option<String>,
}

#[derive(Args, Debug)]
struct TablasArgs {
    /// Id de la operación.
    id_operacion: u64,
}

#[derive(ValueEnum, Clone, Debug)]
enum OutFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
struct DatosArgs {
    /// Id de la tabla.
    id_tabla: u64,
    /// Exportar a fichero: CSV salvo --formato json o extensión .json.
    #[arg(short, long)]
    output: Option<PathBuf>,
    /// Solo los últimos N periodos.
    #[arg(long)]
    nult: Option<u32>,
    /// Forma de la respuesta: A (amigable), M (metadatos) o AM.
    #[arg(long)]
    tip: Option<Tip>,
    /// Filtro de variable de clasificación VARIABLE:VALOR (repetible).
    #[arg(long = "tv", value_name = "VARIABLE:VALOR")]
    filters: Vec<ClassificationFilter>,
    /// Solo serie, codigo, periodo, anyo y valor.
    #[arg(long, default_value_t = false)]
    compacto: bool,
    /// Formato de exportación (csv o json). Si se omite, se deduce de --output.
    #[arg(long, value_enum)]
    formato: Option<OutFormat>,
    /// Separador de campos CSV.
    #[arg(long, default_value_t = ',')]
    separador: char,
    /// Estadísticas por serie.
    #[arg(long, default_value_t = false)]
    stats: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let client = Client::with_base_url(&cli.base_url);

    let res = match cli.cmd {
        Command::Operaciones(args) => cmd_operaciones(&client, args),
        Command::Tablas(args) => cmd_tablas(&client, args),
        Command::Datos(args) => cmd_datos(&client, args),
    };
    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if e.downcast_ref::<ApiError>().is_some_and(ApiError::is_transport) {
                eprintln!("Error de conexión: {:#}", e);
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}

fn cmd_operaciones(client: &Client, args: OperacionesArgs) -> Result<()> {
    let mut ops = client.operations()?;
    if let Some(needle) = args.buscar.as_deref() {
        let needle = needle.to_lowercase();
        ops.retain(|op| op.name.to_lowercase().contains(&needle));
    }
    if ops.is_empty() {
        println!("No se encontraron operaciones.");
        return Ok(());
    }
    print!("{}", report::render_operations(&ops));
    Ok(())
}

fn cmd_tablas(client: &Client, args: TablasArgs) -> Result<()> {
    let tables = client.tables(args.id_operacion)?;
    if tables.is_empty() {
        println!(
            "No se encontraron tablas para la operación {}.",
            args.id_operacion
        );
        return Ok(());
    }
    print!("{}", report::render_tables(&tables));
    Ok(())
}

fn cmd_datos(client: &Client, args: DatosArgs) -> Result<()> {
    let delimiter = u8::try_from(args.separador)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| anyhow::anyhow!("--separador must be a single ASCII character"))?;

    let query = DataQuery {
        nult: args.nult,
        tip: args.tip,
        filters: args.filters,
    };
    let config = if args.compacto {
        FlattenConfig::compact()
    } else {
        FlattenConfig::full()
    };

    println!("Descargando tabla {}...", args.id_tabla);
    let raw = client.fetch_table_data(args.id_tabla, &query)?;
    let table = flatten(&raw, &config)
        .with_context(|| format!("tabla {}", args.id_tabla))?;

    if table.is_empty() {
        println!("No se obtuvieron datos.");
        return Ok(());
    }

    print!("{}", report::render_summary(&stats::summarize(&table)));

    if args.stats {
        let group = table.first_column(&stats::NAME_COLUMNS);
        let value = table.first_column(&stats::VALUE_COLUMNS);
        match (group, value) {
            (Some(g), Some(v)) => {
                println!("\nEstadísticas por serie:");
                print!("{}", report::render_stats(&stats::grouped_summary(&table, g, v)));
            }
            _ => log::warn!("no series name or value column, skipping statistics"),
        }
    }

    if let Some(path) = args.output.as_ref() {
        let json = match args.formato {
            Some(OutFormat::Json) => true,
            Some(OutFormat::Csv) => false,
            None => path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json")),
        };
        if json {
            storage::save_json(&table, path)?;
        } else {
            storage::save_csv(&table, path, delimiter)?;
        }
        println!("\n✓ Exportado a {} ({} filas)", path.display(), table.len());
    }

    Ok(())
}
