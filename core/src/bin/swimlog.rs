use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use swimlog_core::api::{CoachReader, ExportSource, HttpSwimApi, SessionReader};
use swimlog_core::auth::AuthContext;
use swimlog_core::authoring::{SessionDraft, SubmitError};
use swimlog_core::cli;
use swimlog_core::config::{load_config, ClientConfig};
use swimlog_core::export::{csv_row_count, session_csv_file_name, write_export, RangeExport};
use swimlog_core::filter::{SessionFilter, SortDir, SortKey};
use swimlog_core::models::{Role, SignupRequest};
use swimlog_core::storage::load_json;
use swimlog_core::views::{
    coach_overview, load_session_detail, swimmer_sessions, Dashboard, SessionDetailView,
};

#[derive(Parser)]
#[command(name = "swimlog")]
#[command(about = "Swim-training log: sessions, analytics, coach overview and CSV export", long_about = None)]
#[command(version)]
struct Cli {
    /// JSON-konfig; standard er `<config_dir>/swimlog/config.json`.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Skriv Prometheus-tellere til stdout etter kommandoen.
    #[arg(long, global = true)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct ListArgs {
    #[arg(long)]
    limit: Option<u32>,

    /// Fritekst i notater.
    #[arg(long)]
    query: Option<String>,

    #[arg(long)]
    from: Option<NaiveDate>,

    #[arg(long)]
    to: Option<NaiveDate>,

    #[arg(long, value_parser = ["date", "distance", "pace", "rpe"], default_value = "date")]
    sort: String,

    #[arg(long)]
    asc: bool,
}

#[derive(Subcommand)]
enum Commands {
    Login {
        /// Brukernavn eller e-post.
        identifier: String,

        /// Leses fra `SWIMLOG_PASSWORD` eller stdin hvis den utelates.
        #[arg(long)]
        password: Option<String>,
    },

    Logout,

    Signup {
        #[arg(long)]
        email: String,

        #[arg(long)]
        username: Option<String>,

        #[arg(long)]
        password: Option<String>,

        #[arg(long, value_parser = ["swimmer", "coach"], default_value = "swimmer")]
        role: String,

        #[arg(long)]
        invite_code: String,
    },

    /// Egne økter med pace, RPE og stroke mix.
    Sessions(ListArgs),

    Session {
        id: String,
    },

    /// Trenerens oversikt over alle svømmere.
    Coach,

    CoachSessions {
        swimmer: String,

        #[command(flatten)]
        list: ListArgs,
    },

    CoachSession {
        swimmer: String,
        session: String,
    },

    /// Ny økt fra et JSON-utkast.
    NewSession {
        #[arg(long)]
        file: PathBuf,

        #[arg(long)]
        date: Option<NaiveDate>,
    },

    Export {
        #[command(subcommand)]
        target: ExportTarget,
    },
}

#[derive(Subcommand)]
enum ExportTarget {
    Session {
        id: String,

        #[arg(long, default_value = ".")]
        out: PathBuf,
    },

    Range {
        #[arg(long)]
        start: Option<NaiveDate>,

        #[arg(long)]
        end: Option<NaiveDate>,

        /// Kun for trenere.
        #[arg(long)]
        swimmer: Option<String>,

        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

impl ListArgs {
    fn filter(&self) -> SessionFilter {
        SessionFilter { query: self.query.clone(), from: self.from, to: self.to }
    }

    fn sort(&self) -> (SortKey, SortDir) {
        let key = match self.sort.as_str() {
            "distance" => SortKey::TotalDistance,
            "pace" => SortKey::AvgPace,
            "rpe" => SortKey::AvgRpe,
            _ => SortKey::Date,
        };
        (key, if self.asc { SortDir::Asc } else { SortDir::Desc })
    }

    fn apply_limit(&self, cfg: &mut ClientConfig) {
        if let Some(limit) = self.limit {
            cfg.session_limit = limit;
            cfg.coach_session_limit = limit;
        }
    }
}

fn read_password(arg: Option<String>) -> Result<String> {
    if let Some(p) = arg.or_else(|| std::env::var("SWIMLOG_PASSWORD").ok()) {
        return Ok(p);
    }
    eprint!("password: ");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line).context("reading password from stdin")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("empty password");
    }
    Ok(password)
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn main() -> Result<()> {
    init_logging();
    let args = Cli::parse();

    let mut cfg = load_config(args.config.as_deref())
        .context("loading config")?
        .with_base_url_override(args.base_url.clone());
    let auth = Arc::new(AuthContext::persistent(cfg.credentials_path()).context("loading credentials")?);
    log::debug!("base_url={} credentials={}", cfg.base_url, cfg.credentials_path().display());

    if let Commands::Sessions(list) | Commands::CoachSessions { list, .. } = &args.command {
        list.apply_limit(&mut cfg);
    }
    let api = HttpSwimApi::new(&cfg, Arc::clone(&auth));

    run(args.command, &api, &auth, &cfg)?;

    if args.metrics {
        cli::print_metrics();
    }
    Ok(())
}

fn run(command: Commands, api: &HttpSwimApi, auth: &AuthContext, cfg: &ClientConfig) -> Result<()> {
    match command {
        Commands::Login { identifier, password } => {
            let password = read_password(password)?;
            let resp = api.login(&identifier, &password)?;
            let role = auth.login_from_response(&resp).context("saving credentials")?;
            println!("Logged in as {identifier} ({role})");
        }

        Commands::Logout => {
            auth.logout().context("removing stored credentials")?;
            println!("Logged out");
        }

        Commands::Signup { email, username, password, role, invite_code } => {
            let req = SignupRequest {
                email,
                username,
                password: read_password(password)?,
                role: Role::from_label(&role),
                invite_code,
            };
            api.signup(&req)?;
            println!("Account created; run `swimlog login` to continue");
        }

        Commands::Sessions(list) => {
            auth.require(None)?;
            let (key, dir) = list.sort();
            let view = Dashboard::new()
                .load(api, cfg, &list.filter(), key, dir)?
                .context("dashboard load was superseded by a newer one")?;
            cli::print_dashboard(&view);
        }

        Commands::Session { id } => {
            auth.require(None)?;
            let view = load_session_detail(api, &id, cfg.pace_per_m)?;
            cli::print_session_detail(&view);
        }

        Commands::Coach => {
            auth.require(Some(Role::Coach))?;
            let today = Local::now().date_naive();
            let rows = coach_overview(api, cfg, today)?;
            cli::print_coach_overview(&rows);
        }

        Commands::CoachSessions { swimmer, list } => {
            auth.require(Some(Role::Coach))?;
            let (key, dir) = list.sort();
            let view = swimmer_sessions(api, cfg, &swimmer, &list.filter(), key, dir)?;
            cli::print_sessions_view(&view);
        }

        Commands::CoachSession { swimmer, session } => {
            auth.require(Some(Role::Coach))?;
            let detail = api.get_swimmer_session(&swimmer, &session)?;
            cli::print_session_detail(&SessionDetailView::from_parts(&detail, None));
        }

        Commands::NewSession { file, date } => {
            auth.require(None)?;
            let mut draft: SessionDraft = load_json(&file)?
                .with_context(|| format!("draft file {} not found", file.display()))?;
            if date.is_some() {
                draft.date = date;
            }
            draft.fill_missing();

            match draft.submit(api) {
                Ok(outcome) => println!("Created session {} with {} sets", outcome.session_id, outcome.sets_added),
                Err(SubmitError::AddSet { index, session_id, persisted, source }) => {
                    eprintln!("Session {session_id} was created with {persisted} set(s); set {} failed", index + 1);
                    return Err(source.into());
                }
                Err(e) => return Err(e.into()),
            }
        }

        Commands::Export { target } => {
            auth.require(None)?;
            export(target, api, auth)?;
        }
    }
    Ok(())
}

fn export(target: ExportTarget, api: &HttpSwimApi, auth: &AuthContext) -> Result<()> {
    let (bytes, out, name) = match target {
        ExportTarget::Session { id, out } => {
            // Datoen trengs bare til filnavnet.
            let date = match api.get_session(&id) {
                Ok(s) => s.date,
                Err(e) => {
                    log::warn!("fant ikke dato for økt {id}: {e}");
                    None
                }
            };
            (api.export_session_csv(&id)?, out, session_csv_file_name(&id, date))
        }
        ExportTarget::Range { start, end, swimmer, out } => {
            if swimmer.is_some() && auth.role() != Some(Role::Coach) {
                log::warn!("--swimmer ignoreres for andre enn trenere");
            }
            let range = RangeExport { start, end, swimmer_id: swimmer };
            (api.export_range_csv(&range)?, out, range.file_name())
        }
    };

    let rows = csv_row_count(&bytes).context("export is not valid CSV")?;
    let path = write_export(&bytes, &out, &name)?;
    println!("Wrote {} ({rows} rows)", path.display());
    Ok(())
}
