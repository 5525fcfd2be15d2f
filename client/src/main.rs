use std::{
    io::{stderr, IsTerminal},
    path::PathBuf,
    time::Duration,
};

use anyhow::{bail, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use jobsite_client::{
    compress::{CompressorConfig, ImageCompressor},
    form::FormFields,
    orchestrator::{Orchestrator, PhotoTransport, Progress, SubmissionPhase},
    remote::{HttpEndpoint, RemoteEndpoint},
    session::FormSession,
};
use kdam::{
    term::{self, Colorizer},
    tqdm, BarExt, Column, RichProgress, Spinner,
};
use tokio::{select, spawn, sync::watch};
use tokio_util::sync::CancellationToken;
use url::Url;

const USER_AGENT: &str = concat!("jobsite-client/", env!("CARGO_PKG_VERSION"));

/// Where phase changes go: the spinner task on a terminal, plain stderr
/// lines otherwise. The final phase is printed by the caller once the
/// spinner is gone.
enum StatusLine {
    Bar(watch::Sender<String>),
    Plain,
}

/// The stderr line for `phase` when not on a terminal.
fn plain_line(phase: &SubmissionPhase) -> Option<String> {
    (!phase.is_terminal()).then(|| phase.to_string())
}

impl Progress for StatusLine {
    fn phase(&self, phase: &SubmissionPhase) {
        match self {
            Self::Bar(sender) => {
                let _ = sender.send(phase.to_string());
            }
            Self::Plain => {
                if let Some(line) = plain_line(phase) {
                    eprintln!("{line}");
                }
            }
        }
    }
}

async fn refresh_bar(
    mut bar: RichProgress,
    token: CancellationToken,
    status: watch::Receiver<String>,
) -> RichProgress {
    let mut timer = tokio::time::interval(Duration::from_millis(100));
    timer.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        select! {
            _ = timer.tick() => {
                let s = status.borrow().clone();
                bar.columns.truncate(2);
                bar.columns.push(Column::Text(s.colorize("green")));
                let _ = bar.refresh();
            }
            _ = token.cancelled() => {
                return bar;
            }
        }
    }
}

fn status_bar() -> RichProgress {
    RichProgress::new(
        tqdm!(),
        vec![
            Column::Spinner(Spinner::new(
                &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"],
                80.0,
                1.0,
            )),
            Column::Text("[bold blue]jobsite".to_owned()),
        ],
    )
}

async fn list_reference(endpoint: &HttpEndpoint) -> Result<()> {
    eprintln!("Loading job sites and crew members...");
    let data = endpoint.reference_data().await?;
    println!("Job sites:");
    for site in &data.job_sites {
        println!("  {}\t{}", site.id, site);
    }
    println!("Crew members:");
    for member in &data.crew_members {
        println!("  {}\t{}", member.id, member);
    }
    Ok(())
}

async fn submit_report(endpoint: &HttpEndpoint, args: SubmitArgs, tty: bool) -> Result<()> {
    let compressor = ImageCompressor::new(CompressorConfig {
        max_width: args.max_width,
        quality: args.quality,
    });
    let mut session = FormSession::new(compressor, USER_AGENT);
    session.fields = FormFields {
        job_id: args.job_id.unwrap_or_default(),
        crew_member_id: args.crew_member_id.unwrap_or_default(),
        trade_task_type: args.trade.unwrap_or_default(),
        work_performed: args.work.unwrap_or_default(),
        location_on_site: args.location.unwrap_or_default(),
        status: args.status.unwrap_or_default(),
        issues_concerns: args.issues.unwrap_or_default(),
        materials_used: args.materials_used.unwrap_or_default(),
        materials_needed: args.materials_needed.unwrap_or_default(),
        weather_conditions: args.weather.unwrap_or_default(),
    };
    if let Err(e) = session.fields.validate() {
        bail!(e);
    }

    if !args.photos.is_empty() {
        eprintln!("Compressing {} photo(s)...", args.photos.len());
        session.select_photos(&args.photos).await?;
        eprintln!(
            "{} (~{} KiB)",
            session.photos().summary(),
            session.photos().total_size() / 1024
        );
    }

    let orchestrator = Orchestrator::new(endpoint, args.transport);
    let result = if tty {
        let token = CancellationToken::new();
        let (sender, receiver) = watch::channel("Submitting...".to_string());
        let f = spawn(refresh_bar(status_bar(), token.clone(), receiver));
        let result = session.submit(&orchestrator, &StatusLine::Bar(sender)).await;
        token.cancel();
        f.await?.clear()?;
        result
    } else {
        session.submit(&orchestrator, &StatusLine::Plain).await
    };

    match result {
        Ok(receipt) => {
            eprintln!(
                "{}",
                SubmissionPhase::Succeeded {
                    photos_recorded: receipt.recorded_photo_count
                }
            );
            println!("{}\t{}", receipt.submission_id, receipt.timestamp);
            Ok(())
        }
        Err(e) => {
            eprintln!(
                "{}",
                SubmissionPhase::Failed {
                    message: e.to_string()
                }
            );
            bail!(e)
        }
    }
}

#[derive(ClapArgs, Debug, Clone)]
struct SubmitArgs {
    #[arg(long)]
    pub job_id: Option<String>,

    #[arg(long)]
    pub crew_member_id: Option<String>,

    /// Trade or task type
    #[arg(long)]
    pub trade: Option<String>,

    /// Work performed
    #[arg(long)]
    pub work: Option<String>,

    /// Location on site
    #[arg(long)]
    pub location: Option<String>,

    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub issues: Option<String>,

    /// One item per line, or comma separated
    #[arg(long)]
    pub materials_used: Option<String>,

    #[arg(long)]
    pub materials_needed: Option<String>,

    #[arg(long)]
    pub weather: Option<String>,

    /// Photo to attach, repeat for more (at most 10)
    #[arg(long = "photo")]
    pub photos: Vec<PathBuf>,

    #[arg(long, value_enum, default_value_t)]
    pub transport: PhotoTransport,

    /// Photos wider than this are scaled down
    #[arg(long, default_value_t = 800)]
    pub max_width: u32,

    /// JPEG quality, 0.0 to 1.0
    #[arg(long, default_value_t = 0.6)]
    pub quality: f32,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// List job sites and crew members
    Reference,
    /// Submit a field report
    Submit(SubmitArgs),
}

#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "JOBSITE_ENDPOINT")]
    pub endpoint: Url,

    #[command(subcommand)]
    pub command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let is_tty = stderr().is_terminal();
    term::init(is_tty);
    let args = Args::parse();

    let endpoint = HttpEndpoint::new(args.endpoint, USER_AGENT)?;
    match args.command {
        Command::Reference => list_reference(&endpoint).await,
        Command::Submit(submit) => submit_report(&endpoint, submit, is_tty).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_lines_skip_the_final_phase() {
        let phases = [
            SubmissionPhase::UploadingPhoto { index: 0, total: 2 },
            SubmissionPhase::UploadingPhoto { index: 1, total: 2 },
            SubmissionPhase::SubmittingMetadata,
            SubmissionPhase::Succeeded { photos_recorded: 2 },
        ];
        let lines: Vec<_> = phases.iter().filter_map(plain_line).collect();
        assert_eq!(
            lines,
            [
                "Uploading photo 1 of 2...",
                "Uploading photo 2 of 2...",
                "Saving form data..."
            ]
        );
        assert_eq!(
            plain_line(&SubmissionPhase::Failed {
                message: "offline".to_string()
            }),
            None
        );
    }
}
