use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use crate::analysis::orchestrator::{AnalysisResults, SourceMode, SubmitInput};
use crate::models::analysis::{LearningPreference, MatchStatus, SkillGapReport};
use crate::models::resume::{ResumeFile, ResumeId};
use crate::routes::guard::{GuardDecision, GuardState};
use crate::routes::Route;
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "resume-client")]
#[command(about = "Upload resumes and analyze them against a target role")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Keep the session in memory only; nothing is written to disk
    #[arg(long, global = true)]
    pub ephemeral: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create an account (does not sign in)
    Register {
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign in and store the session credential
    Login {
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Drop the stored session credential
    Logout,
    /// Show whether a session is active
    Status,
    /// List uploaded resumes, most recent first
    History,
    /// Run skill-gap analysis and resume optimization for a role
    Analyze {
        #[arg(long)]
        role: String,
        /// Upload this PDF and analyze it
        #[arg(long, conflicts_with = "resume")]
        file: Option<PathBuf>,
        /// Analyze a previously uploaded resume
        #[arg(long)]
        resume: Option<String>,
        #[arg(long, default_value_t = LearningPreference::default())]
        preference: LearningPreference,
        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },
}

pub async fn handle_command(state: &AppState, command: Command) -> Result<()> {
    match command {
        Command::Register { email, password } => {
            let password = resolve_password(password).await?;
            state.auth.register(&email, &password).await?;
            println!("Account created for {email}. Sign in with `login`.");
        }

        Command::Login { email, password } => {
            let password = resolve_password(password).await?;
            state.auth.login(&email, &password).await?;
            println!("Signed in as {email}.");
        }

        Command::Logout => {
            state.auth.logout()?;
            println!("Signed out.");
        }

        Command::Status => match state.guard.state() {
            GuardState::Authenticated => println!("Signed in."),
            GuardState::Unauthenticated => println!("Not signed in."),
        },

        Command::History => {
            enter_dashboard(state)?;
            let snapshot = state
                .orchestrator
                .load_history()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message("Failed to load resume history")))?;

            if snapshot.records.is_empty() {
                println!("No resumes uploaded yet.");
            }
            for record in &snapshot.records {
                println!("{:>8}  {}", record.id.as_str(), record.label());
            }
        }

        Command::Analyze {
            role,
            file,
            resume,
            preference,
            json,
        } => {
            enter_dashboard(state)?;
            let input = build_submission(state, role, file, resume, preference).await?;
            let results = state.orchestrator.submit(input).await?;
            if json {
                print_json(&results)?;
            } else {
                print_results(&results);
            }
        }
    }

    Ok(())
}

/// The dashboard is the only protected view; every data command goes through it.
fn enter_dashboard(state: &AppState) -> Result<()> {
    match state.guard.navigate(Route::Dashboard.path()) {
        GuardDecision::Render(_) => Ok(()),
        GuardDecision::Redirect(route) => {
            bail!("Not signed in. Run `login <email>` first (redirected to {}).", route.path())
        }
    }
}

async fn build_submission(
    state: &AppState,
    role_name: String,
    file: Option<PathBuf>,
    resume: Option<String>,
    learning_preference: LearningPreference,
) -> Result<SubmitInput> {
    if let Some(path) = file {
        let file = ResumeFile::from_path(&path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(SubmitInput {
            source_mode: SourceMode::UploadNew,
            file: Some(file),
            selected_resume_id: None,
            role_name,
            learning_preference,
        });
    }

    // Entering the dashboard refreshes history and preselects the latest upload.
    let snapshot = state
        .orchestrator
        .load_history()
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message("Failed to load resume history")))?;

    if let Some(id) = resume {
        let id = ResumeId::new(id);
        if !state.orchestrator.select_resume(&id) {
            bail!("No uploaded resume with id {id}. See `history`.");
        }
    } else if snapshot.suggested_mode == SourceMode::UploadNew {
        bail!("No resumes uploaded yet. Pass --file <PATH> to upload one.");
    }

    let selected = state.orchestrator.selected_resume_id();
    info!("Analyzing existing resume {selected:?}");
    Ok(SubmitInput {
        source_mode: SourceMode::UseExisting,
        file: None,
        selected_resume_id: selected,
        role_name,
        learning_preference,
    })
}

async fn resolve_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    eprint!("Password: ");
    std::io::stderr().flush().ok();

    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

// ── output ───────────────────────────────────────────────────────────────────

fn print_json(results: &AnalysisResults) -> Result<()> {
    let value = json!({
        "resume_id": results.resume_id,
        "skill_gap": results.skill_gap,
        "optimized_resume_text": results.optimized.text,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn print_results(results: &AnalysisResults) {
    print_report(&results.skill_gap);
    println!();
    println!("== Optimized resume ==");
    println!("{}", results.optimized.text);
}

fn print_report(report: &SkillGapReport) {
    println!("== Skill gap ==");
    println!(
        "Match score: {:.0}%  ({} matched, {} partial, {} missing)",
        report.score,
        report.count(MatchStatus::Matched),
        report.count(MatchStatus::Partial),
        report.count(MatchStatus::Missing)
    );
    println!("{}", report.summary);

    for comparison in &report.comparisons {
        println!();
        println!(
            "[{:?}] {}: {}",
            comparison.match_status, comparison.skill_name, comparison.justification
        );
        if comparison.learning_plan.is_empty() {
            continue;
        }
        println!("  Learning plan (~{:.1}h):", comparison.total_hours());
        for step in &comparison.learning_plan {
            println!("  - {} ({:.1}h): {}", step.title, step.estimated_hours, step.details);
        }
    }
}
