use std::{path::PathBuf, process::ExitCode, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use client_core::{
    AssessmentView, ControllerEvent, FormField, FormState, HttpPredictionTransport,
    PredictionController,
};
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Parser, Debug)]
#[command(name = "assess", about = "Patient readmission risk assessment")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Submit patient attributes and print the predicted risk.
    Predict(PredictArgs),
    /// Ask the prediction service whether it is up.
    Health(ConnectionArgs),
}

#[derive(Args, Debug)]
struct ConnectionArgs {
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct PredictArgs {
    #[command(flatten)]
    connection: ConnectionArgs,
    #[arg(long)]
    age: Option<String>,
    #[arg(long)]
    gender: Option<String>,
    #[arg(long)]
    blood_type: Option<String>,
    #[arg(long)]
    medical_condition: Option<String>,
    #[arg(long)]
    days_hospitalized: Option<String>,
}

impl PredictArgs {
    fn edits(&self) -> [(FormField, Option<&str>); 5] {
        [
            (FormField::Age, self.age.as_deref()),
            (FormField::Gender, self.gender.as_deref()),
            (FormField::BloodType, self.blood_type.as_deref()),
            (FormField::MedicalCondition, self.medical_condition.as_deref()),
            (FormField::DaysHospitalized, self.days_hospitalized.as_deref()),
        ]
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    match cli.command {
        Command::Predict(args) => run_predict(args).await,
        Command::Health(args) => run_health(args).await,
    }
}

fn build_controller(connection: &ConnectionArgs) -> Result<Arc<PredictionController>> {
    let settings = config::load_settings(connection.config.as_deref())?
        .with_predict_url(connection.server_url.clone())?;
    let transport = HttpPredictionTransport::with_timeout(
        settings.predict_url.clone(),
        settings.request_timeout,
    )
    .context("failed to build prediction transport")?;
    tracing::debug!(predict_url = %settings.predict_url, "prediction transport ready");
    Ok(PredictionController::new_with_transport(Arc::new(transport)))
}

async fn run_predict(args: PredictArgs) -> Result<ExitCode> {
    let controller = build_controller(&args.connection)?;

    let mut form = FormState::new();
    for (field, raw) in args.edits() {
        if let Some(raw) = raw {
            form.update_field(field, raw)
                .with_context(|| format!("invalid value for {field}"))?;
        }
    }

    let mut events = controller.subscribe_events();
    controller.submit(form.snapshot()).await;
    while let Ok(event) = events.try_recv() {
        if let ControllerEvent::FailureNotice(notice) = event {
            eprintln!("{notice}");
        }
    }

    let view = controller.view(form.snapshot()).await;
    print!("{}", render_view(&view));
    if view.outcome.failure().is_some() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_health(args: ConnectionArgs) -> Result<ExitCode> {
    let controller = build_controller(&args)?;
    match controller.check_health().await {
        Ok(status) => {
            println!("Prediction service: {status}");
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            eprintln!("Prediction service unreachable: {err}");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn render_view(view: &AssessmentView) -> String {
    let form = &view.form;
    let mut out = format!(
        "Patient Readmission Risk Assessment\n\
         Age: {} | Gender: {} | Blood Type: {} | Medical Condition: {} | Days Hospitalized: {}\n",
        form.age, form.gender, form.blood_type, form.medical_condition, form.days_hospitalized
    );

    if view.in_flight {
        out.push_str(view.submit_label());
        out.push('\n');
        return out;
    }

    if let (Some(level), Some(percent), Some(series)) = (
        view.risk_level(),
        view.probability_percent(),
        view.proportion_series(),
    ) {
        out.push_str("\nResults\n");
        out.push_str(&format!("Readmission Risk: {}\n", level.as_str()));
        out.push_str(&format!("Probability: {percent}\n"));
        for (label, value) in series.labels.iter().zip(series.values) {
            out.push_str(&format!("  {label:<10} {value:.4}\n"));
        }
    }
    out
}
