use crate::infra::{
    sample_case, InMemorySimulationStore, InProcessScoringJobs, ScriptedModelClient,
};
use casesim::debrief::{DebriefGenerator, DebriefResult, JobPoller, RadarAxis};
use casesim::error::AppError;
use casesim::simulation::{
    DecisionKind, DecisionSubmission, SimulationId, SimulationService, SubmitOutcome,
};
use clap::Args;
use std::sync::Arc;
use std::time::Duration;

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Simulation identifier to run under (defaults to "demo")
    #[arg(long)]
    pub(crate) simulation_id: Option<String>,
    /// Submit the same justification at every stage to show the low-effort
    /// filter producing minimum scores without a model call
    #[arg(long)]
    pub(crate) repetitive: bool,
}

const DEMO_JUSTIFICATIONS: [&str; 3] = [
    "Acquiring the regional brand buys shelf presence and local trust immediately, and the \
     integration risk is bounded because their product line barely overlaps with ours.",
    "I walked Marisol through the runway math: the acquisition is funded from the revolving \
     facility, repaid from flagship cash flow within five quarters under conservative volume.",
    "A phased rollout lets us validate the coastal supply chain in two cities before the \
     blitz, and the review gate gives the board a natural decision point.",
];

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let case = Arc::new(sample_case());
    let store = Arc::new(InMemorySimulationStore::default());
    let model = Arc::new(ScriptedModelClient::default());
    let generator = DebriefGenerator::new(Arc::clone(&store), Arc::clone(&model));
    let jobs = Arc::new(InProcessScoringJobs::new(generator, Arc::clone(&case)));
    let service = SimulationService::new(
        Arc::clone(&case),
        store,
        jobs,
        JobPoller::new(Duration::from_millis(100), 50),
        Duration::from_millis(500),
    );

    let id = SimulationId(args.simulation_id.unwrap_or_else(|| "demo".to_string()));

    println!("Case simulation demo: {}", case.title);
    println!("{} decision points\n", case.total_stages());

    for point in &case.decision_points {
        let justification = if args.repetitive {
            DEMO_JUSTIFICATIONS[0].to_string()
        } else {
            DEMO_JUSTIFICATIONS[point.index % DEMO_JUSTIFICATIONS.len()].to_string()
        };

        let selected_option = match point.kind {
            DecisionKind::MultipleChoice => point.options.first().map(|option| option.id.clone()),
            DecisionKind::FreeText => None,
        };
        let option_label = selected_option
            .as_deref()
            .and_then(|option| point.option_label(option))
            .unwrap_or("free-text response");

        println!("Stage {}: {}", point.index + 1, point.title);
        println!("  Choice: {option_label}");

        let submission = DecisionSubmission {
            decision_point_id: point.id.clone(),
            selected_option,
            justification,
            transcript: Vec::new(),
            persona_opened: point.persona.is_some(),
        };

        match service.submit_decision(&id, submission) {
            Ok(SubmitOutcome::Advanced { save, .. }) => {
                println!("  Accepted (save {save:?})");
            }
            Ok(SubmitOutcome::Completed { save, .. }) => {
                println!("  Accepted; simulation complete (save {save:?})");
            }
            Ok(SubmitOutcome::Rejected { reason }) => {
                println!("  Rejected: {reason}");
                return Ok(());
            }
            Ok(SubmitOutcome::PaywallBlocked { preview }) => {
                println!("  Paywall: {}", preview.message);
                return Ok(());
            }
            Err(err) => {
                println!("  Submission failed: {err}");
                return Ok(());
            }
        }
    }

    let job_id = match service.complete_simulation(&id).await {
        Ok(job_id) => job_id,
        Err(err) => {
            println!("\nScoring submission failed: {err}");
            return Ok(());
        }
    };
    println!("\nScoring job accepted: {}", job_id.0);

    match service.await_result(&job_id).await {
        Ok(debrief) => render_debrief(&debrief),
        Err(err) => println!("Debrief unavailable: {err}"),
    }

    println!("\nReasoning model calls: {}", model.calls());
    Ok(())
}

fn render_debrief(debrief: &DebriefResult) {
    println!("\nCompetency scores");
    for score in &debrief.scores {
        println!(
            "- {}: {:.1}/5 ({})",
            score.name, score.score, score.justification
        );
        if let Some(advice) = &score.advice {
            println!("    advice: {advice}");
        }
    }

    println!("\nRadar");
    for axis in RadarAxis::ALL {
        println!("- {}: {:.1}", axis.label(), debrief.radar.get(axis));
    }

    if !debrief.key_insight.is_empty() {
        println!("\nKey insight: {}", debrief.key_insight);
    }
    if !debrief.summary.is_empty() {
        println!("Summary: {}", debrief.summary);
    }
    if let Some(exemplar) = &debrief.exemplar {
        println!("\nExemplar approach:\n{exemplar}");
    }
    println!(
        "\nGenerated {} by {}",
        debrief.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        debrief.model_id.as_deref().unwrap_or("rules-based fallback")
    );
}
