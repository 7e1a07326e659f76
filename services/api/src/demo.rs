use crate::infra::{seed_actors, Admissions, Backends, Moderation};
use alumni_hub::access::{Actor, Role, UserId};
use alumni_hub::clock::FixedClock;
use alumni_hub::config::ModerationConfig;
use alumni_hub::error::AppError;
use alumni_hub::workflows::error::WorkflowError;
use alumni_hub::workflows::mentorship::{Application, NewProgram};
use alumni_hub::workflows::moderation::{EntityKind, ModerationStatus, QueryFilters};
use chrono::{DateTime, Duration, Utc};
use clap::Args;
use serde_json::json;
use std::sync::{Arc, Barrier};

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Seats offered by the demo mentorship program.
    #[arg(long, default_value_t = 2)]
    pub(crate) capacity: u32,
    /// Applicants racing for those seats; each admission runs on its own thread.
    #[arg(long, default_value_t = 3)]
    pub(crate) applicants: usize,
    /// Evaluate deadlines as of this date (YYYY-MM-DD). Defaults to now.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) today: Option<DateTime<Utc>>,
    /// Skip the content moderation portion of the demo.
    #[arg(long)]
    pub(crate) skip_moderation: bool,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        capacity,
        applicants,
        today,
        skip_moderation,
    } = args;

    let now = today.unwrap_or_else(Utc::now);
    let mut actors = seed_actors();
    actors.extend(
        (0..applicants).map(|index| Actor::new(format!("applicant-{index}"), Role::Member, Some("lagos"))),
    );
    let backends = Backends::in_memory(actors);
    let (moderation, admissions) =
        backends.services(&ModerationConfig::default(), Arc::new(FixedClock(now)));

    println!("Alumni hub demo (evaluated {})", now.format("%Y-%m-%d"));

    if !skip_moderation {
        moderation_walkthrough(&moderation)?;
    }
    admission_race(&admissions, capacity, applicants, now)?;

    println!("\nNotification outbox (commit order)");
    let intents = backends.outbox.drain();
    if intents.is_empty() {
        println!("- none recorded");
    }
    for intent in intents {
        let recipients: Vec<_> = intent.recipients.iter().map(UserId::to_string).collect();
        println!(
            "- #{} {} {} -> {} (to {})",
            intent.sequence,
            intent.template,
            intent.subject_label(),
            intent.new_status,
            recipients.join(", ")
        );
    }
    println!("Last commit sequence: {}", backends.sequence.last());

    Ok(())
}

fn moderation_walkthrough(moderation: &Moderation) -> Result<(), AppError> {
    println!("\nContent moderation");
    let submitter = UserId::new("chidi");
    let guide = moderation.submit(
        EntityKind::Resource,
        &submitter,
        None,
        json!({
            "title": "Negotiating your first offer",
            "author": "Chidi",
            "category": "careers",
            "type": "guide",
        }),
    )?;
    println!("- {} submitted {} -> {}", submitter, guide.kind, guide.status);

    match moderation.transition(
        EntityKind::Resource,
        &guide.id,
        &UserId::new("nairobi-admin"),
        ModerationStatus::Approved,
    ) {
        Err(err) => println!("  nairobi-admin approve: refused ({})", err.code()),
        Ok(_) => println!("  nairobi-admin approve: unexpectedly allowed"),
    }

    let approved = moderation.transition(
        EntityKind::Resource,
        &guide.id,
        &UserId::new("lagos-admin"),
        ModerationStatus::Approved,
    )?;
    match serde_json::to_string_pretty(&approved.status_view()) {
        Ok(json) => println!("  lagos-admin approve:\n{}", json),
        Err(err) => println!("  status payload unavailable: {}", err),
    }

    let visible = moderation.query(
        EntityKind::Resource,
        &UserId::new("wanjiru"),
        &QueryFilters::status(ModerationStatus::Approved),
    )?;
    println!(
        "  approved resources visible to a nairobi member: {}",
        visible.len()
    );

    Ok(())
}

fn admission_race(
    admissions: &Admissions,
    capacity: u32,
    applicants: usize,
    now: DateTime<Utc>,
) -> Result<(), AppError> {
    println!("\nMentorship admission ({capacity} seats, {applicants} concurrent admits)");
    let mentor = UserId::new("amara");
    let program = admissions.create_program(
        &mentor,
        NewProgram {
            title: "Fintech careers".to_string(),
            max_participants: capacity,
            application_deadline: Some(now + Duration::days(14)),
            chapter_scope: None,
            mentor_id: None,
        },
    )?;

    let applications = (0..applicants)
        .map(|index| {
            admissions.submit_application(&program.id, &UserId::new(format!("applicant-{index}")))
        })
        .collect::<Result<Vec<Application>, WorkflowError>>()?;

    let barrier = Barrier::new(applications.len().max(1));
    let outcomes: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = applications
            .iter()
            .map(|application| {
                let barrier = &barrier;
                let mentor = &mentor;
                scope.spawn(move || {
                    barrier.wait();
                    (
                        application.applicant_id.clone(),
                        admissions.admit(&application.id, mentor),
                    )
                })
            })
            .collect();
        handles
            .into_iter()
            .filter_map(|handle| handle.join().ok())
            .collect()
    });

    for (applicant, outcome) in &outcomes {
        match outcome {
            Ok(application) => println!("- {applicant}: {}", application.status),
            Err(err) => println!("- {applicant}: refused ({})", err.code()),
        }
    }

    let view = admissions.program(&program.id)?.view(now);
    println!(
        "Program {}: {}/{} seats taken, {} available, accepting applications: {}",
        view.title,
        view.current_participants,
        view.max_participants,
        view.available_slots,
        view.accepting_applications
    );

    Ok(())
}
