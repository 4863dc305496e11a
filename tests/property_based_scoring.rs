// Property-based tests for progress, classification and aggregation invariants

use compliance_tracker::{
    aggregate_component_score, aggregate_overall_score, classify, compute_progress, score_institution,
    ControlComponent, FrameworkMode, FrameworkResolver, StepStatus, TrafficLight, Workflow, WorkflowEvent,
    WorkflowStatus, WorkflowStep,
};
use proptest::prelude::*;

fn step_status_strategy() -> impl Strategy<Value = StepStatus> {
    prop_oneof![
        Just(StepStatus::NotStarted),
        Just(StepStatus::InProgress),
        Just(StepStatus::Completed),
    ]
}

fn workflow_status_strategy() -> impl Strategy<Value = WorkflowStatus> {
    prop_oneof![
        Just(WorkflowStatus::NotStarted),
        Just(WorkflowStatus::InProgress),
        Just(WorkflowStatus::UnderReview),
        Just(WorkflowStatus::Observed),
        Just(WorkflowStatus::Completed),
    ]
}

// Random event stream against a workflow of `steps` steps
fn event_strategy(steps: u32) -> impl Strategy<Value = WorkflowEvent> {
    prop_oneof![
        4 => (1..=steps, step_status_strategy())
            .prop_map(|(sequence, status)| WorkflowEvent::SetStepStatus { sequence, status }),
        1 => Just(WorkflowEvent::Approve),
        1 => prop::collection::vec(1..=steps, 0..3).prop_map(|reopen| WorkflowEvent::Reject { reopen }),
        1 => Just(WorkflowEvent::FlagObservation { note: "finding".to_string() }),
        1 => Just(WorkflowEvent::AcknowledgeRemediation),
    ]
}

fn build_steps(statuses: &[StepStatus]) -> Vec<WorkflowStep> {
    statuses
        .iter()
        .enumerate()
        .map(|(i, status)| WorkflowStep::new("wf", i as u32 + 1, format!("Step {}", i + 1)).with_status(*status))
        .collect()
}

fn fresh_workflow(id: &str, steps: u32) -> Workflow {
    Workflow::new(id, id, ControlComponent::ControlActivities, "inst-1")
        .unwrap()
        .with_steps((1..=steps).map(|sequence| WorkflowStep::new(id, sequence, "step")).collect())
        .unwrap()
}

proptest! {
    #[test]
    fn prop_progress_matches_rounded_ratio(statuses in prop::collection::vec(step_status_strategy(), 1..40)) {
        let steps = build_steps(&statuses);
        let completed = statuses.iter().filter(|s| **s == StepStatus::Completed).count() as f64;
        let expected = (100.0 * completed / statuses.len() as f64 + 0.5).floor() as u8;

        let progress = compute_progress(&steps);
        prop_assert!(progress <= 100);
        prop_assert_eq!(progress, expected);
    }

    #[test]
    fn prop_completing_a_step_never_lowers_progress(
        statuses in prop::collection::vec(step_status_strategy(), 1..20),
        index in any::<prop::sample::Index>(),
    ) {
        let before = build_steps(&statuses);
        let mut after = before.clone();
        let target = index.index(after.len());
        after[target].status = StepStatus::Completed;

        prop_assert!(compute_progress(&after) >= compute_progress(&before));
    }

    #[test]
    fn prop_classify_is_deterministic(status in workflow_status_strategy(), progress in 0u8..=100) {
        let first = classify(status, progress);
        prop_assert_eq!(first, classify(status, progress));
        if status == WorkflowStatus::Observed {
            prop_assert_eq!(first, TrafficLight::AtRisk);
        }
        if status == WorkflowStatus::Completed {
            prop_assert_eq!(first, TrafficLight::Completed);
        }
    }

    #[test]
    fn prop_event_streams_keep_status_and_progress_consistent(
        steps in 1u32..8,
        events in prop::collection::vec(event_strategy(8), 0..40),
    ) {
        let mut workflow = fresh_workflow("wf", steps);

        for event in events {
            let before = workflow.clone();
            match workflow.handle_event(event) {
                Ok(result) => {
                    prop_assert_eq!(result.status, workflow.status());
                    prop_assert_eq!(result.progress, workflow.progress());
                }
                Err(_) => prop_assert_eq!(&workflow, &before),
            }

            let status = workflow.status();
            let progress = workflow.progress();
            prop_assert!(progress <= 100);
            if status == WorkflowStatus::Completed {
                prop_assert_eq!(progress, 100);
            }
            if progress == 100 {
                prop_assert!(matches!(
                    status,
                    WorkflowStatus::UnderReview | WorkflowStatus::Completed | WorkflowStatus::Observed
                ));
            }
            if before.status() == WorkflowStatus::Completed {
                prop_assert_eq!(status, WorkflowStatus::Completed);
            }
        }

        for pair in workflow.history().windows(2) {
            prop_assert_eq!(pair[0].to, pair[1].from);
        }
        for record in workflow.history() {
            prop_assert!(record.from.can_transition_to(record.to));
        }
    }

    #[test]
    fn prop_aggregate_is_bounded_and_idempotent(
        completions in prop::collection::vec(0u32..=5, 0..12),
    ) {
        let workflows: Vec<Workflow> = completions
            .iter()
            .enumerate()
            .map(|(i, completed)| {
                let id = format!("wf-{i}");
                let mut workflow = fresh_workflow(&id, 5);
                for sequence in 1..=*completed {
                    workflow
                        .handle_event(WorkflowEvent::SetStepStatus { sequence, status: StepStatus::Completed })
                        .unwrap();
                }
                workflow
            })
            .collect();

        let first = aggregate_component_score(ControlComponent::ControlActivities, &workflows);
        let second = aggregate_component_score(ControlComponent::ControlActivities, &workflows);
        prop_assert_eq!(&first, &second);
        prop_assert!(first.score <= 100);

        if let (Some(min), Some(max)) = (
            workflows.iter().map(Workflow::progress).min(),
            workflows.iter().map(Workflow::progress).max(),
        ) {
            prop_assert!(first.score >= min && first.score <= max);
        }

        let overall = aggregate_overall_score(std::slice::from_ref(&first));
        prop_assert_eq!(overall.score, first.score);
    }

    #[test]
    fn prop_raising_one_workflow_never_lowers_the_aggregate(
        completions in prop::collection::vec(0u32..5, 1..15),
        index in any::<prop::sample::Index>(),
    ) {
        // Workflows are spread round-robin across the five components
        let build = |completions: &[u32]| -> Vec<Workflow> {
            completions
                .iter()
                .enumerate()
                .map(|(i, completed)| {
                    let id = format!("wf-{i}");
                    let component = ControlComponent::ALL[i % ControlComponent::ALL.len()];
                    let mut workflow = Workflow::new(&id, &id, component, "inst-1")
                        .unwrap()
                        .with_steps((1..=5).map(|sequence| WorkflowStep::new(&id, sequence, "step")).collect())
                        .unwrap();
                    for sequence in 1..=*completed {
                        workflow
                            .handle_event(WorkflowEvent::SetStepStatus { sequence, status: StepStatus::Completed })
                            .unwrap();
                    }
                    workflow
                })
                .collect()
        };

        let before = build(&completions);
        let mut raised = completions.clone();
        let target = index.index(raised.len());
        raised[target] += 1;
        let after = build(&raised);

        for component in ControlComponent::ALL {
            prop_assert!(
                aggregate_component_score(component, &after).score
                    >= aggregate_component_score(component, &before).score
            );
        }

        let overall = |workflows: &[Workflow]| {
            let scores: Vec<_> = ControlComponent::ALL
                .into_iter()
                .map(|component| aggregate_component_score(component, workflows))
                .collect();
            aggregate_overall_score(&scores).score
        };
        prop_assert!(overall(&after) >= overall(&before));

        let resolver = FrameworkResolver::new(FrameworkMode::Dual);
        prop_assert!(
            score_institution("inst-1", &after, &resolver).overall.score
                >= score_institution("inst-1", &before, &resolver).overall.score
        );
    }
}
