// Workflow lifecycle scenarios driven through the public API

use compliance_tracker::{
    ComplianceError, ControlComponent, StepStatus, StepTemplates, TrafficLight, Workflow, WorkflowEvent,
    WorkflowSnapshot, WorkflowStatus,
};

fn new_workflow(id: &str, component: ControlComponent) -> Workflow {
    Workflow::from_template(id, "Lifecycle test", component, "inst-1", &StepTemplates::default()).unwrap()
}

fn complete_steps(workflow: &mut Workflow, sequences: impl IntoIterator<Item = u32>) {
    for sequence in sequences {
        workflow
            .handle_event(WorkflowEvent::SetStepStatus {
                sequence,
                status: StepStatus::Completed,
            })
            .unwrap();
    }
}

#[test]
fn test_three_of_five_steps_is_sixty_percent_in_progress() {
    let mut workflow = new_workflow("wf-ce", ControlComponent::ControlEnvironment);
    assert_eq!(workflow.steps().len(), 5);

    complete_steps(&mut workflow, 1..=3);

    assert_eq!(workflow.progress(), 60);
    assert_eq!(workflow.status(), WorkflowStatus::InProgress);
    assert_eq!(workflow.classification(), TrafficLight::InProgress);
}

#[test]
fn test_risk_assessment_completes_after_sign_off() {
    let mut workflow = new_workflow("wf-ra", ControlComponent::RiskAssessment);
    assert_eq!(workflow.steps().len(), 8);

    complete_steps(&mut workflow, 1..=8);
    assert_eq!(workflow.status(), WorkflowStatus::UnderReview);
    assert_eq!(workflow.progress(), 100);
    assert_eq!(workflow.classification(), TrafficLight::InProgress);

    let result = workflow.handle_event(WorkflowEvent::Approve).unwrap();
    assert!(result.status_changed());
    assert_eq!(workflow.status(), WorkflowStatus::Completed);
    assert_eq!(workflow.progress(), 100);
    assert_eq!(workflow.classification(), TrafficLight::Completed);
}

#[test]
fn test_observed_workflow_is_at_risk_regardless_of_progress() {
    let mut workflow = new_workflow("wf-mon", ControlComponent::Monitoring);
    complete_steps(&mut workflow, 1..=2);

    workflow
        .handle_event(WorkflowEvent::FlagObservation {
            note: "Evaluation evidence missing".to_string(),
        })
        .unwrap();

    assert_eq!(workflow.status(), WorkflowStatus::Observed);
    assert_eq!(workflow.progress(), 40);
    assert_eq!(workflow.classification(), TrafficLight::AtRisk);
    assert_eq!(workflow.observation_note(), Some("Evaluation evidence missing"));

    // Remediation work continues while observed
    complete_steps(&mut workflow, 3..=3);
    assert_eq!(workflow.status(), WorkflowStatus::Observed);
    assert_eq!(workflow.progress(), 60);

    workflow.handle_event(WorkflowEvent::AcknowledgeRemediation).unwrap();
    assert_eq!(workflow.status(), WorkflowStatus::InProgress);
    assert_eq!(workflow.observation_note(), None);
}

#[test]
fn test_completed_workflow_rejects_changes_and_stays_intact() {
    let mut workflow = new_workflow("wf-ca", ControlComponent::ControlActivities);
    complete_steps(&mut workflow, 1..=5);
    workflow.handle_event(WorkflowEvent::Approve).unwrap();
    let before = workflow.clone();

    let error = workflow
        .handle_event(WorkflowEvent::SetStepStatus {
            sequence: 2,
            status: StepStatus::InProgress,
        })
        .unwrap_err();

    assert!(matches!(
        error,
        ComplianceError::InvalidTransition {
            from: WorkflowStatus::Completed,
            ..
        }
    ));
    assert_eq!(workflow, before);

    assert!(workflow
        .handle_event(WorkflowEvent::FlagObservation { note: "late".to_string() })
        .is_err());
    assert_eq!(workflow, before);
}

#[test]
fn test_rejected_review_reopens_steps() {
    let mut workflow = new_workflow("wf-ic", ControlComponent::InformationCommunication);
    complete_steps(&mut workflow, 1..=5);

    workflow.handle_event(WorkflowEvent::Reject { reopen: vec![4] }).unwrap();

    assert_eq!(workflow.status(), WorkflowStatus::InProgress);
    assert_eq!(workflow.progress(), 80);
    assert_eq!(workflow.step(4).unwrap().status, StepStatus::InProgress);

    complete_steps(&mut workflow, 4..=4);
    assert_eq!(workflow.status(), WorkflowStatus::UnderReview);
}

#[test]
fn test_history_survives_a_snapshot_round_trip() {
    let mut workflow = new_workflow("wf-hist", ControlComponent::Monitoring);
    complete_steps(&mut workflow, 1..=5);
    workflow.handle_event(WorkflowEvent::Approve).unwrap();

    let json = serde_json::to_string(&WorkflowSnapshot::from_workflows(&[workflow.clone()])).unwrap();
    let report = WorkflowSnapshot::from_json(&json)
        .unwrap()
        .materialize(&StepTemplates::default());

    assert!(report.is_clean());
    let reloaded = &report.workflows[0];
    assert_eq!(reloaded.status(), WorkflowStatus::Completed);
    assert_eq!(reloaded.history().len(), 3);
    assert_eq!(reloaded.history(), workflow.history());
}
