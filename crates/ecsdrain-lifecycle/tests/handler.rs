//! Lifecycle handler tests against the in-memory inventory.

use ecsdrain_lifecycle::*;
use ecsdrain_orchestrator::{DrainConfig, DrainOutcome};
use ecsdrain_plane::{Inventory, LifecycleActionResult};

const INVENTORY: &str = r#"{
    "clusters": [{
        "id": "cluster/web",
        "container_instances": [
            {"id": "ci/a", "ec2_instance_id": "i-A", "tasks": [{"id": "t/1", "task_definition": "web:1"}]},
            {"id": "ci/b", "ec2_instance_id": "i-B"}
        ],
        "services": [{"id": "svc/web", "task_definition": "web:1",
                      "load_balancers": [{"target_group_arn": "tg-1"}]}]
    }],
    "target_groups": [{
        "arn": "tg-1",
        "attributes": [{"key": "deregistration_delay.timeout_seconds", "value": "30"}],
        "targets": [{"id": "i-A", "states": ["unused"]}]
    }]
}"#;

fn inventory() -> Inventory {
    Inventory::from_json(INVENTORY).unwrap()
}

fn event(instance_id: &str) -> String {
    let message = serde_json::json!({
        "AutoScalingGroupName": "ecs-web-asg",
        "LifecycleHookName": "ecs-drain",
        "LifecycleActionToken": "token-1",
        "EC2InstanceId": instance_id,
        "LifecycleTransition": "autoscaling:EC2_INSTANCE_TERMINATING"
    });
    serde_json::json!({
        "Records": [{"Sns": {"Message": message.to_string()}}]
    })
    .to_string()
}

#[tokio::test(start_paused = true)]
async fn drains_then_completes_lifecycle_action() {
    let inv = inventory();
    let outcome = LifecycleHandler::new(&inv, DrainConfig::default())
        .handle(&event("i-A"))
        .await
        .unwrap();

    let HandlerOutcome::Drained {
        instance_id,
        drain,
        lifecycle_completed,
    } = outcome
    else {
        panic!("expected a drain outcome");
    };
    assert_eq!(instance_id, "i-A");
    assert!(lifecycle_completed);
    assert!(matches!(drain, DrainOutcome::Completed(ref run) if run.drained()));

    let actions = inv.completed_actions();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].hook_name, "ecs-drain");
    assert_eq!(actions[0].group_name, "ecs-web-asg");
    assert_eq!(actions[0].token, "token-1");
    assert_eq!(actions[0].instance_id, "i-A");
    assert_eq!(actions[0].result, LifecycleActionResult::Continue);

    // Completion comes after the drain.
    let calls = inv.calls();
    assert_eq!(calls.last().map(|c| c.operation()), Some("CompleteLifecycleAction"));
}

#[tokio::test(start_paused = true)]
async fn no_op_drains_still_complete_the_action() {
    let inv = inventory();
    let handler = LifecycleHandler::new(&inv, DrainConfig::default());

    let idle = handler.handle(&event("i-B")).await.unwrap();
    assert!(matches!(
        idle,
        HandlerOutcome::Drained { drain: DrainOutcome::NoTasks(_), lifecycle_completed: true, .. }
    ));

    let missing = handler.handle(&event("i-Z")).await.unwrap();
    assert!(matches!(
        missing,
        HandlerOutcome::Drained { drain: DrainOutcome::NotInCluster, lifecycle_completed: true, .. }
    ));

    assert_eq!(inv.completed_actions().len(), 2);
    assert!(inv.deregistrations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn dry_run_leaves_action_pending() {
    let inv = inventory();
    let config = DrainConfig {
        dry_run: true,
        ..Default::default()
    };

    let outcome = LifecycleHandler::new(&inv, config)
        .handle(&event("i-A"))
        .await
        .unwrap();

    assert!(matches!(
        outcome,
        HandlerOutcome::Drained { lifecycle_completed: false, .. }
    ));
    assert!(inv.completed_actions().is_empty());
    assert!(inv.deregistrations().is_empty());
}

#[tokio::test(start_paused = true)]
async fn failed_drain_leaves_action_pending() {
    let inv = inventory().with_failure("DeregisterContainerInstance");

    let err = LifecycleHandler::new(&inv, DrainConfig::default())
        .handle(&event("i-A"))
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::Drain(_)));
    assert!(inv.completed_actions().is_empty());
}

#[tokio::test(start_paused = true)]
async fn signal_failure_is_reported() {
    let inv = inventory().with_failure("CompleteLifecycleAction");

    let err = LifecycleHandler::new(&inv, DrainConfig::default())
        .handle(&event("i-B"))
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::Signal(_)));
}

#[tokio::test]
async fn test_notification_touches_nothing() {
    let inv = inventory();
    let raw = serde_json::json!({
        "Records": [{"Sns": {"Message": r#"{"Event":"autoscaling:TEST_NOTIFICATION"}"#}}]
    })
    .to_string();

    let outcome = LifecycleHandler::new(&inv, DrainConfig::default())
        .handle(&raw)
        .await
        .unwrap();

    assert_eq!(outcome, HandlerOutcome::TestNotification);
    assert!(inv.calls().is_empty());
}

#[tokio::test]
async fn other_transitions_are_skipped() {
    let inv = inventory();
    let raw = r#"{"EC2InstanceId":"i-A","LifecycleTransition":"autoscaling:EC2_INSTANCE_LAUNCHING"}"#;

    let outcome = LifecycleHandler::new(&inv, DrainConfig::default())
        .handle(raw)
        .await
        .unwrap();

    assert_eq!(
        outcome,
        HandlerOutcome::Skipped {
            transition: "autoscaling:EC2_INSTANCE_LAUNCHING".to_string()
        }
    );
    assert!(inv.calls().is_empty());
}
