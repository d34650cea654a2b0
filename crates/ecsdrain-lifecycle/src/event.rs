//! Lifecycle event decoding.
//!
//! Autoscaling publishes lifecycle notifications to SNS; the handler
//! receives the SNS envelope with the notification JSON-encoded in
//! `Records[0].Sns.Message`. A bare notification (no envelope) is accepted
//! as well.

use serde::Deserialize;
use serde_json::Value;

use ecsdrain_orchestrator::DrainContext;
use ecsdrain_plane::{LifecycleAction, LifecycleActionResult};

use crate::error::{LifecycleError, LifecycleResult};

/// `Event` value sent when a lifecycle hook is first created.
pub const TEST_NOTIFICATION: &str = "autoscaling:TEST_NOTIFICATION";

/// Transition for a pending scale-down.
pub const INSTANCE_TERMINATING: &str = "autoscaling:EC2_INSTANCE_TERMINATING";

#[derive(Debug, Deserialize)]
struct SnsEnvelope {
    #[serde(rename = "Records")]
    records: Vec<SnsRecord>,
}

#[derive(Debug, Deserialize)]
struct SnsRecord {
    #[serde(rename = "Sns")]
    sns: SnsNotification,
}

#[derive(Debug, Deserialize)]
struct SnsNotification {
    #[serde(rename = "Message")]
    message: String,
}

/// Raw autoscaling lifecycle notification.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase", default)]
pub struct LifecycleMessage {
    #[serde(rename = "EC2InstanceId")]
    pub instance_id: Option<String>,
    pub auto_scaling_group_name: Option<String>,
    pub lifecycle_hook_name: Option<String>,
    pub lifecycle_action_token: Option<String>,
    pub lifecycle_transition: Option<String>,
    pub event: Option<String>,
}

/// A scale-down the handler must drain for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationNotice {
    pub instance_id: String,
    pub auto_scaling_group: String,
    pub lifecycle_hook: String,
    pub action_token: String,
}

impl TerminationNotice {
    pub fn context(&self) -> DrainContext {
        DrainContext::for_lifecycle(&self.instance_id, &self.auto_scaling_group, &self.lifecycle_hook)
    }

    /// The request that resolves this notice's pending action.
    pub fn action(&self, result: LifecycleActionResult) -> LifecycleAction {
        LifecycleAction {
            hook_name: self.lifecycle_hook.clone(),
            group_name: self.auto_scaling_group.clone(),
            token: self.action_token.clone(),
            instance_id: self.instance_id.clone(),
            result,
        }
    }
}

/// What a decoded notification asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// Hook-creation test message; nothing to drain.
    Test,
    Terminating(TerminationNotice),
    /// A transition this handler does not drain for.
    Other { transition: String },
}

/// Decode an SNS envelope or bare lifecycle message.
pub fn decode(raw: &str) -> LifecycleResult<LifecycleEvent> {
    let value: Value = serde_json::from_str(raw)?;

    let message: LifecycleMessage = if value.get("Records").is_some() {
        let envelope: SnsEnvelope = serde_json::from_value(value)?;
        let record = envelope
            .records
            .into_iter()
            .next()
            .ok_or(LifecycleError::EmptyEnvelope)?;
        serde_json::from_str(&record.sns.message)?
    } else {
        serde_json::from_value(value)?
    };

    classify(message)
}

fn classify(message: LifecycleMessage) -> LifecycleResult<LifecycleEvent> {
    if message.event.as_deref() == Some(TEST_NOTIFICATION) {
        return Ok(LifecycleEvent::Test);
    }

    if let Some(transition) = &message.lifecycle_transition
        && transition != INSTANCE_TERMINATING
    {
        return Ok(LifecycleEvent::Other {
            transition: transition.clone(),
        });
    }

    Ok(LifecycleEvent::Terminating(TerminationNotice {
        instance_id: message
            .instance_id
            .ok_or(LifecycleError::MissingField("EC2InstanceId"))?,
        auto_scaling_group: message
            .auto_scaling_group_name
            .ok_or(LifecycleError::MissingField("AutoScalingGroupName"))?,
        lifecycle_hook: message
            .lifecycle_hook_name
            .ok_or(LifecycleError::MissingField("LifecycleHookName"))?,
        action_token: message
            .lifecycle_action_token
            .ok_or(LifecycleError::MissingField("LifecycleActionToken"))?,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MESSAGE: &str = r#"{
        "Service": "AWS Auto Scaling",
        "Time": "2026-10-16T03:41:00.000Z",
        "RequestId": "6b1f7d2e",
        "LifecycleActionToken": "c613620e-07e2-4ed2-a9e2-ef8258911ade",
        "AccountId": "123456789012",
        "AutoScalingGroupName": "ecs-web-asg",
        "LifecycleHookName": "ecs-drain",
        "EC2InstanceId": "i-0c315bd8daf18cf20",
        "LifecycleTransition": "autoscaling:EC2_INSTANCE_TERMINATING"
    }"#;

    fn sns(message: &str) -> String {
        serde_json::json!({
            "Records": [{
                "EventSource": "aws:sns",
                "Sns": {"Type": "Notification", "Message": message}
            }]
        })
        .to_string()
    }

    fn notice() -> TerminationNotice {
        TerminationNotice {
            instance_id: "i-0c315bd8daf18cf20".to_string(),
            auto_scaling_group: "ecs-web-asg".to_string(),
            lifecycle_hook: "ecs-drain".to_string(),
            action_token: "c613620e-07e2-4ed2-a9e2-ef8258911ade".to_string(),
        }
    }

    #[test]
    fn decodes_sns_envelope() {
        let event = decode(&sns(MESSAGE)).unwrap();
        assert_eq!(event, LifecycleEvent::Terminating(notice()));
    }

    #[test]
    fn decodes_bare_message() {
        assert_eq!(decode(MESSAGE).unwrap(), LifecycleEvent::Terminating(notice()));
    }

    #[test]
    fn test_notification_is_recognised() {
        let message = r#"{"AutoScalingGroupName":"ecs-web-asg","Event":"autoscaling:TEST_NOTIFICATION"}"#;
        assert_eq!(decode(&sns(message)).unwrap(), LifecycleEvent::Test);
    }

    #[test]
    fn launch_transition_is_skipped() {
        let message = MESSAGE.replace(INSTANCE_TERMINATING, "autoscaling:EC2_INSTANCE_LAUNCHING");
        assert_eq!(
            decode(&message).unwrap(),
            LifecycleEvent::Other {
                transition: "autoscaling:EC2_INSTANCE_LAUNCHING".to_string()
            }
        );
    }

    #[test]
    fn missing_token_is_an_error() {
        let message = r#"{"EC2InstanceId":"i-1","AutoScalingGroupName":"g","LifecycleHookName":"h"}"#;
        let err = decode(message).unwrap_err();
        assert!(matches!(err, LifecycleError::MissingField("LifecycleActionToken")));
    }

    #[test]
    fn empty_envelope_is_an_error() {
        let err = decode(r#"{"Records": []}"#).unwrap_err();
        assert!(matches!(err, LifecycleError::EmptyEnvelope));
    }

    #[test]
    fn garbage_is_a_decode_error() {
        assert!(matches!(decode("not json"), Err(LifecycleError::Decode(_))));
    }

    #[test]
    fn notice_builds_continue_action() {
        let action = notice().action(LifecycleActionResult::Continue);
        assert_eq!(action.hook_name, "ecs-drain");
        assert_eq!(action.group_name, "ecs-web-asg");
        assert_eq!(action.token, "c613620e-07e2-4ed2-a9e2-ef8258911ade");
        assert_eq!(action.instance_id, "i-0c315bd8daf18cf20");
        assert_eq!(action.result, LifecycleActionResult::Continue);
    }
}
