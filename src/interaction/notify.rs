//! Notification composition.
//!
//! Pure functions that turn event facts and resolved participants into
//! the direct messages to deliver. No I/O happens here; the dispatcher
//! owns lookups and delivery.

use crate::base::types::{HookError, Notification, Participant, Res};

/// How a participant is addressed in message text: a Slack mention when
/// linked, the bare GitHub login otherwise.
fn mention(participant: &Participant) -> String {
    match &participant.slack {
        Some(id) => format!("{}(<@{}>)", participant.github, id),
        None => participant.github.clone(),
    }
}

/// The note appended when the other side of a conversation has no link.
fn link_note(github_name: &str) -> String {
    format!("\n\nNote: {github_name} has not been linked yet. If they are in this Slack workspace, please introduce this app to them!")
}

/// Compose the messages for a review request.
///
/// Both participants linked: the same text goes to each, requester first.
/// Only one linked: that one also gets a note naming the unlinked side.
/// Neither linked: nothing to send.
pub fn review_requested(requester: &Participant, reviewer: &Participant, pull_request_url: &str) -> Vec<Notification> {
    let body = format!("{} requested code review from {}:\n{}", mention(requester), mention(reviewer), pull_request_url);

    match (&requester.slack, &reviewer.slack) {
        (Some(requester_id), Some(reviewer_id)) => vec![
            Notification {
                recipient: requester_id.clone(),
                text: body.clone(),
            },
            Notification {
                recipient: reviewer_id.clone(),
                text: body,
            },
        ],
        (None, Some(reviewer_id)) => vec![Notification {
            recipient: reviewer_id.clone(),
            text: format!("{}{}", body, link_note(&requester.github)),
        }],
        (Some(requester_id), None) => vec![Notification {
            recipient: requester_id.clone(),
            text: format!("{}{}", body, link_note(&reviewer.github)),
        }],
        (None, None) => vec![],
    }
}

/// Compose the messages for a submitted review.
///
/// Approvals congratulate the author; other reviews tell the author who
/// reviewed, with a note when the reviewer has no link. A linked reviewer
/// whose author has no link gets nothing for now.
///
/// Callers must have settled both resolutions and handled the
/// neither-linked case already; reaching it here is an internal invariant
/// violation.
pub fn review_submitted(requester: &Participant, reviewer: &Participant, state: &str, review_url: &str) -> Res<Vec<Notification>> {
    match (&requester.slack, &reviewer.slack) {
        (Some(requester_id), _) => {
            let text = if state == "approved" {
                format!("Your pull request has been approved!\n{review_url}")
            } else {
                let mut text = format!("{}'s pull request has been reviewed by {}\n{}", mention(requester), mention(reviewer), review_url);

                if reviewer.slack.is_none() {
                    text.push_str(&link_note(&reviewer.github));
                }

                text
            };

            Ok(vec![Notification {
                recipient: requester_id.clone(),
                text,
            }])
        }
        // A linked reviewer could be asked to introduce this app to the
        // author here, but not now.
        (None, Some(_)) => Ok(vec![]),
        (None, None) => Err(HookError::ImpossibleState.into()),
    }
}

// Tests.
