// Intervention policy: maps a moderation verdict to what happens next.
//
// Comments are always kept; a self-harm comment also gets a reply.
// Posts flagged for anything other than self-harm are rejected outright.

use super::moderation_models::{ContentKind, Intervention, ModerationVerdict};

pub fn decide(kind: ContentKind, verdict: &ModerationVerdict) -> Intervention {
    if !verdict.flagged {
        return Intervention::Allow;
    }

    match (kind, verdict.is_self_harm()) {
        (_, true) => Intervention::AllowAndRespond,
        (ContentKind::Comment, false) => Intervention::Allow,
        (ContentKind::Post, false) => Intervention::Block,
    }
}
