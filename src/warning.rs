//! Warning notice posted as a reply before a mute/block.

use crate::classify::Classification;
use crate::decision::Action;

pub fn compose_warning(
    handle: &str,
    classification: Classification,
    infraction_count: u32,
    action: Action,
) -> String {
    let tone = match classification {
        Classification::SeverelyNegative => "was flagged as abusive",
        _ => "came across as hostile",
    };
    let count_part = if infraction_count > 0 {
        format!(" This is infraction #{infraction_count}.")
    } else {
        String::new()
    };
    let outcome = match action {
        Action::Mute | Action::Block => format!(" Your account has been {}.", action.past_tense()),
        Action::Warn | Action::None => " Please keep it civil.".to_string(),
    };
    format!(
        "@{} Your recent reply {}.{}{} (automated moderation notice)",
        handle.trim_start_matches('@'),
        tone,
        count_part,
        outcome
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mentions_handle_count_and_outcome() {
        let w = compose_warning("@troll@bad.example", Classification::MildlyNegative, 2, Action::Mute);
        assert!(w.starts_with("@troll@bad.example "));
        assert!(w.contains("infraction #2"));
        assert!(w.contains("has been muted"));
    }

    #[test]
    fn instant_block_has_no_count() {
        let w = compose_warning("alt@x", Classification::SeverelyNegative, 0, Action::Block);
        assert!(!w.contains('#'));
        assert!(w.contains("abusive"));
        assert!(w.contains("blocked"));
    }
}
