//! Keyword rules mapping event summaries to statuses.

use pbxpresence_domain::PresenceStatus;

/// Status for an event summary. Matching is case-insensitive and the first
/// rule that hits wins; anything unrecognised is `do_not_disturb`.
pub fn status_for_summary(summary: &str) -> PresenceStatus {
    let summary = summary.to_lowercase();

    if summary.contains("cours :") || summary.contains("cours:") {
        return PresenceStatus::Lunch;
    }
    if summary.contains("formation") {
        return PresenceStatus::BusinessTrip;
    }
    if summary.contains("réunion") || summary.contains("reunion") {
        return PresenceStatus::DoNotDisturb;
    }
    if summary.contains("serv :") {
        return PresenceStatus::Away;
    }
    PresenceStatus::DoNotDisturb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_map_to_statuses() {
        assert_eq!(status_for_summary("Cours : Algèbre"), PresenceStatus::Lunch);
        assert_eq!(status_for_summary("COURS:maths"), PresenceStatus::Lunch);
        assert_eq!(status_for_summary("Formation Excel"), PresenceStatus::BusinessTrip);
        assert_eq!(status_for_summary("Réunion d'équipe"), PresenceStatus::DoNotDisturb);
        assert_eq!(status_for_summary("reunion"), PresenceStatus::DoNotDisturb);
        assert_eq!(status_for_summary("Serv : accueil"), PresenceStatus::Away);
    }

    #[test]
    fn first_rule_wins() {
        assert_eq!(status_for_summary("Cours : formation continue"), PresenceStatus::Lunch);
    }

    #[test]
    fn unknown_summary_defaults_to_dnd() {
        assert_eq!(status_for_summary("Dentist"), PresenceStatus::DoNotDisturb);
        assert_eq!(status_for_summary(""), PresenceStatus::DoNotDisturb);
    }
}
