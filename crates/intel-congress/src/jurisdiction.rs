use intel_core::{Committee, CommitteeAssignment, Politician};

/// Sector wildcard used by the Leadership pseudo-committee: party and
/// chamber leadership can move markets well outside any single committee's
/// formal jurisdiction, so it's treated as covering every sector.
pub const ALL_SECTORS: &str = "*";

/// Synthesizes the "Leadership" pseudo-committee for a politician who is
/// flagged `is_leadership` and has no real committee assignments — replaces
/// the brittle name-substring allow-list the original scheduler used.
pub fn leadership_pseudo_committee() -> Committee {
    Committee {
        id: uuid::Uuid::nil(),
        name: "Leadership".to_string(),
        target_sectors: vec![ALL_SECTORS.to_string()],
    }
}

/// Builds the set of committees whose jurisdiction applies to `politician`,
/// given their formal assignments. Injects the Leadership pseudo-committee
/// when the politician has no real assignments but is flagged as leadership.
pub fn effective_committees(
    politician: &Politician,
    assignments: &[CommitteeAssignment],
    all_committees: &[Committee],
) -> Vec<Committee> {
    let mut committees: Vec<Committee> = assignments
        .iter()
        .filter(|a| a.politician_id == politician.id)
        .filter_map(|a| all_committees.iter().find(|c| c.id == a.committee_id).cloned())
        .collect();

    if committees.is_empty() && politician.is_leadership {
        committees.push(leadership_pseudo_committee());
    }
    committees
}

/// Regulatory-link check (session prompt step 1): does any effective
/// committee's target sectors cover `sector`?
pub fn has_regulatory_link(committees: &[Committee], sector: &str) -> bool {
    committees.iter().any(|c| {
        c.target_sectors
            .iter()
            .any(|s| s == ALL_SECTORS || s.eq_ignore_ascii_case(sector))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use intel_core::Chamber;
    use uuid::Uuid;

    fn politician(is_leadership: bool) -> Politician {
        Politician {
            id: Uuid::new_v4(),
            canonical_name: "Test Person".into(),
            aliases: vec![],
            party: "I".into(),
            state: "CA".into(),
            chamber: Chamber::House,
            is_leadership,
        }
    }

    #[test]
    fn injects_leadership_pseudo_committee_when_no_assignments() {
        let p = politician(true);
        let committees = effective_committees(&p, &[], &[]);
        assert_eq!(committees.len(), 1);
        assert_eq!(committees[0].name, "Leadership");
        assert!(has_regulatory_link(&committees, "Technology"));
    }

    #[test]
    fn non_leadership_with_no_committees_has_no_jurisdiction() {
        let p = politician(false);
        let committees = effective_committees(&p, &[], &[]);
        assert!(committees.is_empty());
        assert!(!has_regulatory_link(&committees, "Technology"));
    }

    #[test]
    fn real_committee_assignment_matches_sector() {
        let p = politician(false);
        let committee = Committee {
            id: Uuid::new_v4(),
            name: "Science & Technology".into(),
            target_sectors: vec!["Technology".into()],
        };
        let assignment = CommitteeAssignment {
            politician_id: p.id,
            committee_id: committee.id,
            title: None,
        };
        let committees = effective_committees(&p, &[assignment], &[committee]);
        assert!(has_regulatory_link(&committees, "technology"));
        assert!(!has_regulatory_link(&committees, "Energy"));
    }
}
