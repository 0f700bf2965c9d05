/// Sort keys accepted by the petition listing endpoint. Whatever the key,
/// ties are broken by petition id ascending so the order is deterministic
/// when sort values collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetitionSort {
    AlphabeticalAsc,
    AlphabeticalDesc,
    CostAsc,
    CostDesc,
    CreatedAsc,
    CreatedDesc,
}

impl Default for PetitionSort {
    fn default() -> Self {
        PetitionSort::CreatedAsc
    }
}

impl PetitionSort {
    /// Absent or unrecognized keys fall back to creation date ascending.
    pub fn parse(key: Option<&str>) -> Self {
        match key {
            Some("ALPHABETICAL_ASC") => PetitionSort::AlphabeticalAsc,
            Some("ALPHABETICAL_DESC") => PetitionSort::AlphabeticalDesc,
            Some("COST_ASC") => PetitionSort::CostAsc,
            Some("COST_DESC") => PetitionSort::CostDesc,
            Some("CREATED_ASC") => PetitionSort::CreatedAsc,
            Some("CREATED_DESC") => PetitionSort::CreatedDesc,
            _ => PetitionSort::default(),
        }
    }

    pub fn order_by_sql(&self) -> &'static str {
        match self {
            PetitionSort::AlphabeticalAsc => "p.title ASC, p.id ASC",
            PetitionSort::AlphabeticalDesc => "p.title DESC, p.id ASC",
            PetitionSort::CostAsc => "supporting_cost ASC, p.id ASC",
            PetitionSort::CostDesc => "supporting_cost DESC, p.id ASC",
            PetitionSort::CreatedAsc => "p.creation_date ASC, p.id ASC",
            PetitionSort::CreatedDesc => "p.creation_date DESC, p.id ASC",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_keys() {
        assert_eq!(
            PetitionSort::parse(Some("ALPHABETICAL_DESC")),
            PetitionSort::AlphabeticalDesc
        );
        assert_eq!(PetitionSort::parse(Some("COST_ASC")), PetitionSort::CostAsc);
        assert_eq!(
            PetitionSort::parse(Some("CREATED_DESC")),
            PetitionSort::CreatedDesc
        );
    }

    #[test]
    fn unknown_or_absent_key_defaults_to_created_asc() {
        assert_eq!(PetitionSort::parse(None), PetitionSort::CreatedAsc);
        assert_eq!(PetitionSort::parse(Some("POPULARITY")), PetitionSort::CreatedAsc);
        assert_eq!(PetitionSort::parse(Some("created_asc")), PetitionSort::CreatedAsc);
    }

    #[test]
    fn every_order_clause_ends_with_the_id_tiebreak() {
        for sort in [
            PetitionSort::AlphabeticalAsc,
            PetitionSort::AlphabeticalDesc,
            PetitionSort::CostAsc,
            PetitionSort::CostDesc,
            PetitionSort::CreatedAsc,
            PetitionSort::CreatedDesc,
        ] {
            assert!(sort.order_by_sql().ends_with("p.id ASC"));
        }
    }
}
