//! The location → manager → consultant filter cascade.
//!
//! Each dropdown's option set derives from the view filtered by its parent
//! selections only: locations always come from the full table, managers from
//! the location view, consultants from the manager view. A consultant
//! selection that falls outside its parent view is cleared, never widened.

use crate::error::Result;
use crate::frame_utils::{distinct_non_null, filter_eq};
use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const LOCATION: &str = "Dealer Location";
pub const MANAGER: &str = "Sales Manager";
pub const CONSULTANT: &str = "Sales Consultant";

/// The user's current dropdown picks. `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub location: Option<String>,
    pub manager: Option<String>,
    pub consultant: Option<String>,
}

/// One recomputation of the cascade: the option list per dropdown, the
/// consultant that survived validation, and the final filtered rows.
#[derive(Debug, Clone)]
pub struct Cascade {
    pub locations: Vec<String>,
    pub managers: Vec<String>,
    pub consultants: Vec<String>,
    /// Consultant actually applied to the final filter; `None` when the
    /// selected consultant fell outside the (location, manager) view.
    pub effective_consultant: Option<String>,
    pub rows: DataFrame,
}

pub fn cascade(table: &DataFrame, selection: &Selection) -> Result<Cascade> {
    let locations = distinct_non_null(table, LOCATION);

    let by_location = match &selection.location {
        Some(location) => filter_eq(table, LOCATION, location)?,
        None => table.clone(),
    };
    let managers = distinct_non_null(&by_location, MANAGER);

    let by_manager = match &selection.manager {
        Some(manager) => filter_eq(&by_location, MANAGER, manager)?,
        None => by_location,
    };
    let consultants = distinct_non_null(&by_manager, CONSULTANT);

    let effective_consultant = selection
        .consultant
        .clone()
        .filter(|selected| consultants.iter().any(|option| option == selected));

    let rows = match &effective_consultant {
        Some(consultant) => filter_eq(&by_manager, CONSULTANT, consultant)?,
        None => by_manager,
    };

    Ok(Cascade {
        locations,
        managers,
        consultants,
        effective_consultant,
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use polars::prelude::*;

    fn table() -> DataFrame {
        df![
            LOCATION => ["Pune", "Pune", "Mumbai", "Mumbai"],
            MANAGER => ["Anil", "Anil", "Sunita", "Sunita"],
            CONSULTANT => ["Ravi", "Meera", "Priya", "Arjun"],
            "ENQUIRY MTD" => [1.0, 2.0, 3.0, 4.0]
        ]
        .unwrap()
    }

    fn select(
        location: Option<&str>,
        manager: Option<&str>,
        consultant: Option<&str>,
    ) -> Selection {
        Selection {
            location: location.map(String::from),
            manager: manager.map(String::from),
            consultant: consultant.map(String::from),
        }
    }

    #[test]
    fn no_selection_passes_everything_through() {
        let out = cascade(&table(), &Selection::default()).unwrap();
        assert_eq!(out.locations, vec!["Pune", "Mumbai"]);
        assert_eq!(out.managers, vec!["Anil", "Sunita"]);
        assert_eq!(out.consultants, vec!["Ravi", "Meera", "Priya", "Arjun"]);
        assert_eq!(out.rows.height(), 4);
    }

    #[test]
    fn location_narrows_managers_but_not_locations() {
        let out = cascade(&table(), &select(Some("Pune"), None, None)).unwrap();
        // The location list always shows every location.
        assert_eq!(out.locations, vec!["Pune", "Mumbai"]);
        assert_eq!(out.managers, vec!["Anil"]);
        assert_eq!(out.consultants, vec!["Ravi", "Meera"]);
        assert_eq!(out.rows.height(), 2);
    }

    #[test]
    fn consultant_options_are_a_subset_of_the_manager_view() {
        let out = cascade(&table(), &select(Some("Mumbai"), Some("Sunita"), None)).unwrap();
        let from_rows = distinct_non_null(
            &filter_eq(&filter_eq(&table(), LOCATION, "Mumbai").unwrap(), MANAGER, "Sunita").unwrap(),
            CONSULTANT,
        );
        assert!(out.consultants.iter().all(|c| from_rows.contains(c)));
    }

    #[test]
    fn stale_consultant_is_cleared() {
        // Ravi works in Pune; switching the location to Mumbai invalidates him.
        let out = cascade(&table(), &select(Some("Mumbai"), None, Some("Ravi"))).unwrap();
        assert_eq!(out.effective_consultant, None);
        assert_eq!(out.rows.height(), 2);
    }

    #[test]
    fn valid_consultant_filters_the_final_rows() {
        let out = cascade(&table(), &select(Some("Pune"), Some("Anil"), Some("Meera"))).unwrap();
        assert_eq!(out.effective_consultant.as_deref(), Some("Meera"));
        assert_eq!(out.rows.height(), 1);
    }

    #[test]
    fn consultant_alone_filters_without_parents() {
        let out = cascade(&table(), &select(None, None, Some("Priya"))).unwrap();
        assert_eq!(out.effective_consultant.as_deref(), Some("Priya"));
        assert_eq!(out.rows.height(), 1);
    }
}
