/// Text of a sheet the list search looks at
#[derive(Debug, Clone, Default)]
pub struct SearchFields<'a> {
    pub road: &'a str,
    pub job: &'a str,
    pub contractor: &'a str,
    pub driver: &'a str,
    pub notes: &'a str,
}

impl SearchFields<'_> {
    fn fields(&self) -> [&str; 5] {
        [self.road, self.job, self.contractor, self.driver, self.notes]
    }

    /// Case-insensitive substring match against any single field; an empty
    /// query matches everything
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty()
            || self
                .fields()
                .iter()
                .any(|field| field.to_lowercase().contains(&query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_matches_any_field() {
        let fields = SearchFields {
            road: "Main Street",
            job: "Line Repaint",
            contractor: "Reeves",
            driver: "Driver One",
            notes: "dry weather",
        };

        assert!(fields.matches(""));
        assert!(fields.matches("main"));
        assert!(fields.matches("REEVES"));
        assert!(fields.matches("weather"));
        assert!(!fields.matches("thermo"));
    }

    #[test]
    fn test_search_does_not_span_fields() {
        let fields = SearchFields {
            road: "Main Street",
            job: "Line Repaint",
            ..Default::default()
        };

        assert!(fields.matches("street"));
        assert!(fields.matches("line rep"));
        assert!(!fields.matches("street line"));
    }
}
