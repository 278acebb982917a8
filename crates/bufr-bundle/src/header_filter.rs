//! Record selection on section 1 fields.

use bufr_model::Section1;

/// Constraints on the identification section of a record.
///
/// A field left as `None` accepts any value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderFilter {
    pub data_category: Option<u8>,
    pub orig_centre: Option<u16>,
    pub master_table_version: Option<u8>,
}

impl HeaderFilter {
    pub fn with_data_category(mut self, category: u8) -> Self {
        self.data_category = Some(category);
        self
    }

    pub fn with_orig_centre(mut self, centre: u16) -> Self {
        self.orig_centre = Some(centre);
        self
    }

    pub fn with_master_table_version(mut self, version: u8) -> Self {
        self.master_table_version = Some(version);
        self
    }

    /// True when no field is constrained.
    pub fn is_unconstrained(&self) -> bool {
        *self == Self::default()
    }

    pub fn matches(&self, header: &Section1) -> bool {
        accepts(self.data_category, header.data_category)
            && accepts(self.orig_centre, header.orig_centre)
            && accepts(self.master_table_version, header.master_table_version)
    }
}

fn accepts<T: PartialEq>(wanted: Option<T>, actual: T) -> bool {
    wanted.is_none_or(|wanted| wanted == actual)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(category: u8, centre: u16, version: u8) -> Section1 {
        Section1 {
            data_category: category,
            orig_centre: centre,
            master_table_version: version,
            ..Section1::default()
        }
    }

    #[test]
    fn unconstrained_fields_are_wildcards() {
        let filter = HeaderFilter::default();
        assert!(filter.is_unconstrained());
        assert!(filter.matches(&header(0, 0, 0)));
        assert!(filter.matches(&header(31, 54, 13)));
    }

    #[test]
    fn every_constrained_field_must_match() {
        let filter = HeaderFilter::default()
            .with_data_category(2)
            .with_orig_centre(54);
        assert!(filter.matches(&header(2, 54, 14)));
        assert!(filter.matches(&header(2, 54, 13)));
        assert!(!filter.matches(&header(2, 98, 14)));
        assert!(!filter.matches(&header(0, 54, 14)));

        let filter = filter.with_master_table_version(13);
        assert!(!filter.matches(&header(2, 54, 14)));
    }
}
