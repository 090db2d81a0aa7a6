use crate::macros::define_code_enum;

define_code_enum! {
    /// Priority shared by tasks and functional cases.
    Priority {
        Highest => "HIGHEST",
        High => "HIGH",
        Medium => "MEDIUM",
        Low => "LOW",
        Lowest => "LOWEST",
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}
