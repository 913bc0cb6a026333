/// Route component constants shared across crates
pub const API_ROUTE_COMPONENT: &str = "api";
pub const API_ROUTE_PREFIX: &str = const_str::concat!("/", API_ROUTE_COMPONENT);

pub const CLASSES_ROUTE_COMPONENT: &str = "classes";
pub const CLASSES_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", CLASSES_ROUTE_COMPONENT);

pub const CONFLICTS_ROUTE_COMPONENT: &str = "conflicts";
pub const CONFLICTS_ROUTE_PREFIX: &str =
    const_str::concat!(API_ROUTE_PREFIX, "/", CONFLICTS_ROUTE_COMPONENT);

/// Open-ended rules are never expanded further than this many years past their start.
pub const LOOKAHEAD_YEARS: u32 = 2;

/// Hard cap on occurrences produced by a single expansion.
pub const MAX_OCCURRENCES: u16 = u16::MAX;
